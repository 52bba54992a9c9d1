use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::Catalog;
use crate::store::{OverviewStore, Placement};
use crate::summary::TermSummary;

/// How many of the catalog's terms get demo records.
const SEEDED_TERMS: usize = 2;
const DEMO_MARK_RANGE: std::ops::RangeInclusive<u8> = 35..=98;

/// Fills the overview with demo records for every class and subject.
/// The same seed always produces the same records.
pub fn seed_overview(store: &mut OverviewStore, catalog: &Catalog, seed: u64) -> usize {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut inserted = 0;

    for term in catalog.terms().iter().take(SEEDED_TERMS) {
        for class in catalog.class_names() {
            let Ok(roster) = catalog.roster(class) else {
                continue;
            };
            for subject in catalog.subjects() {
                let placement = Placement {
                    class: class.to_string(),
                    subject: subject.clone(),
                    term: term.clone(),
                    batch_id: None,
                };
                for student in roster {
                    let mark = rng.random_range(DEMO_MARK_RANGE);
                    store.insert(
                        &TermSummary::new(
                            student.student_id.clone(),
                            student.student_name.clone(),
                            mark,
                        ),
                        &placement,
                    );
                    inserted += 1;
                }
            }
        }
    }

    tracing::debug!(seed, inserted, "overview seeded with demo records");
    inserted
}
