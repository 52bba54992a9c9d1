use chrono::Utc;

use crate::catalog::{seed_catalog, Catalog};
use crate::import::ImportSession;
use crate::seed::seed_overview;
use crate::store::OverviewStore;

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub seed_demo: bool,
    pub seed: u64,
    pub page_size: usize,
}

/// Everything one signed-in admin works on. Lives from `session.open` until
/// `session.close` (or process exit); nothing outlives it.
#[derive(Debug)]
pub struct Session {
    pub catalog: Catalog,
    pub import: ImportSession,
    pub overview: OverviewStore,
    pub opened_at: String,
}

impl Session {
    pub fn open(options: SessionOptions) -> Self {
        let catalog = seed_catalog();
        let mut overview = OverviewStore::new(options.page_size);
        if options.seed_demo {
            seed_overview(&mut overview, &catalog, options.seed);
        }
        if overview.is_empty() {
            tracing::debug!("overview starts empty");
        }
        tracing::info!(
            seed_demo = options.seed_demo,
            records = overview.len(),
            "session opened"
        );
        Self {
            catalog,
            import: ImportSession::default(),
            overview,
            opened_at: Utc::now().to_rfc3339(),
        }
    }
}
