use serde::Serialize;
use std::cmp::Ordering;

use crate::grade::{derive, Grade, PassFail};

/// VB6-compatible 1-decimal rounding: `Int(10*x + 0.5) / 10`
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

fn compute_median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[(n / 2) - 1] + sorted[n / 2]) / 2.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeDistribution {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
    #[serde(rename = "F")]
    pub f: usize,
}

impl GradeDistribution {
    fn bump(&mut self, grade: Grade) {
        match grade {
            Grade::A => self.a += 1,
            Grade::B => self.b += 1,
            Grade::C => self.c += 1,
            Grade::D => self.d += 1,
            Grade::F => self.f += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkStats {
    pub count: usize,
    pub average: f64,
    pub median: f64,
    pub highest: Option<u8>,
    pub lowest: Option<u8>,
    pub pass_count: usize,
    pub fail_count: usize,
    pub pass_rate: f64,
    pub distribution: GradeDistribution,
}

/// Figures shown under a term summary or an overview view. Averages and rates
/// are rounded to one decimal.
pub fn mark_stats<I>(marks: I) -> MarkStats
where
    I: IntoIterator<Item = u8>,
{
    let values: Vec<u8> = marks.into_iter().collect();
    if values.is_empty() {
        return MarkStats::default();
    }

    let mut distribution = GradeDistribution::default();
    let mut pass_count = 0;
    for &m in &values {
        let (grade, status) = derive(m);
        distribution.bump(grade);
        if status == PassFail::Pass {
            pass_count += 1;
        }
    }

    let as_f64: Vec<f64> = values.iter().map(|&m| f64::from(m)).collect();
    let count = values.len();
    let sum: f64 = as_f64.iter().sum();

    MarkStats {
        count,
        average: round_off_1_decimal(sum / count as f64),
        median: compute_median(&as_f64),
        highest: values.iter().copied().max(),
        lowest: values.iter().copied().min(),
        pass_count,
        fail_count: count - pass_count,
        pass_rate: round_off_1_decimal(100.0 * pass_count as f64 / count as f64),
        distribution,
    }
}
