use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GradebookError;

pub const MARK_MIN: u8 = 0;
pub const MARK_MAX: u8 = 100;
pub const PASS_MARK: u8 = 50;

/// Inclusive lower bounds, checked top-down. First match wins.
const GRADE_BANDS: [(u8, Grade); 4] = [
    (80, Grade::A),
    (70, Grade::B),
    (60, Grade::C),
    (50, Grade::D),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassFail {
    Pass,
    Fail,
}

impl PassFail {
    pub fn as_str(self) -> &'static str {
        match self {
            PassFail::Pass => "Pass",
            PassFail::Fail => "Fail",
        }
    }
}

impl fmt::Display for PassFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter grade for a mark in `0..=100`.
pub fn grade_of(mark: u8) -> Grade {
    GRADE_BANDS
        .iter()
        .find(|(floor, _)| mark >= *floor)
        .map(|(_, g)| *g)
        .unwrap_or(Grade::F)
}

pub fn status_of(mark: u8) -> PassFail {
    if mark >= PASS_MARK {
        PassFail::Pass
    } else {
        PassFail::Fail
    }
}

pub fn derive(mark: u8) -> (Grade, PassFail) {
    (grade_of(mark), status_of(mark))
}

pub fn in_range(mark: f64) -> bool {
    mark >= f64::from(MARK_MIN) && mark <= f64::from(MARK_MAX)
}

/// Parses a manually entered mark. Only whole numbers in range are accepted.
pub fn parse_mark(raw: &str) -> Result<u8, GradebookError> {
    let invalid = || GradebookError::InvalidMark {
        raw: raw.to_string(),
    };
    let n: i64 = raw.trim().parse().map_err(|_| invalid())?;
    if n < i64::from(MARK_MIN) || n > i64::from(MARK_MAX) {
        return Err(invalid());
    }
    u8::try_from(n).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_match_band_table() {
        assert_eq!(grade_of(0), Grade::F);
        assert_eq!(grade_of(49), Grade::F);
        assert_eq!(grade_of(50), Grade::D);
        assert_eq!(grade_of(59), Grade::D);
        assert_eq!(grade_of(60), Grade::C);
        assert_eq!(grade_of(69), Grade::C);
        assert_eq!(grade_of(70), Grade::B);
        assert_eq!(grade_of(79), Grade::B);
        assert_eq!(grade_of(80), Grade::A);
        assert_eq!(grade_of(100), Grade::A);
    }

    #[test]
    fn pass_iff_at_least_fifty_iff_not_f() {
        for m in MARK_MIN..=MARK_MAX {
            let (g, s) = derive(m);
            assert_eq!(s == PassFail::Pass, m >= 50, "mark {m}");
            assert_eq!(s == PassFail::Pass, g != Grade::F, "mark {m}");
        }
    }

    #[test]
    fn parse_mark_rejects_out_of_range_and_non_integers() {
        assert_eq!(parse_mark("85").unwrap(), 85);
        assert_eq!(parse_mark(" 0 ").unwrap(), 0);
        assert_eq!(parse_mark("100").unwrap(), 100);
        for bad in ["150", "-1", "101", "72.5", "abc", ""] {
            assert!(
                matches!(parse_mark(bad), Err(GradebookError::InvalidMark { .. })),
                "{bad} should be rejected"
            );
        }
    }
}
