use anyhow::{Context, Result};
use std::env;

use crate::store::DEFAULT_PAGE_SIZE;

const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub seed_demo: bool,
    pub seed: u64,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            seed_demo: true,
            seed: 2024,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(level) = lookup("GRADEBOOKD_LOG_LEVEL") {
            let level = level.trim().to_string();
            if level.is_empty() {
                anyhow::bail!("GRADEBOOKD_LOG_LEVEL is empty");
            }
            config.log_level = level;
        }

        if let Some(raw) = lookup("GRADEBOOKD_SEED_DEMO") {
            config.seed_demo = parse_bool(&raw).with_context(|| {
                format!("GRADEBOOKD_SEED_DEMO must be true or false, got {raw:?}")
            })?;
        }

        if let Some(raw) = lookup("GRADEBOOKD_SEED") {
            config.seed = raw.trim().parse().with_context(|| {
                format!("GRADEBOOKD_SEED must be an unsigned integer, got {raw:?}")
            })?;
        }

        if let Some(raw) = lookup("GRADEBOOKD_PAGE_SIZE") {
            let n: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("GRADEBOOKD_PAGE_SIZE must be an integer, got {raw:?}"))?;
            if n == 0 || n > MAX_PAGE_SIZE {
                anyhow::bail!("GRADEBOOKD_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}");
            }
            config.page_size = n;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let c = load(&[]).expect("config");
        assert_eq!(c.log_level, "info");
        assert!(c.seed_demo);
        assert_eq!(c.page_size, 10);
    }

    #[test]
    fn reads_overrides() {
        let c = load(&[
            ("GRADEBOOKD_SEED_DEMO", "off"),
            ("GRADEBOOKD_SEED", "99"),
            ("GRADEBOOKD_PAGE_SIZE", "25"),
            ("GRADEBOOKD_LOG_LEVEL", "debug"),
        ])
        .expect("config");
        assert!(!c.seed_demo);
        assert_eq!(c.seed, 99);
        assert_eq!(c.page_size, 25);
        assert_eq!(c.log_level, "debug");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("GRADEBOOKD_SEED_DEMO", "maybe")]).is_err());
        assert!(load(&[("GRADEBOOKD_SEED", "-1")]).is_err());
        assert!(load(&[("GRADEBOOKD_PAGE_SIZE", "0")]).is_err());
        assert!(load(&[("GRADEBOOKD_PAGE_SIZE", "500")]).is_err());
    }
}
