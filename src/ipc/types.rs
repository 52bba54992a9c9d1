use serde::Deserialize;

use crate::config::Config;
use crate::session::Session;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub session: Option<Session>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session: None,
        }
    }
}
