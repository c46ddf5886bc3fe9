use std::env;
use std::time::Duration;

use anyhow::Context;
use config::{Config, Environment, File};
use dotenvy::dotenv;
use quire_common::database::DatabaseSettings;
use serde::Deserialize;

use crate::domain::links::LinkSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_port: String,
    pub database: DatabaseSettings,
    /// Directory of the on-disk draft store, drafts stay in memory without it
    #[serde(default)]
    pub drafts_dir: Option<String>,
    #[serde(default)]
    pub links: LinkSettings,
    /// Minutes an unused editor session stays open
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,
}

fn default_session_idle_minutes() -> u64 {
    30
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        let run_mode = load_env("RUN_MODE", "development");

        let s = Config::builder()
            .add_source(File::with_name("./config/default"))
            .add_source(File::with_name(&format!("./config/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("app").separator("_"))
            .build()?;

        s.try_deserialize()
            .with_context(|| format!("failed to read {run_mode} config"))
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes * 60)
    }
}

fn load_env(key: &str, default_value: &'static str) -> String {
    env::var(key).unwrap_or_else(|_| default_value.into())
}
