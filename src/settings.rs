use std::path::PathBuf;

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::parser::StoreKind;

const DEFAULT_DATABASE: &str = "data/store.sqlite";
const DEFAULT_BIND: &str = "127.0.0.1:5000";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: PathBuf,
    pub bind: String,
    #[serde(default)]
    pub inputs: Vec<InputFile>,
}

/// One crawl dump and the store whose extraction rules apply to it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputFile {
    pub path: PathBuf,
    pub store: StoreKind,
}

impl Settings {
    /// Defaults, then `shop_ingest.toml` if present, then `SHOP_*` environment variables.
    pub fn load() -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name("shop_ingest").required(false))
            .add_source(Environment::with_prefix("SHOP"));
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .set_default("database", DEFAULT_DATABASE)?
            .set_default("bind", DEFAULT_BIND)?
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}
