//! Layered settings: built-in defaults, then an optional config file, then
//! `SYLVA_*` environment variables (`SYLVA_SERVER__BIND=0.0.0.0:9000`).

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::parser::DEFAULT_MAX_QUERY_LENGTH;

pub const DEFAULT_CONFIG_FILE: &str = "sylva";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub query: QuerySettings,
    pub schemas: SchemaSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuerySettings {
    /// Longest accepted query, in characters.
    pub max_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaSettings {
    /// Directory of `<graph>.json` schema files.
    pub directory: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directives, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Settings {
    /// Loads settings from `path` (any format `config` understands, extension
    /// optional) or, when `None`, from `sylva.*` in the working directory if present.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let settings = Config::builder()
            .set_default("server.bind", "127.0.0.1:8080")?
            .set_default("query.max_length", DEFAULT_MAX_QUERY_LENGTH as u64)?
            .set_default("schemas.directory", "schemas")?
            .set_default("log.filter", "info")?
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_FILE)).required(path.is_some()))
            .add_source(Environment::with_prefix("SYLVA").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
