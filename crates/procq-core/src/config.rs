//! Configuration loaded from TOML.
//!
//! ```toml
//! [store]
//! url = "redis://127.0.0.1:6379"
//! block_timeout_ms = 0
//!
//! [[queues]]
//! source = "jobs"
//! processor = "lifo"
//! ```

use std::path::Path;
use std::time::Duration;
use std::{fs, sync::Arc};

use serde::Deserialize;
use thiserror::Error;

use crate::processor::{Processor, ProcessorKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("no queue named '{0}' in configuration")]
    UnknownQueue(String),
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub url: String,
    /// Timeout for blocking pops, in milliseconds. 0 waits forever.
    pub block_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            block_timeout_ms: 0,
        }
    }
}

impl StoreConfig {
    pub fn block_timeout(&self) -> Duration {
        Duration::from_millis(self.block_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub source: String,
    #[serde(default)]
    pub processor: ProcessorKind,
}

impl QueueConfig {
    pub fn processor(&self) -> Arc<dyn Processor> {
        self.processor.processor()
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub queues: Vec<QueueConfig>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn queue(&self, source: &str) -> Result<&QueueConfig, ConfigError> {
        self.queues
            .iter()
            .find(|q| q.source == source)
            .ok_or_else(|| ConfigError::UnknownQueue(source.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_full_file() {
        let cfg = Config::from_toml(
            r#"
            [store]
            url = "redis://cache:6380/2"
            block_timeout_ms = 1500

            [[queues]]
            source = "jobs"

            [[queues]]
            source = "undo"
            processor = "lifo"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.store.url, "redis://cache:6380/2");
        assert_eq!(cfg.store.block_timeout(), Duration::from_millis(1500));
        assert_eq!(cfg.queue("jobs").unwrap().processor, ProcessorKind::Fifo);
        assert_eq!(cfg.queue("undo").unwrap().processor().name(), "lifo");
        assert!(matches!(cfg.queue("missing"), Err(ConfigError::UnknownQueue(_))));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.store, StoreConfig::default());
        assert!(cfg.queues.is_empty());
    }

    #[test]
    fn rejects_unknown_processor() {
        let err = Config::from_toml(
            r#"
            [[queues]]
            source = "jobs"
            processor = "random"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[queues]]\nsource = \"mail\"").unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.queues.len(), 1);
        assert_eq!(cfg.queues[0].source, "mail");
    }
}
