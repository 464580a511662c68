//! ProcessorKind - 設定ファイルや CLI から Processor を選ぶための名前

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{FIFO, LIFO, Processor};

/// Built-in ordering policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
    #[default]
    Fifo,
    Lifo,
}

impl ProcessorKind {
    /// The shared processor instance for this policy.
    pub fn processor(self) -> Arc<dyn Processor> {
        match self {
            ProcessorKind::Fifo => Arc::clone(&FIFO),
            ProcessorKind::Lifo => Arc::clone(&LIFO),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessorKind::Fifo => "fifo",
            ProcessorKind::Lifo => "lifo",
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown processor '{0}' (expected 'fifo' or 'lifo')")]
pub struct UnknownProcessor(pub String);

impl FromStr for ProcessorKind {
    type Err = UnknownProcessor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(ProcessorKind::Fifo),
            "lifo" => Ok(ProcessorKind::Lifo),
            _ => Err(UnknownProcessor(s.to_string())),
        }
    }
}
