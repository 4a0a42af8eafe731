//! Error types for energyboard.

use energyboard_sheet::SheetError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for energyboard operations.
pub type EnergyResult<T> = Result<T, EnergyError>;

/// Errors that can occur while building or querying datasets.
#[derive(Debug, Error)]
pub enum EnergyError {
    /// A source workbook is missing, unreadable, or has no fiscal year in its name.
    #[error("Failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// A merge step received zero input tables.
    #[error("Cannot merge an empty set of tables: {context}")]
    EmptyMerge { context: String },

    /// A lookup asked for a dataset that was never published.
    #[error("Unknown dataset: ({fuel}, {metric}, {grouping})")]
    UnknownKey {
        fuel: String,
        metric: String,
        grouping: String,
    },

    /// Sheet-level error.
    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EnergyError {
    /// Create a load error.
    pub fn load(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an empty-merge error.
    pub fn empty_merge(context: impl Into<String>) -> Self {
        Self::EmptyMerge {
            context: context.into(),
        }
    }

    /// Create an unknown-key error.
    pub fn unknown_key(
        fuel: impl Into<String>,
        metric: impl Into<String>,
        grouping: impl Into<String>,
    ) -> Self {
        Self::UnknownKey {
            fuel: fuel.into(),
            metric: metric.into(),
            grouping: grouping.into(),
        }
    }
}
