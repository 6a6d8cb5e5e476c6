use std::path::PathBuf;
use thiserror::Error;

/// Failures reading or writing the library store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog {path} is unreadable: {source}. Clear the catalog to rebuild it on the next sync")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("Failed to encode catalog: {0}")]
    Encode(#[from] bincode::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures surfaced by [`crate::service::SuggestionService`]
#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("Rule {0} not found")]
    RuleNotFound(u64),

    #[error("Suggestion {0} not found")]
    SuggestionNotFound(u64),

    #[error("Rule {0} is built in and cannot be deleted, disable it instead")]
    DefaultRuleProtected(u64),

    #[error("Invalid rule conditions: {0}")]
    InvalidConditions(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
