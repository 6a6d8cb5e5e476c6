pub mod coerce;
pub mod condition;
pub mod error;
pub mod evaluator;
pub mod field;
pub mod generator;
pub mod merge;
pub mod service;
pub mod store;
pub mod sync;
pub mod value;

#[cfg(test)]
mod testing;

pub use coerce::{coerce, parse_date};
pub use condition::{evaluate_condition, evaluate_condition_at};
pub use error::{StoreError, SuggestionError};
pub use evaluator::{evaluate_movie, evaluate_movie_at, evaluate_series, evaluate_series_at};
pub use field::{resolve_movie_field, resolve_series_field};
pub use generator::{generate, GenerationOutcome, SkipReason, SkippedRule};
pub use merge::{apply_movies, apply_plays, apply_requests, apply_series, MergeCounts};
pub use service::{GenerationReport, MediaRef, RuleDraft, SuggestionService};
pub use store::{FileStore, LibraryStore, MemoryStore};
pub use sync::{CatalogSync, SyncReport};
pub use value::FieldValue;
