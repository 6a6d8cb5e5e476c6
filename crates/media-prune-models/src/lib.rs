pub mod catalog;
pub mod media;
pub mod rule;
pub mod suggestion;
pub mod watch_history;

pub use catalog::{Catalog, IdWatermarks};
pub use media::{Episode, MediaKind, Movie, Series};
pub use rule::{default_rules, Condition, FieldName, LogicalLink, Operator, SuggestionRule, ValueKind};
pub use suggestion::{Suggestion, SuggestionKey};
pub use watch_history::{WatchEvent, WatchHistory};
