//! Retention rules and the condition wire format.
//!
//! Conditions are stored on a rule as a JSON array of
//! `{field, operator, value, valueType, logicalOperator}` objects. Symbolic names are
//! parsed into closed enums; names the engine does not know are kept verbatim in an
//! `Unknown`/`Other` variant so a rule written by a newer UI survives an edit round trip.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::media::MediaKind;

/// Media attribute a condition inspects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldName {
    LastWatched,
    Added,
    RequestedDate,
    RequestedBy,
    WatchedBy,
    SizeOnDisk,
    TotalSize,
    Year,
    Monitored,
    WatchCount,
    Title,
    Quality,
    EpisodeCount,
    Unknown(String),
}

impl FieldName {
    pub fn parse(name: &str) -> Self {
        match name {
            "lastWatched" => FieldName::LastWatched,
            "added" => FieldName::Added,
            "requestedDate" => FieldName::RequestedDate,
            "requestedBy" => FieldName::RequestedBy,
            "watchedBy" => FieldName::WatchedBy,
            "sizeOnDisk" => FieldName::SizeOnDisk,
            "totalSize" => FieldName::TotalSize,
            "year" => FieldName::Year,
            "monitored" => FieldName::Monitored,
            "watchCount" => FieldName::WatchCount,
            "title" => FieldName::Title,
            "quality" => FieldName::Quality,
            "episodeCount" => FieldName::EpisodeCount,
            other => FieldName::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldName::LastWatched => "lastWatched",
            FieldName::Added => "added",
            FieldName::RequestedDate => "requestedDate",
            FieldName::RequestedBy => "requestedBy",
            FieldName::WatchedBy => "watchedBy",
            FieldName::SizeOnDisk => "sizeOnDisk",
            FieldName::TotalSize => "totalSize",
            FieldName::Year => "year",
            FieldName::Monitored => "monitored",
            FieldName::WatchCount => "watchCount",
            FieldName::Title => "title",
            FieldName::Quality => "quality",
            FieldName::EpisodeCount => "episodeCount",
            FieldName::Unknown(name) => name,
        }
    }
}

/// Comparison applied between the field value and the condition value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Bigger,
    Smaller,
    Equals,
    NotEquals,
    /// Case-insensitive whole-string match
    Contains,
    NotContains,
    /// Case-insensitive substring match
    ContainsPartial,
    NotContainsPartial,
    Before,
    After,
    InLast,
    InNext,
    Unknown(String),
}

impl Operator {
    pub fn parse(name: &str) -> Self {
        match name {
            "bigger" => Operator::Bigger,
            "smaller" => Operator::Smaller,
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            "contains" => Operator::Contains,
            "not_contains" => Operator::NotContains,
            "contains_partial" => Operator::ContainsPartial,
            "not_contains_partial" => Operator::NotContainsPartial,
            "before" => Operator::Before,
            "after" => Operator::After,
            "in_last" => Operator::InLast,
            "in_next" => Operator::InNext,
            other => Operator::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Bigger => "bigger",
            Operator::Smaller => "smaller",
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::ContainsPartial => "contains_partial",
            Operator::NotContainsPartial => "not_contains_partial",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::InLast => "in_last",
            Operator::InNext => "in_next",
            Operator::Unknown(name) => name,
        }
    }
}

/// How the raw condition value is typed before comparing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueKind {
    CustomDays,
    CustomNumber,
    CustomDate,
    CustomText,
    Boolean,
    Null,
    /// Unrecognized kind, the value is compared as raw text
    Other(String),
}

impl ValueKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "customDays" => ValueKind::CustomDays,
            "customNumber" => ValueKind::CustomNumber,
            "customDate" => ValueKind::CustomDate,
            "customText" => ValueKind::CustomText,
            "boolean" => ValueKind::Boolean,
            "null" => ValueKind::Null,
            other => ValueKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ValueKind::CustomDays => "customDays",
            ValueKind::CustomNumber => "customNumber",
            ValueKind::CustomDate => "customDate",
            ValueKind::CustomText => "customText",
            ValueKind::Boolean => "boolean",
            ValueKind::Null => "null",
            ValueKind::Other(name) => name,
        }
    }
}

/// Link between a condition and the one after it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogicalLink {
    And,
    Or,
    /// Anything else; the next condition's result is ignored
    Other(String),
}

impl LogicalLink {
    pub fn parse(name: &str) -> Self {
        match name {
            "AND" => LogicalLink::And,
            "OR" => LogicalLink::Or,
            other => LogicalLink::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LogicalLink::And => "AND",
            LogicalLink::Or => "OR",
            LogicalLink::Other(name) => name,
        }
    }
}

macro_rules! string_conversions {
    ($($ty:ident => $default:expr),* $(,)?) => {
        $(
            impl From<String> for $ty {
                fn from(value: String) -> Self {
                    $ty::parse(&value)
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.as_str().to_string()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl Default for $ty {
                fn default() -> Self {
                    $default
                }
            }
        )*
    };
}

string_conversions! {
    FieldName => FieldName::Unknown(String::new()),
    Operator => Operator::Unknown(String::new()),
    ValueKind => ValueKind::Other(String::new()),
    LogicalLink => LogicalLink::Other(String::new()),
}

/// One comparison clause of a rule, in its stored JSON shape
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: FieldName,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operator: Operator,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value_type: ValueKind,
    /// How this condition's result combines with the next one. Ignored on the last condition.
    #[serde(default)]
    pub logical_operator: Option<LogicalLink>,
}

impl Condition {
    pub fn new(field: FieldName, operator: Operator, value: impl Into<String>, value_type: ValueKind) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
            value_type,
            logical_operator: None,
        }
    }

    pub fn linked(mut self, link: LogicalLink) -> Self {
        self.logical_operator = Some(link);
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_true() -> bool {
    true
}

fn empty_conditions() -> String {
    "[]".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRule {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub apply_to_movies: bool,
    #[serde(default = "default_true")]
    pub apply_to_series: bool,
    /// Raw condition list exactly as the rule editor sent it
    #[serde(default = "empty_conditions")]
    pub conditions_json: String,
    /// User-created rules may be deleted, built-in ones only disabled
    #[serde(default)]
    pub is_custom: bool,
}

impl SuggestionRule {
    /// Parse the stored condition list. A JSON `null` is treated as an empty list.
    pub fn parse_conditions(&self) -> Result<Vec<Condition>, serde_json::Error> {
        let parsed: Option<Vec<Condition>> = serde_json::from_str(&self.conditions_json)?;
        Ok(parsed.unwrap_or_default())
    }

    pub fn set_conditions(&mut self, conditions: &[Condition]) -> Result<(), serde_json::Error> {
        self.conditions_json = serde_json::to_string(conditions)?;
        Ok(())
    }

    pub fn applies_to(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Movie => self.apply_to_movies,
            MediaKind::Series => self.apply_to_series,
        }
    }
}

/// Built-in rules written to a fresh store
pub fn default_rules() -> Vec<SuggestionRule> {
    vec![
        SuggestionRule {
            id: 1,
            name: "Not Watched (180 days)".to_string(),
            description: "Movies/Series not watched in 180 days".to_string(),
            enabled: true,
            apply_to_movies: true,
            apply_to_series: true,
            conditions_json: r#"[{"field":"lastWatched","operator":"before","value":"180","valueType":"customDays","logicalOperator":null}]"#.to_string(),
            is_custom: false,
        },
        SuggestionRule {
            id: 2,
            name: "Fully Watched (2+ people)".to_string(),
            description: "Movies watched by 2 or more people".to_string(),
            enabled: true,
            apply_to_movies: true,
            apply_to_series: false,
            conditions_json: r#"[{"field":"watchCount","operator":"bigger","value":"2","valueType":"customNumber","logicalOperator":null}]"#.to_string(),
            is_custom: false,
        },
        SuggestionRule {
            id: 3,
            name: "Ignored Request (90 days)".to_string(),
            description: "Requested but not watched for 90 days".to_string(),
            enabled: true,
            apply_to_movies: true,
            apply_to_series: true,
            conditions_json: r#"[{"field":"requestedDate","operator":"before","value":"90","valueType":"customDays","logicalOperator":"AND"},{"field":"lastWatched","operator":"equals","value":"null","valueType":"null","logicalOperator":null}]"#.to_string(),
            is_custom: false,
        },
        SuggestionRule {
            id: 4,
            name: "Unmonitored Cleanup (30 days)".to_string(),
            description: "Unmonitored and not watched for 30 days".to_string(),
            enabled: false,
            apply_to_movies: true,
            apply_to_series: true,
            conditions_json: r#"[{"field":"monitored","operator":"equals","value":"false","valueType":"boolean","logicalOperator":"AND"},{"field":"lastWatched","operator":"before","value":"30","valueType":"customDays","logicalOperator":null}]"#.to_string(),
            is_custom: false,
        },
    ]
}
