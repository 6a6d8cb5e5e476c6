use chrono::{DateTime, SecondsFormat, Utc};
use std::cmp::Ordering;

/// A typed value pulled from a media record or coerced from a condition
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Date(DateTime<Utc>),
    Boolean(bool),
    Absent,
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn from_size(bytes: u64) -> Self {
        FieldValue::Integer(i64::try_from(bytes).unwrap_or(i64::MAX))
    }

    pub fn from_count(count: usize) -> Self {
        FieldValue::Integer(i64::try_from(count).unwrap_or(i64::MAX))
    }

    pub fn from_year(year: Option<u32>) -> Self {
        year.map_or(FieldValue::Absent, |y| FieldValue::Integer(i64::from(y)))
    }

    pub fn from_date(date: Option<DateTime<Utc>>) -> Self {
        date.map_or(FieldValue::Absent, FieldValue::Date)
    }

    pub fn from_text(text: Option<&str>) -> Self {
        text.map_or(FieldValue::Absent, |t| FieldValue::Text(t.to_string()))
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Order two numeric values. Integer pairs compare exactly, mixed pairs as floats.
    /// Returns `None` when either side is not a number (or is NaN).
    pub fn numeric_cmp(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Float(a), FieldValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Textual form used by the loose equality and string operators.
    /// Whole floats print without a fraction so `2020` and `2020.0` compare equal.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Date(d) => Some(d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::Absent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_numeric_cmp_mixes_integer_and_float() {
        assert_eq!(
            FieldValue::Integer(500).numeric_cmp(&FieldValue::Float(0.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            FieldValue::Float(1.5).numeric_cmp(&FieldValue::Integer(2)),
            Some(Ordering::Less)
        );
        assert_eq!(FieldValue::Text("5".into()).numeric_cmp(&FieldValue::Integer(2)), None);
        assert_eq!(FieldValue::Float(f64::NAN).numeric_cmp(&FieldValue::Float(1.0)), None);
    }

    #[test]
    fn test_to_text_of_whole_float_has_no_fraction() {
        assert_eq!(FieldValue::Float(2020.0).to_text().unwrap(), "2020");
        assert_eq!(FieldValue::Float(0.5).to_text().unwrap(), "0.5");
        assert_eq!(FieldValue::Integer(2020).to_text().unwrap(), "2020");
    }

    #[test]
    fn test_to_text_of_date_and_absent() {
        let date = Utc.with_ymd_and_hms(2024, 12, 18, 20, 30, 0).unwrap();
        assert_eq!(FieldValue::Date(date).to_text().unwrap(), "2024-12-18T20:30:00Z");
        assert_eq!(FieldValue::Absent.to_text(), None);
    }
}
