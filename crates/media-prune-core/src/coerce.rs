use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use media_prune_models::ValueKind;

use crate::value::FieldValue;

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Turn the raw condition value into a typed value.
///
/// Coercion never fails: a value that does not parse falls back to the
/// neutral value of its kind (0, false, or the minimum date).
pub fn coerce(raw: &str, kind: &ValueKind) -> FieldValue {
    match kind {
        ValueKind::CustomDays => raw
            .trim()
            .parse::<i32>()
            .map(|days| FieldValue::Integer(i64::from(days)))
            .unwrap_or(FieldValue::Integer(0)),
        ValueKind::CustomNumber => FieldValue::Float(raw.trim().parse::<f64>().unwrap_or(0.0)),
        ValueKind::CustomDate => FieldValue::Date(parse_date(raw).unwrap_or(DateTime::<Utc>::MIN_UTC)),
        ValueKind::Boolean => FieldValue::Boolean(raw.trim().eq_ignore_ascii_case("true")),
        ValueKind::Null => FieldValue::Absent,
        ValueKind::CustomText | ValueKind::Other(_) => FieldValue::Text(raw.to_string()),
    }
}

/// Lenient date parsing. Values without an offset are taken as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}
