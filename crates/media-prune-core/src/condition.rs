//! Evaluation of a single condition against a resolved field value.
//!
//! Every type mismatch, absent operand or unknown operator evaluates to `false`.
//! Nothing here returns an error.

use chrono::{DateTime, Duration, Utc};
use media_prune_models::{Condition, Operator};
use std::cmp::Ordering;

use crate::coerce::coerce;
use crate::value::FieldValue;

pub fn evaluate_condition(field_value: &FieldValue, condition: &Condition) -> bool {
    evaluate_condition_at(field_value, condition, Utc::now())
}

/// Same as [`evaluate_condition`] with an explicit "now" for relative date operators
pub fn evaluate_condition_at(field_value: &FieldValue, condition: &Condition, now: DateTime<Utc>) -> bool {
    let compare = coerce(&condition.value, &condition.value_type);

    match &condition.operator {
        Operator::Bigger => field_value.numeric_cmp(&compare) == Some(Ordering::Greater),
        Operator::Smaller => field_value.numeric_cmp(&compare) == Some(Ordering::Less),
        Operator::Equals => equals(field_value, &compare, &condition.value),
        Operator::NotEquals => !equals(field_value, &compare, &condition.value),
        Operator::Contains => text_match(field_value, &compare, true),
        Operator::NotContains => !text_match(field_value, &compare, true),
        Operator::ContainsPartial => text_match(field_value, &compare, false),
        Operator::NotContainsPartial => !text_match(field_value, &compare, false),
        Operator::Before => before(field_value, &compare, now),
        Operator::After => after(field_value, &compare, now),
        Operator::InLast => in_last(field_value, &compare, now),
        Operator::InNext => in_next(field_value, &compare, now),
        Operator::Unknown(_) => false,
    }
}

fn equals(field_value: &FieldValue, compare: &FieldValue, raw: &str) -> bool {
    if raw == "null" {
        return field_value.is_absent();
    }
    match (field_value, compare) {
        (FieldValue::Absent, FieldValue::Absent) => true,
        (FieldValue::Absent, _) | (_, FieldValue::Absent) => false,
        (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
        _ => field_value.to_text() == compare.to_text(),
    }
}

/// Case-insensitive text match, whole string when `exact`, substring otherwise
fn text_match(field_value: &FieldValue, compare: &FieldValue, exact: bool) -> bool {
    let (Some(haystack), Some(needle)) = (field_value.to_text(), compare.to_text()) else {
        return false;
    };
    let haystack = haystack.to_lowercase();
    let needle = needle.to_lowercase();
    if exact {
        haystack == needle
    } else {
        haystack.contains(&needle)
    }
}

fn shift_days(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    now.checked_add_signed(Duration::try_days(days)?)
}

fn before(field_value: &FieldValue, compare: &FieldValue, now: DateTime<Utc>) -> bool {
    let Some(date) = field_value.as_date() else {
        return false;
    };
    let cutoff = match compare {
        FieldValue::Integer(days) => shift_days(now, -days),
        FieldValue::Date(d) => Some(*d),
        _ => None,
    };
    cutoff.is_some_and(|cutoff| date < cutoff)
}

fn after(field_value: &FieldValue, compare: &FieldValue, now: DateTime<Utc>) -> bool {
    let Some(date) = field_value.as_date() else {
        return false;
    };
    let cutoff = match compare {
        FieldValue::Integer(days) => shift_days(now, *days),
        FieldValue::Date(d) => Some(*d),
        _ => None,
    };
    cutoff.is_some_and(|cutoff| date > cutoff)
}

fn in_last(field_value: &FieldValue, compare: &FieldValue, now: DateTime<Utc>) -> bool {
    match (field_value, compare) {
        (FieldValue::Date(date), FieldValue::Integer(days)) => {
            shift_days(now, -days).is_some_and(|start| *date >= start && *date <= now)
        }
        _ => false,
    }
}

fn in_next(field_value: &FieldValue, compare: &FieldValue, now: DateTime<Utc>) -> bool {
    match (field_value, compare) {
        (FieldValue::Date(date), FieldValue::Integer(days)) => {
            shift_days(now, *days).is_some_and(|end| *date >= now && *date <= end)
        }
        _ => false,
    }
}
