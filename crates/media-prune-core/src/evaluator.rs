//! Rule evaluation: combines the results of a rule's conditions into one verdict.
//!
//! Conditions are folded strictly left to right. The link stored on condition `i - 1`
//! decides how condition `i` joins the running result, so `A OR B AND C` is
//! `(A || B) && C`. A link that is neither AND nor OR drops the next result.
//! Every condition is evaluated, there is no short-circuiting.

use chrono::{DateTime, Utc};
use media_prune_models::{Condition, Episode, LogicalLink, Movie, Series};

use crate::condition::evaluate_condition_at;
use crate::field::{resolve_movie_field, resolve_series_field};

pub fn evaluate_movie(movie: &Movie, conditions: &[Condition]) -> bool {
    evaluate_movie_at(movie, conditions, Utc::now())
}

pub fn evaluate_series(series: &Series, episodes: &[&Episode], conditions: &[Condition]) -> bool {
    evaluate_series_at(series, episodes, conditions, Utc::now())
}

pub fn evaluate_movie_at(movie: &Movie, conditions: &[Condition], now: DateTime<Utc>) -> bool {
    fold_conditions(conditions, |condition| {
        let value = resolve_movie_field(movie, &condition.field);
        evaluate_condition_at(&value, condition, now)
    })
}

pub fn evaluate_series_at(
    series: &Series,
    episodes: &[&Episode],
    conditions: &[Condition],
    now: DateTime<Utc>,
) -> bool {
    fold_conditions(conditions, |condition| {
        let value = resolve_series_field(series, episodes, &condition.field);
        evaluate_condition_at(&value, condition, now)
    })
}

fn fold_conditions<F>(conditions: &[Condition], mut evaluate: F) -> bool
where
    F: FnMut(&Condition) -> bool,
{
    let Some(first) = conditions.first() else {
        return false;
    };

    let mut result = evaluate(first);
    for pair in conditions.windows(2) {
        let condition_result = evaluate(&pair[1]);
        match &pair[0].logical_operator {
            Some(LogicalLink::And) => result = result && condition_result,
            Some(LogicalLink::Or) => result = result || condition_result,
            Some(LogicalLink::Other(_)) | None => {}
        }
    }
    result
}
