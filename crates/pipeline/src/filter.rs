//! Deterministic Filter Engine
//!
//! The only place where an order passes or fails. Pure and total: no model
//! calls, no I/O, no tolerance. Policy:
//! - a null field targeted by a filter excludes the record
//! - numeric operators are applied verbatim (greater_than is strict)
//! - location is compared after normalization, never fuzzily
//! - a dimension without a filter is unconstrained

use order_agent_common::schema::{ComparisonOperator, Intent, OrderRecord};
use serde::Serialize;
use tracing::debug;

/// Records that satisfied every constraint, and how many did not
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOutcome {
    pub matched: Vec<OrderRecord>,
    pub discarded: usize,
}

/// Why a record was excluded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exclusion {
    MissingField(&'static str),
    LocationMismatch,
    TotalOutOfRange {
        operator: ComparisonOperator,
        bound: f64,
    },
}

/// Apply `intent` to `records`, preserving input order
pub fn apply_filters(intent: &Intent, records: Vec<OrderRecord>) -> FilterOutcome {
    let location = intent.location_filter().map(normalize_location);
    let mut matched = Vec::with_capacity(records.len());
    let mut discarded = 0;

    for record in records {
        match evaluate(intent, location.as_deref(), &record) {
            Ok(()) => matched.push(record),
            Err(reason) => {
                debug!(order_id = ?record.order_id, ?reason, "Order excluded");
                discarded += 1;
            }
        }
    }

    FilterOutcome { matched, discarded }
}

/// Check one record. `location` is the intent's already-normalized location.
fn evaluate(intent: &Intent, location: Option<&str>, record: &OrderRecord) -> Result<(), Exclusion> {
    if let Some(wanted) = location {
        let state = record.state.as_deref().ok_or(Exclusion::MissingField("state"))?;
        if normalize_location(state) != wanted {
            return Err(Exclusion::LocationMismatch);
        }
    }

    for (operator, bound) in intent.min_total().into_iter().chain(intent.max_total()) {
        let total = record.total.ok_or(Exclusion::MissingField("total"))?;
        if !compare(operator, total, bound) {
            return Err(Exclusion::TotalOutOfRange { operator, bound });
        }
    }

    Ok(())
}

/// `value <operator> bound`, exactly
pub fn compare(operator: ComparisonOperator, value: f64, bound: f64) -> bool {
    match operator {
        ComparisonOperator::Equals => value == bound,
        ComparisonOperator::GreaterThan => value > bound,
        ComparisonOperator::LessThan => value < bound,
        ComparisonOperator::GreaterOrEqual => value >= bound,
        ComparisonOperator::LessOrEqual => value <= bound,
    }
}

/// Trim, collapse whitespace and case-fold; full US state names map to
/// their two-letter code so "Ohio" and "OH" compare equal.
pub fn normalize_location(raw: &str) -> String {
    let folded = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    match STATE_CODES.iter().find(|(name, _)| *name == folded) {
        Some((_, code)) => code.to_string(),
        None => folded,
    }
}

const STATE_CODES: &[(&str, &str)] = &[
    ("alabama", "al"),
    ("alaska", "ak"),
    ("arizona", "az"),
    ("arkansas", "ar"),
    ("california", "ca"),
    ("colorado", "co"),
    ("connecticut", "ct"),
    ("delaware", "de"),
    ("district of columbia", "dc"),
    ("florida", "fl"),
    ("georgia", "ga"),
    ("hawaii", "hi"),
    ("idaho", "id"),
    ("illinois", "il"),
    ("indiana", "in"),
    ("iowa", "ia"),
    ("kansas", "ks"),
    ("kentucky", "ky"),
    ("louisiana", "la"),
    ("maine", "me"),
    ("maryland", "md"),
    ("massachusetts", "ma"),
    ("michigan", "mi"),
    ("minnesota", "mn"),
    ("mississippi", "ms"),
    ("missouri", "mo"),
    ("montana", "mt"),
    ("nebraska", "ne"),
    ("nevada", "nv"),
    ("new hampshire", "nh"),
    ("new jersey", "nj"),
    ("new mexico", "nm"),
    ("new york", "ny"),
    ("north carolina", "nc"),
    ("north dakota", "nd"),
    ("ohio", "oh"),
    ("oklahoma", "ok"),
    ("oregon", "or"),
    ("pennsylvania", "pa"),
    ("rhode island", "ri"),
    ("south carolina", "sc"),
    ("south dakota", "sd"),
    ("tennessee", "tn"),
    ("texas", "tx"),
    ("utah", "ut"),
    ("vermont", "vt"),
    ("virginia", "va"),
    ("washington", "wa"),
    ("west virginia", "wv"),
    ("wisconsin", "wi"),
    ("wyoming", "wy"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use order_agent_common::schema::{IntentDraft, OperatorDraft};

    fn order(id: &str, state: Option<&str>, total: Option<f64>) -> OrderRecord {
        OrderRecord {
            order_id: Some(id.to_string()),
            buyer: None,
            state: state.map(str::to_string),
            total,
        }
    }

    fn min_total(value: f64, operator: ComparisonOperator) -> Intent {
        Intent::from_draft(
            IntentDraft {
                min_total: Some(value),
                comparison_operators: Some(OperatorDraft {
                    min_total: Some(operator),
                    max_total: None,
                }),
                ..Default::default()
            },
            "test",
        )
        .unwrap()
    }

    fn ids(outcome: &FilterOutcome) -> Vec<&str> {
        outcome
            .matched
            .iter()
            .filter_map(|r| r.order_id.as_deref())
            .collect()
    }

    fn boundary_orders() -> Vec<OrderRecord> {
        vec![
            order("a", None, Some(499.99)),
            order("b", None, Some(500.00)),
            order("c", None, Some(500.01)),
        ]
    }

    #[test]
    fn test_greater_than_is_strict() {
        let outcome = apply_filters(&min_total(500.0, ComparisonOperator::GreaterThan), boundary_orders());
        assert_eq!(ids(&outcome), vec!["c"]);
        assert_eq!(outcome.discarded, 2);
    }

    #[test]
    fn test_greater_or_equal_is_inclusive() {
        let outcome = apply_filters(&min_total(500.0, ComparisonOperator::GreaterOrEqual), boundary_orders());
        assert_eq!(ids(&outcome), vec!["b", "c"]);
    }

    #[test]
    fn test_equals_has_no_tolerance() {
        let outcome = apply_filters(&min_total(500.0, ComparisonOperator::Equals), boundary_orders());
        assert_eq!(ids(&outcome), vec!["b"]);
    }

    #[test]
    fn test_upper_bound() {
        let intent = Intent::from_draft(
            IntentDraft {
                max_total: Some(500.0),
                comparison_operators: Some(OperatorDraft {
                    min_total: None,
                    max_total: Some(ComparisonOperator::LessOrEqual),
                }),
                ..Default::default()
            },
            "test",
        )
        .unwrap();
        let outcome = apply_filters(&intent, boundary_orders());
        assert_eq!(ids(&outcome), vec!["a", "b"]);
    }

    #[test]
    fn test_null_field_is_excluded_for_every_operator() {
        let operators = [
            ComparisonOperator::Equals,
            ComparisonOperator::GreaterThan,
            ComparisonOperator::GreaterOrEqual,
        ];
        for operator in operators {
            let outcome = apply_filters(&min_total(0.0, operator), vec![order("x", Some("OH"), None)]);
            assert!(outcome.matched.is_empty(), "{:?} let a null total through", operator);
            assert_eq!(outcome.discarded, 1);
        }

        for operator in [
            ComparisonOperator::Equals,
            ComparisonOperator::LessThan,
            ComparisonOperator::LessOrEqual,
        ] {
            let intent = Intent::from_draft(
                IntentDraft {
                    max_total: Some(1_000_000.0),
                    comparison_operators: Some(OperatorDraft {
                        min_total: None,
                        max_total: Some(operator),
                    }),
                    ..Default::default()
                },
                "test",
            )
            .unwrap();
            let outcome = apply_filters(&intent, vec![order("z", Some("OH"), None)]);
            assert!(outcome.matched.is_empty(), "{:?} let a null total through", operator);
            assert_eq!(outcome.discarded, 1);
        }

        let intent = Intent::from_draft(
            IntentDraft {
                location_filter: Some("OH".into()),
                ..Default::default()
            },
            "test",
        )
        .unwrap();
        let outcome = apply_filters(&intent, vec![order("y", None, Some(10.0))]);
        assert!(outcome.matched.is_empty());
    }

    #[test]
    fn test_location_normalization() {
        assert_eq!(normalize_location("  Ohio "), "oh");
        assert_eq!(normalize_location("OH"), "oh");
        assert_eq!(normalize_location("new   YORK"), "ny");
        assert_eq!(normalize_location("Ontario"), "ontario");
    }

    #[test]
    fn test_location_is_exact_after_normalization() {
        let intent = Intent::from_draft(
            IntentDraft {
                location_filter: Some("Ohio".into()),
                ..Default::default()
            },
            "test",
        )
        .unwrap();
        let records = vec![
            order("1", Some("oh"), Some(1.0)),
            order("2", Some("Ohio "), Some(1.0)),
            order("3", Some("Ohi"), Some(1.0)),
            order("4", Some("OK"), Some(1.0)),
        ];
        let outcome = apply_filters(&intent, records);
        assert_eq!(ids(&outcome), vec!["1", "2"]);
        assert_eq!(outcome.discarded, 2);
    }

    #[test]
    fn test_no_filters_pass_everything() {
        let records = vec![order("1", None, None), order("2", Some("CA"), Some(3.0))];
        let outcome = apply_filters(&Intent::unconstrained("all orders"), records.clone());
        assert_eq!(outcome.matched, records);
        assert_eq!(outcome.discarded, 0);
    }

    #[test]
    fn test_filtering_is_stable() {
        let intent = min_total(100.0, ComparisonOperator::GreaterThan);
        let records: Vec<_> = (0..50)
            .map(|i| order(&i.to_string(), Some("TX"), Some(i as f64 * 7.5)))
            .collect();

        let first = apply_filters(&intent, records.clone());
        let second = apply_filters(&intent, records);
        assert_eq!(first, second);
    }
}
