//! Query intent: which fields the user constrained, with which operator and literal

use super::StructuredOutput;
use crate::errors::IntentError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Comparison operators the model may name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Equals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "equals",
            ComparisonOperator::GreaterThan => "greater_than",
            ComparisonOperator::LessThan => "less_than",
            ComparisonOperator::GreaterOrEqual => "greater_or_equal",
            ComparisonOperator::LessOrEqual => "less_or_equal",
        }
    }
}

const LOWER_BOUND_OPERATORS: &[ComparisonOperator] = &[
    ComparisonOperator::GreaterThan,
    ComparisonOperator::GreaterOrEqual,
    ComparisonOperator::Equals,
];

const UPPER_BOUND_OPERATORS: &[ComparisonOperator] = &[
    ComparisonOperator::LessThan,
    ComparisonOperator::LessOrEqual,
    ComparisonOperator::Equals,
];

/// Operators as emitted by the model, one per bound
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperatorDraft {
    #[serde(default)]
    pub min_total: Option<ComparisonOperator>,
    #[serde(default)]
    pub max_total: Option<ComparisonOperator>,
}

/// Intent exactly as the model returned it, before semantic checks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IntentDraft {
    #[serde(default)]
    pub location_filter: Option<String>,
    #[serde(default)]
    pub min_total: Option<f64>,
    #[serde(default)]
    pub max_total: Option<f64>,
    #[serde(default)]
    pub comparison_operators: Option<OperatorDraft>,
}

impl StructuredOutput for IntentDraft {
    const SCHEMA_NAME: &'static str = "order_query_intent";

    fn json_schema() -> Value {
        let operator = |allowed: &[ComparisonOperator]| {
            let mut values: Vec<Value> = allowed.iter().map(|op| json!(op.as_str())).collect();
            values.push(Value::Null);
            json!({ "type": ["string", "null"], "enum": values })
        };

        json!({
            "type": "object",
            "properties": {
                "locationFilter": {
                    "type": ["string", "null"],
                    "description": "Region the user named (state code or name), null if none"
                },
                "minTotal": {
                    "type": ["number", "null"],
                    "description": "Lower bound on order total the user named, null if none"
                },
                "maxTotal": {
                    "type": ["number", "null"],
                    "description": "Upper bound on order total the user named, null if none"
                },
                "comparisonOperators": {
                    "type": "object",
                    "properties": {
                        "minTotal": operator(LOWER_BOUND_OPERATORS),
                        "maxTotal": operator(UPPER_BOUND_OPERATORS)
                    },
                    "required": ["minTotal", "maxTotal"],
                    "additionalProperties": false
                }
            },
            "required": ["locationFilter", "minTotal", "maxTotal", "comparisonOperators"],
            "additionalProperties": false
        })
    }
}

/// Resolved operators; each is present exactly when its bound is
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonOperators {
    pub min_total: Option<ComparisonOperator>,
    pub max_total: Option<ComparisonOperator>,
}

/// Validated filter request for one query. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    location_filter: Option<String>,
    min_total: Option<f64>,
    max_total: Option<f64>,
    comparison_operators: ComparisonOperators,
    raw_query: String,
}

impl Intent {
    /// Intent with no constraints on any dimension
    pub fn unconstrained(raw_query: impl Into<String>) -> Self {
        Self {
            location_filter: None,
            min_total: None,
            max_total: None,
            comparison_operators: ComparisonOperators::default(),
            raw_query: raw_query.into(),
        }
    }

    /// Validate a model draft into an intent.
    ///
    /// A bound without an operator gets the strict default (`greater_than`
    /// for the lower bound, `less_than` for the upper bound). An operator
    /// without a bound, or an operator pointing the wrong way, is rejected.
    pub fn from_draft(draft: IntentDraft, raw_query: impl Into<String>) -> Result<Self, IntentError> {
        let operators = draft.comparison_operators.unwrap_or_default();

        let min_operator = resolve_bound(
            "minTotal",
            draft.min_total,
            operators.min_total,
            ComparisonOperator::GreaterThan,
            LOWER_BOUND_OPERATORS,
        )?;
        let max_operator = resolve_bound(
            "maxTotal",
            draft.max_total,
            operators.max_total,
            ComparisonOperator::LessThan,
            UPPER_BOUND_OPERATORS,
        )?;

        let location_filter = draft
            .location_filter
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        Ok(Self {
            location_filter,
            min_total: draft.min_total,
            max_total: draft.max_total,
            comparison_operators: ComparisonOperators {
                min_total: min_operator,
                max_total: max_operator,
            },
            raw_query: raw_query.into(),
        })
    }

    pub fn location_filter(&self) -> Option<&str> {
        self.location_filter.as_deref()
    }

    /// Lower bound with its operator
    pub fn min_total(&self) -> Option<(ComparisonOperator, f64)> {
        self.comparison_operators.min_total.zip(self.min_total)
    }

    /// Upper bound with its operator
    pub fn max_total(&self) -> Option<(ComparisonOperator, f64)> {
        self.comparison_operators.max_total.zip(self.max_total)
    }

    pub fn comparison_operators(&self) -> ComparisonOperators {
        self.comparison_operators
    }

    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// True when no dimension is constrained
    pub fn is_unconstrained(&self) -> bool {
        self.location_filter.is_none() && self.min_total.is_none() && self.max_total.is_none()
    }
}

fn resolve_bound(
    bound: &'static str,
    value: Option<f64>,
    operator: Option<ComparisonOperator>,
    default: ComparisonOperator,
    allowed: &[ComparisonOperator],
) -> Result<Option<ComparisonOperator>, IntentError> {
    match (value, operator) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(IntentError::OperatorWithoutValue { bound }),
        (Some(v), _) if !v.is_finite() => Err(IntentError::NonFiniteBound { bound }),
        (Some(_), None) => Ok(Some(default)),
        (Some(_), Some(op)) if allowed.contains(&op) => Ok(Some(op)),
        (Some(_), Some(op)) => Err(IntentError::OperatorNotAllowed {
            bound,
            operator: op.as_str(),
        }),
    }
}
