//! Order records extracted from unstructured API text

use super::{json_type_name, StructuredOutput};
use crate::errors::ValidationError;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

/// One order as mentioned in the raw text.
///
/// Fields the model could not extract stay `None`; they are never filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub order_id: Option<String>,
    pub buyer: Option<String>,
    pub state: Option<String>,
    pub total: Option<f64>,
}

/// Envelope returned by the model for one chunk.
///
/// Records are kept as raw JSON so one malformed record can be dropped
/// without discarding its siblings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderBatch {
    pub orders: Vec<Value>,
}

impl StructuredOutput for OrderBatch {
    const SCHEMA_NAME: &'static str = "extracted_orders";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "orders": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "orderId": { "type": ["string", "null"] },
                            "buyer": { "type": ["string", "null"] },
                            "state": { "type": ["string", "null"] },
                            "total": { "type": ["number", "null"] }
                        },
                        "required": ["orderId", "buyer", "state", "total"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["orders"],
            "additionalProperties": false
        })
    }
}

impl OrderRecord {
    /// Coerce one extracted JSON record.
    ///
    /// Absent and null fields become `None`. A field of the wrong type, or a
    /// total that does not read as a number, rejects the whole record.
    pub fn from_extracted(value: &Value) -> Result<Self, ValidationError> {
        let object = value.as_object().ok_or(ValidationError::NotAnObject {
            found: json_type_name(value),
        })?;

        let record = Self {
            order_id: order_id_field(object)?,
            buyer: text_field(object, "buyer")?,
            state: text_field(object, "state")?,
            total: total_field(object)?,
        };

        if record.order_id.is_none()
            && record.buyer.is_none()
            && record.state.is_none()
            && record.total.is_none()
        {
            return Err(ValidationError::EmptyRecord);
        }

        Ok(record)
    }
}

fn text_field(object: &Map<String, Value>, field: &'static str) -> Result<Option<String>, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(non_empty(s)),
        Some(other) => Err(ValidationError::WrongType {
            field,
            expected: "string or null",
            found: json_type_name(other),
        }),
    }
}

fn order_id_field(object: &Map<String, Value>) -> Result<Option<String>, ValidationError> {
    const FIELD: &str = "orderId";
    match object.get(FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(non_empty(s)),
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => Ok(Some(n.to_string())),
        Some(other) => Err(ValidationError::WrongType {
            field: FIELD,
            expected: "string, integer or null",
            found: json_type_name(other),
        }),
    }
}

fn total_field(object: &Map<String, Value>) -> Result<Option<f64>, ValidationError> {
    const FIELD: &str = "total";
    match object.get(FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| ValidationError::NotNumeric {
                field: FIELD,
                value: n.to_string(),
            }),
        Some(Value::String(s)) => parse_amount(s).map(Some).ok_or_else(|| ValidationError::NotNumeric {
            field: FIELD,
            value: s.clone(),
        }),
        Some(other) => Err(ValidationError::WrongType {
            field: FIELD,
            expected: "number or null",
            found: json_type_name(other),
        }),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(-?)\$?(-?)((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?|\.\d+)$")
            .expect("amount pattern is valid")
    })
}

/// Parse a money-like string: optional sign, optional `$`, optional
/// thousands separators. Anything else is not a number.
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    let caps = amount_pattern().captures(raw.trim())?;
    let negative = match (&caps[1], &caps[2]) {
        ("-", "-") => return None,
        ("-", _) | (_, "-") => true,
        _ => false,
    };
    let magnitude: f64 = caps[3].replace(',', "").parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_record() {
        let record = OrderRecord::from_extracted(&json!({
            "orderId": "1001", "buyer": "J. Smith", "state": "OH", "total": 742.10
        }))
        .unwrap();
        assert_eq!(record.order_id.as_deref(), Some("1001"));
        assert_eq!(record.buyer.as_deref(), Some("J. Smith"));
        assert_eq!(record.total, Some(742.10));
    }

    #[test]
    fn test_missing_fields_stay_null() {
        let record = OrderRecord::from_extracted(&json!({ "orderId": 1002 })).unwrap();
        assert_eq!(record.order_id.as_deref(), Some("1002"));
        assert_eq!(record.buyer, None);
        assert_eq!(record.state, None);
        assert_eq!(record.total, None);
    }

    #[test]
    fn test_money_strings_are_coerced() {
        let record = OrderRecord::from_extracted(&json!({ "orderId": "7", "total": " $1,234.50 " })).unwrap();
        assert_eq!(record.total, Some(1234.5));
        assert_eq!(parse_amount("-$20"), Some(-20.0));
        assert_eq!(parse_amount("$.99"), Some(0.99));
    }

    #[test]
    fn test_non_numeric_total_rejects_record() {
        let err = OrderRecord::from_extracted(&json!({ "orderId": "7", "total": "about five hundred" }))
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotNumeric { field: "total", .. }));

        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("12,34"), None);
        assert_eq!(parse_amount("--5"), None);
    }

    #[test]
    fn test_wrong_types_reject_record() {
        let err = OrderRecord::from_extracted(&json!({ "orderId": "1", "buyer": true })).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongType {
                field: "buyer",
                expected: "string or null",
                found: "boolean",
            }
        );

        let err = OrderRecord::from_extracted(&json!({ "orderId": 10.5 })).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { field: "orderId", .. }));

        let err = OrderRecord::from_extracted(&json!(["1001"])).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject { found: "array" });
    }

    #[test]
    fn test_blank_strings_become_null() {
        let record = OrderRecord::from_extracted(&json!({ "orderId": "  ", "buyer": "A. Lee", "state": "" }))
            .unwrap();
        assert_eq!(record.order_id, None);
        assert_eq!(record.state, None);
        assert_eq!(record.buyer.as_deref(), Some("A. Lee"));
    }

    #[test]
    fn test_all_null_record_is_rejected() {
        let err = OrderRecord::from_extracted(&json!({
            "orderId": null, "buyer": null, "state": null, "total": null
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyRecord);
    }

    #[test]
    fn test_record_serializes_with_nulls() {
        let record = OrderRecord {
            order_id: Some("1".into()),
            buyer: None,
            state: Some("CA".into()),
            total: Some(12.0),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "orderId": "1", "buyer": null, "state": "CA", "total": 12.0 })
        );
    }
}
