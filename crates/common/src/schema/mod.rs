//! Schema contracts shared by both extraction stages
//!
//! Each contract has two faces:
//! - a JSON Schema sent to the provider to constrain decoding
//! - a serde type used to validate the output deterministically afterward
//!
//! Neither schema carries a boolean or verdict field. The model only ever
//! names fields, operators and literal values.

mod intent;
mod order;

pub use intent::{ComparisonOperator, ComparisonOperators, Intent, IntentDraft, OperatorDraft};
pub use order::{OrderBatch, OrderRecord};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Named JSON Schema handed to the model provider
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// A type the model gateway can extract
pub trait StructuredOutput: DeserializeOwned + Send + 'static {
    /// Schema name reported to the provider and in failures
    const SCHEMA_NAME: &'static str;

    /// JSON Schema (strict subset: every property required, no extras)
    fn json_schema() -> Value;

    fn output_schema() -> OutputSchema {
        OutputSchema {
            name: Self::SCHEMA_NAME,
            schema: Self::json_schema(),
        }
    }
}

/// JSON type name used in validation messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_property_types(value: &Value, out: &mut Vec<String>) {
        if let Some(props) = value.get("properties").and_then(Value::as_object) {
            for prop in props.values() {
                if let Some(ty) = prop.get("type") {
                    out.push(ty.to_string());
                }
                collect_property_types(prop, out);
            }
        }
        if let Some(items) = value.get("items") {
            collect_property_types(items, out);
        }
    }

    #[test]
    fn test_schemas_never_allow_boolean_verdicts() {
        for schema in [IntentDraft::json_schema(), OrderBatch::json_schema()] {
            let mut types = Vec::new();
            collect_property_types(&schema, &mut types);
            assert!(!types.is_empty());
            assert!(types.iter().all(|t| !t.contains("boolean")));
        }
    }

    #[test]
    fn test_schemas_are_closed() {
        let intent = IntentDraft::json_schema();
        assert_eq!(intent["additionalProperties"], Value::Bool(false));

        let orders = OrderBatch::json_schema();
        assert_eq!(orders["additionalProperties"], Value::Bool(false));
        assert_eq!(
            orders["properties"]["orders"]["items"]["additionalProperties"],
            Value::Bool(false)
        );
    }
}
