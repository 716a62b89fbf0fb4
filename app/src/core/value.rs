use std::fmt::Display;

use serde_json::Value;

/// A presented value of a single field, after path resolution and transformation.
#[derive(Debug, Clone, PartialEq, derive_more::From)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl FieldValue {
    /// Scalar JSON values only; `null` and structured values have no presentation.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            //"NaN" and "inf" parse as f64, but are not usable readings
            FieldValue::Text(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
            FieldValue::Bool(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Bool(true) => write!(f, "ON"),
            FieldValue::Bool(false) => write!(f, "OFF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_are_converted() {
        assert_eq!(FieldValue::from_json(&json!(215)), Some(FieldValue::Number(215.0)));
        assert_eq!(FieldValue::from_json(&json!("CO2")), Some(FieldValue::Text("CO2".to_string())));
        assert_eq!(FieldValue::from_json(&json!(true)), Some(FieldValue::Bool(true)));
    }

    #[test]
    fn null_and_structures_are_absent() {
        assert_eq!(FieldValue::from_json(&json!(null)), None);
        assert_eq!(FieldValue::from_json(&json!([1, 2])), None);
        assert_eq!(FieldValue::from_json(&json!({ "a": 1 })), None);
    }

    #[test]
    fn numeric_text_is_a_number() {
        assert_eq!(FieldValue::from("21.5").as_f64(), Some(21.5));
        assert_eq!(FieldValue::from("Daily").as_f64(), None);
        assert_eq!(FieldValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn non_finite_text_is_not_a_number() {
        assert_eq!(FieldValue::from("NaN").as_f64(), None);
        assert_eq!(FieldValue::from("inf").as_f64(), None);
        assert_eq!(FieldValue::from("-infinity").as_f64(), None);
    }

    #[test]
    fn display_as_state_payload() {
        assert_eq!(FieldValue::Number(21.5).to_string(), "21.5");
        assert_eq!(FieldValue::Number(20.0).to_string(), "20");
        assert_eq!(FieldValue::from("Boost").to_string(), "Boost");
        assert_eq!(FieldValue::Bool(false).to_string(), "OFF");
    }
}
