use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ---------------------------------------------------------------------------
// Observation – one point of the trend series
// ---------------------------------------------------------------------------

/// A labelled value. Position in the sequence is significant: it is the
/// independent variable of the trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub label: String,
    pub value: f64,
}

impl Observation {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

// ---------------------------------------------------------------------------
// RelationOption – one candidate of the dependent filter
// ---------------------------------------------------------------------------

/// A related entity the series can be scoped to.
///
/// Ids are kept as text: they are only ever echoed back into a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationOption {
    pub id: String,
    pub display: String,
}

impl RelationOption {
    pub fn new(id: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display: display.into(),
        }
    }
}

impl fmt::Display for RelationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display)
    }
}

/// Render a JSON scalar as an id / display string. Arrays, objects and
/// `null` have no sensible text form and yield `None`.
pub fn json_scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_observation_from_json() {
        let obs: Observation = serde_json::from_value(json!({"label": "d1", "value": 1.5})).unwrap();
        assert_eq!(obs, Observation::new("d1", 1.5));
    }

    #[test]
    fn test_scalar_ids() {
        assert_eq!(json_scalar_to_string(&json!(17)), Some("17".to_string()));
        assert_eq!(json_scalar_to_string(&json!("abc")), Some("abc".to_string()));
        assert_eq!(json_scalar_to_string(&json!(null)), None);
        assert_eq!(json_scalar_to_string(&json!([1])), None);
    }
}
