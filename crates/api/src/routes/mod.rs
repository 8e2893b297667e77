//! Route handlers

pub mod health;
pub mod index;
pub mod precipitation;
pub mod stations;
pub mod temperature;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single reading serialized as a one-entry object, `{"<date>": value}`.
///
/// Responses are lists of these rather than one merged object, so several
/// stations reporting on the same date each keep their own entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedValue {
    pub date: String,
    pub value: Option<f64>,
}

impl DatedValue {
    pub fn new(date: String, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

impl Serialize for DatedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.date, &self.value)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dated_value_shape() {
        let values = vec![
            DatedValue::new("2017-01-01".into(), Some(0.08)),
            DatedValue::new("2017-01-01".into(), None),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[{"2017-01-01":0.08},{"2017-01-01":null}]"#);
    }
}
