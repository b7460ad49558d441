//! Typed JSON column adapter
//!
//! Converts between a stored JSON document and one of a closed set of
//! value objects. Only types listed in this module implement
//! [`ColumnValue`]; anything else is rejected at compile time.
//!
//! Decode rules for single-record columns:
//! - SQL NULL, JSON `null` and `{}` decode to `None`
//! - a non-empty object decodes field by field, missing fields default
//! - any other JSON shape is a [`CodecError::UnexpectedShape`]
//!
//! List columns decode NULL, `null` and `[]` to an empty vec; every
//! element must itself be an object.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::criteria::{CompanyCriteria, PersonCriteria, ProcessCriteria, ToolCriteria};
use crate::error::CodecError;
use crate::values::{Funding, Location, SocialActivity, Tool, WorkExperience};

mod sealed {
    pub trait Sealed {}
}

/// A value object that may be stored in a JSON column.
pub trait ColumnValue: sealed::Sealed + Serialize + DeserializeOwned {
    /// Column label used in error messages.
    const KIND: &'static str;
}

macro_rules! column_values {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl ColumnValue for $ty {
                const KIND: &'static str = $kind;
            }
        )*
    };
}

column_values! {
    Location => "location",
    Funding => "funding",
    WorkExperience => "work experience",
    SocialActivity => "social activity",
    Tool => "tool",
    CompanyCriteria => "company criteria",
    ToolCriteria => "tool criteria",
    ProcessCriteria => "process criteria",
    PersonCriteria => "person criteria",
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Encode an optional record. `None` maps to SQL NULL.
pub fn encode<T: ColumnValue>(value: Option<&T>) -> Result<Option<Value>, CodecError> {
    value
        .map(|v| serde_json::to_value(v).map_err(|e| CodecError::encode(T::KIND, e.to_string())))
        .transpose()
}

/// Decode a stored value into an optional record.
pub fn decode<T: ColumnValue>(stored: Option<Value>) -> Result<Option<T>, CodecError> {
    match stored {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value @ Value::Object(_)) => decode_object(value).map(Some),
        Some(other) => Err(CodecError::unexpected_shape(
            T::KIND,
            format!("expected object, found {}", shape_name(&other)),
        )),
    }
}

/// Encode a list column. An empty slice is stored as `[]`.
pub fn encode_list<T: ColumnValue>(values: &[T]) -> Result<Value, CodecError> {
    serde_json::to_value(values).map_err(|e| CodecError::encode(T::KIND, e.to_string()))
}

/// Decode a list column.
pub fn decode_list<T: ColumnValue>(stored: Option<Value>) -> Result<Vec<T>, CodecError> {
    match stored {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(_) => decode_object(item),
                other => Err(CodecError::unexpected_shape(
                    T::KIND,
                    format!("expected object list element, found {}", shape_name(&other)),
                )),
            })
            .collect(),
        Some(other) => Err(CodecError::unexpected_shape(
            T::KIND,
            format!("expected array, found {}", shape_name(&other)),
        )),
    }
}

fn decode_object<T: ColumnValue>(value: Value) -> Result<T, CodecError> {
    serde_json::from_value(value).map_err(|e| CodecError::unexpected_shape(T::KIND, e.to_string()))
}

/// Serde adapter applying [`decode`] to a nested field, for rows that
/// arrive as aggregated JSON.
///
/// ```ignore
/// #[serde(default, deserialize_with = "codec::deserialize_column")]
/// location: Option<Location>,
/// ```
pub fn deserialize_column<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: ColumnValue,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    decode(raw).map_err(de::Error::custom)
}

/// Serde adapter applying [`decode_list`] to a nested field.
pub fn deserialize_list_column<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: ColumnValue,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    decode_list(raw).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ToolCertainty;
    use serde_json::json;

    #[test]
    fn absence_round_trips() {
        let stored = encode::<Location>(None).unwrap();
        assert_eq!(stored, None);
        assert_eq!(decode::<Location>(stored).unwrap(), None);
    }

    #[test]
    fn empty_record_round_trips_as_present() {
        // An all-default record is still a record, not absence
        let value = Funding::default();
        let stored = encode(Some(&value)).unwrap();
        assert_eq!(decode::<Funding>(stored).unwrap(), Some(value));
    }

    #[test]
    fn populated_records_round_trip() {
        let location = Location {
            country: Some("France".into()),
            region: Some("IDF".into()),
            city: Some("Paris".into()),
        };
        let stored = encode(Some(&location)).unwrap();
        assert_eq!(decode::<Location>(stored).unwrap(), Some(location));

        let criteria = CompanyCriteria {
            countries: vec!["France".into()],
            min_headcount: Some(10),
            ..Default::default()
        };
        let stored = encode(Some(&criteria)).unwrap();
        assert_eq!(decode::<CompanyCriteria>(stored).unwrap(), Some(criteria));
    }

    #[test]
    fn null_and_empty_object_decode_to_none() {
        assert_eq!(decode::<Location>(Some(Value::Null)).unwrap(), None);
        assert_eq!(decode::<Location>(Some(json!({}))).unwrap(), None);
    }

    #[test]
    fn old_rows_decode_with_defaults() {
        let decoded: Funding = decode(Some(json!({"round_name": "Seed"})))
            .unwrap()
            .unwrap();
        assert_eq!(decoded.round_name.as_deref(), Some("Seed"));
        assert!(decoded.investors.is_empty());
    }

    #[test]
    fn wrong_shape_fails_loudly() {
        let err = decode::<Location>(Some(json!(["Paris"]))).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedShape { column: "location", .. }));

        let err = decode::<Location>(Some(json!({"city": 42}))).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedShape { .. }));
    }

    #[test]
    fn unknown_enum_inside_record_fails() {
        let err = decode::<Tool>(Some(json!({"name": "Rust", "certainty": "Certain"}))).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedShape { column: "tool", .. }));
    }

    #[test]
    fn list_round_trip() {
        let tools = vec![
            Tool::new("Rust", ToolCertainty::High),
            Tool::new("Docker", ToolCertainty::Low),
        ];
        let stored = encode_list(&tools).unwrap();
        assert_eq!(decode_list::<Tool>(Some(stored)).unwrap(), tools);

        let stored = encode_list::<Tool>(&[]).unwrap();
        assert_eq!(stored, json!([]));
        assert!(decode_list::<Tool>(Some(stored)).unwrap().is_empty());
        assert!(decode_list::<Tool>(None).unwrap().is_empty());
    }

    #[test]
    fn list_rejects_scalars() {
        assert!(decode_list::<Tool>(Some(json!({"name": "Rust"}))).is_err());
        assert!(decode_list::<Tool>(Some(json!(["Rust"]))).is_err());
    }

    #[test]
    fn serde_adapter_applies_decode_rules() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "deserialize_column")]
            location: Option<Location>,
            #[serde(default, deserialize_with = "deserialize_list_column")]
            tools: Vec<Tool>,
        }

        let row: Row = serde_json::from_value(json!({"location": {}, "tools": null})).unwrap();
        assert_eq!(row.location, None);
        assert!(row.tools.is_empty());

        let row: Row = serde_json::from_value(json!({})).unwrap();
        assert_eq!(row.location, None);

        let err = serde_json::from_value::<Row>(json!({"location": "Paris"}));
        assert!(err.is_err());
    }
}
