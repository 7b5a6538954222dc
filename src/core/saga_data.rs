// Saga instance state as seen by the store.
//
// Purpose
// - Describe what a record type must offer to be persisted: identity, revision, correlation fields.
//
// Responsibilities
// - Expose correlation fields by name so the store never needs to know concrete record types.
// - Provide the value type used for correlation matching, with a structural form (equality)
//   and a string form (lookup).
//
// Boundaries
// - Copying a record is `Clone`. Record types must own their data so a clone shares nothing.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type SagaId = Uuid;

/// Generates a fresh, time-ordered saga identifier.
pub fn new_saga_id() -> SagaId {
    Uuid::now_v7()
}

/// Capability every persisted saga record type implements.
///
/// `correlation_value` returns `None` when the type has no field with that name, and
/// `Some(CorrelationValue::Null)` when the field exists but is unset.
pub trait SagaData: Clone + Send + Sync + 'static {
    fn id(&self) -> SagaId;
    fn revision(&self) -> u64;
    fn set_revision(&mut self, revision: u64);
    fn correlation_value(&self, property: &str) -> Option<CorrelationValue>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CorrelationValue {
    Null,
    Bool(bool),
    Int(i64),
    #[serde(rename = "uint")]
    UInt(u64),
    Uuid(Uuid),
    Text(String),
}

impl CorrelationValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CorrelationValue::Null)
    }
}

impl fmt::Display for CorrelationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationValue::Null => Ok(()),
            CorrelationValue::Bool(v) => write!(f, "{v}"),
            CorrelationValue::Int(v) => write!(f, "{v}"),
            CorrelationValue::UInt(v) => write!(f, "{v}"),
            CorrelationValue::Uuid(v) => write!(f, "{v}"),
            CorrelationValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for CorrelationValue {
    fn from(v: bool) -> Self {
        CorrelationValue::Bool(v)
    }
}

impl From<i32> for CorrelationValue {
    fn from(v: i32) -> Self {
        CorrelationValue::Int(i64::from(v))
    }
}

impl From<i64> for CorrelationValue {
    fn from(v: i64) -> Self {
        CorrelationValue::Int(v)
    }
}

impl From<u32> for CorrelationValue {
    fn from(v: u32) -> Self {
        CorrelationValue::UInt(u64::from(v))
    }
}

impl From<u64> for CorrelationValue {
    fn from(v: u64) -> Self {
        CorrelationValue::UInt(v)
    }
}

impl From<&str> for CorrelationValue {
    fn from(v: &str) -> Self {
        CorrelationValue::Text(v.to_string())
    }
}

impl From<String> for CorrelationValue {
    fn from(v: String) -> Self {
        CorrelationValue::Text(v)
    }
}

impl From<&String> for CorrelationValue {
    fn from(v: &String) -> Self {
        CorrelationValue::Text(v.clone())
    }
}

impl From<Uuid> for CorrelationValue {
    fn from(v: Uuid) -> Self {
        CorrelationValue::Uuid(v)
    }
}

impl<T: Into<CorrelationValue>> From<Option<T>> for CorrelationValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CorrelationValue::Null, Into::into)
    }
}

/// Name of a record field whose value must be unique among stored sagas of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationProperty {
    name: String,
}

impl CorrelationProperty {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&str> for CorrelationProperty {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for CorrelationProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod saga_data_tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const ORDER_UUID: &str = "6f1c5b9e-4c1a-4d8e-9f0a-2b3c4d5e6f70";

    #[rstest]
    #[case(CorrelationValue::Null, "")]
    #[case(CorrelationValue::Bool(true), "true")]
    #[case(CorrelationValue::Int(-42), "-42")]
    #[case(CorrelationValue::UInt(42), "42")]
    #[case(CorrelationValue::Text("ABC".into()), "ABC")]
    fn it_should_render_the_lookup_string_form(
        #[case] value: CorrelationValue,
        #[case] expected: &str,
    ) {
        assert_eq!(value.to_string(), expected);
    }

    #[rstest]
    fn it_should_render_uuids_hyphenated() {
        let id = Uuid::parse_str(ORDER_UUID).unwrap();
        assert_eq!(CorrelationValue::from(id).to_string(), ORDER_UUID);
    }

    #[rstest]
    fn it_should_compare_structurally_across_variants() {
        assert_ne!(CorrelationValue::from(42i64), CorrelationValue::from("42"));
        assert_ne!(CorrelationValue::from(42i64), CorrelationValue::from(42u64));
        assert_eq!(CorrelationValue::from("42"), CorrelationValue::Text("42".into()));
    }

    #[rstest]
    fn it_should_map_none_to_null() {
        let missing: Option<&str> = None;
        assert!(CorrelationValue::from(missing).is_null());
        assert_eq!(CorrelationValue::from(Some(7i32)), CorrelationValue::Int(7));
    }

    #[rstest]
    #[case(CorrelationValue::Null)]
    #[case(CorrelationValue::Bool(false))]
    #[case(CorrelationValue::Int(42))]
    #[case(CorrelationValue::UInt(42))]
    #[case(CorrelationValue::UInt(u64::MAX))]
    #[case(CorrelationValue::Uuid(Uuid::parse_str(ORDER_UUID).unwrap()))]
    #[case(CorrelationValue::Text(ORDER_UUID.into()))]
    #[case(CorrelationValue::Text("42".into()))]
    fn it_should_keep_the_variant_through_json(#[case] value: CorrelationValue) {
        let json = serde_json::to_string(&value).unwrap();
        let back: CorrelationValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[rstest]
    fn it_should_tag_json_values_with_their_type() {
        let values = vec![
            CorrelationValue::Null,
            CorrelationValue::Int(-3),
            CorrelationValue::UInt(3),
            CorrelationValue::Text("ABC".into()),
        ];
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            json!([
                { "type": "null" },
                { "type": "int", "value": -3 },
                { "type": "uint", "value": 3 },
                { "type": "text", "value": "ABC" },
            ])
        );
    }

    #[rstest]
    fn it_should_serialize_a_property_as_its_name() {
        let property = CorrelationProperty::from("order_number");
        assert_eq!(serde_json::to_string(&property).unwrap(), r#""order_number""#);
        assert_eq!(property.name(), "order_number");
        assert_eq!(property.to_string(), "order_number");
    }
}
