//! Request parameters
//!
//! JSON-RPC 2.0 allows `params` to be omitted, or to be a structured value:
//! an array (by-position) or an object (by-name). A request type in this
//! crate commits to exactly one of the two through the [`Params`] trait, and
//! anything arriving with the other structure is rejected rather than
//! coerced.
//!
//! [`ParamsValue`] is the untyped view used at the wire boundary; typed
//! payloads implement [`Params`] directly, through the [`Positional`] /
//! [`Named`] wrappers, or with `#[derive(Params)]` from `jbind-macros`.
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::{Params, ParamsKind, ParamsValue};
//! use serde_json::json;
//!
//! let params = ParamsValue::positional(vec![json!(42), json!(23)]);
//! assert_eq!(params.kind(), Some(ParamsKind::Positional));
//! assert_eq!(params.as_positional::<i64>().unwrap(), vec![42, 23]);
//!
//! // Reading by-position params by name is a shape mismatch
//! assert!(params.as_named::<i64>().is_err());
//!
//! let typed = <Vec<i64> as Params>::from_params(params).unwrap();
//! assert_eq!(typed, vec![42, 23]);
//! ```

use crate::error::{Error, Result, Shape};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Parameter structure declared by a request type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamsKind {
    /// By-position: a JSON array
    Positional,
    /// By-name: a JSON object
    Named,
}

impl ParamsKind {
    /// The JSON shape carrying this kind of params
    pub fn shape(self) -> Shape {
        match self {
            ParamsKind::Positional => Shape::Array,
            ParamsKind::Named => Shape::Object,
        }
    }
}

impl fmt::Display for ParamsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsKind::Positional => f.write_str("positional"),
            ParamsKind::Named => f.write_str("named"),
        }
    }
}

/// Untyped `params` member
///
/// Named params are kept in a `serde_json::Map`; member order carries no
/// meaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamsValue {
    /// No `params` member
    #[default]
    Absent,
    /// By-position params
    Positional(Vec<Value>),
    /// By-name params
    Named(Map<String, Value>),
}

impl ParamsValue {
    /// By-position params from any sequence of values
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        ParamsValue::Positional(values.into_iter().collect())
    }

    /// By-name params from any sequence of name/value pairs
    pub fn named<K: Into<String>>(members: impl IntoIterator<Item = (K, Value)>) -> Self {
        ParamsValue::Named(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// True if there is no `params` member
    pub fn is_absent(&self) -> bool {
        matches!(self, ParamsValue::Absent)
    }

    /// True for both by-position and by-name params
    pub fn is_structured(&self) -> bool {
        !self.is_absent()
    }

    /// Which structure is present, `None` when absent
    pub fn kind(&self) -> Option<ParamsKind> {
        match self {
            ParamsValue::Absent => None,
            ParamsValue::Positional(_) => Some(ParamsKind::Positional),
            ParamsValue::Named(_) => Some(ParamsKind::Named),
        }
    }

    /// JSON shape of the member
    pub fn shape(&self) -> Shape {
        self.kind().map_or(Shape::Absent, ParamsKind::shape)
    }

    /// Decode every element of by-position params
    ///
    /// # Errors
    ///
    /// `Error::ShapeMismatch` unless the params are positional;
    /// `Error::Serialization` if an element does not decode as `T`.
    pub fn as_positional<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        match self {
            ParamsValue::Positional(values) => values
                .iter()
                .map(|v| T::deserialize(v).map_err(Error::serialization))
                .collect(),
            other => Err(other.mismatch(ParamsKind::Positional)),
        }
    }

    /// Decode every member of by-name params
    ///
    /// # Errors
    ///
    /// `Error::ShapeMismatch` unless the params are named;
    /// `Error::Serialization` if a member does not decode as `T`.
    pub fn as_named<T: DeserializeOwned>(&self) -> Result<BTreeMap<String, T>> {
        match self {
            ParamsValue::Named(members) => members
                .iter()
                .map(|(k, v)| {
                    T::deserialize(v)
                        .map(|t| (k.clone(), t))
                        .map_err(Error::serialization)
                })
                .collect(),
            other => Err(other.mismatch(ParamsKind::Named)),
        }
    }

    /// Decode by-name params into a single struct
    ///
    /// # Errors
    ///
    /// `Error::ShapeMismatch` unless the params are named;
    /// `Error::Serialization` if the object does not decode as `T`.
    pub fn as_named_object<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            ParamsValue::Named(members) => {
                T::deserialize(&Value::Object(members.clone())).map_err(Error::serialization)
            }
            other => Err(other.mismatch(ParamsKind::Named)),
        }
    }

    /// Wire form, `None` when the member must be omitted
    pub fn to_wire(&self) -> Option<Value> {
        match self {
            ParamsValue::Absent => None,
            ParamsValue::Positional(values) => Some(Value::Array(values.clone())),
            ParamsValue::Named(members) => Some(Value::Object(members.clone())),
        }
    }

    /// Read params from an optional wire member
    ///
    /// # Errors
    ///
    /// Returns `Error::ShapeMismatch` when the member is present but is not
    /// an array or an object (including explicit `null`).
    pub fn from_wire(member: Option<Value>) -> Result<Self> {
        match member {
            None => Ok(ParamsValue::Absent),
            Some(Value::Array(values)) => Ok(ParamsValue::Positional(values)),
            Some(Value::Object(members)) => Ok(ParamsValue::Named(members)),
            Some(other) => Err(Error::ShapeMismatch {
                expected: Shape::Object,
                found: Shape::of(&other),
            }),
        }
    }

    fn mismatch(&self, expected: ParamsKind) -> Error {
        Error::ShapeMismatch {
            expected: expected.shape(),
            found: self.shape(),
        }
    }
}

/// Typed request parameters with a fixed structure
///
/// Implementations decide once whether they travel by-position or by-name.
/// `from_params` is only called for present params and must reject the
/// other structure with `Error::ShapeMismatch`.
pub trait Params: Sized {
    /// The structure this type is bound to
    const KIND: ParamsKind;

    /// Encode into the declared structure
    fn to_params(&self) -> Result<ParamsValue>;

    /// Decode from present params
    fn from_params(params: ParamsValue) -> Result<Self>;
}

/// Serialize `value` and require a JSON array
///
/// # Errors
///
/// `Error::ShapeMismatch` if `value` does not serialize to an array.
pub fn encode_positional<T: Serialize + ?Sized>(value: &T) -> Result<ParamsValue> {
    match serde_json::to_value(value).map_err(Error::serialization)? {
        Value::Array(values) => Ok(ParamsValue::Positional(values)),
        other => Err(Error::ShapeMismatch {
            expected: Shape::Array,
            found: Shape::of(&other),
        }),
    }
}

/// Serialize `value` and require a JSON object
///
/// # Errors
///
/// `Error::ShapeMismatch` if `value` does not serialize to an object.
pub fn encode_named<T: Serialize + ?Sized>(value: &T) -> Result<ParamsValue> {
    match serde_json::to_value(value).map_err(Error::serialization)? {
        Value::Object(members) => Ok(ParamsValue::Named(members)),
        other => Err(Error::ShapeMismatch {
            expected: Shape::Object,
            found: Shape::of(&other),
        }),
    }
}

/// Decode by-position params as a whole into `T`
///
/// # Errors
///
/// `Error::ShapeMismatch` unless `params` is positional.
pub fn decode_positional<T: DeserializeOwned>(params: ParamsValue) -> Result<T> {
    match params {
        ParamsValue::Positional(values) => {
            serde_json::from_value(Value::Array(values)).map_err(Error::serialization)
        }
        other => Err(other.mismatch(ParamsKind::Positional)),
    }
}

/// Decode by-name params as a whole into `T`
///
/// # Errors
///
/// `Error::ShapeMismatch` unless `params` is named.
pub fn decode_named<T: DeserializeOwned>(params: ParamsValue) -> Result<T> {
    match params {
        ParamsValue::Named(members) => {
            serde_json::from_value(Value::Object(members)).map_err(Error::serialization)
        }
        other => Err(other.mismatch(ParamsKind::Named)),
    }
}

/// Serde bounds of a by-name payload or a by-position element
///
/// `#[derive(Params)]` places this bound on generic payloads.
pub trait Payload: Serialize + DeserializeOwned {}

impl<T: Serialize + DeserializeOwned> Payload for T {}

/// Serialize one by-position element
///
/// Used by `#[derive(Params)]` for positional structs.
///
/// # Errors
///
/// `Error::Serialization` if `value` cannot be serialized.
pub fn encode_element<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(Error::serialization)
}

/// Decode one by-position element, treating a missing element as `null`
///
/// Trailing optional fields may therefore be left out by the caller.
///
/// # Errors
///
/// `Error::Serialization` if the element does not bind to `T`.
pub fn decode_element<T: DeserializeOwned>(element: Option<Value>) -> Result<T> {
    serde_json::from_value(element.unwrap_or(Value::Null)).map_err(Error::serialization)
}

/// Elements of by-position params holding at most `arity` values
///
/// # Errors
///
/// `Error::ShapeMismatch` unless `params` is positional, `Error::Format` if
/// it holds more than `arity` elements.
pub fn positional_elements(params: ParamsValue, arity: usize) -> Result<Vec<Value>> {
    match params {
        ParamsValue::Positional(values) if values.len() > arity => Err(Error::Format(format!(
            "expected at most {} positional params, found {}",
            arity,
            values.len()
        ))),
        ParamsValue::Positional(values) => Ok(values),
        other => Err(other.mismatch(ParamsKind::Positional)),
    }
}

impl<T: Serialize + DeserializeOwned> Params for Vec<T> {
    const KIND: ParamsKind = ParamsKind::Positional;

    fn to_params(&self) -> Result<ParamsValue> {
        encode_positional(self)
    }

    fn from_params(params: ParamsValue) -> Result<Self> {
        decode_positional(params)
    }
}

impl Params for Map<String, Value> {
    const KIND: ParamsKind = ParamsKind::Named;

    fn to_params(&self) -> Result<ParamsValue> {
        Ok(ParamsValue::Named(self.clone()))
    }

    fn from_params(params: ParamsValue) -> Result<Self> {
        match params {
            ParamsValue::Named(members) => Ok(members),
            other => Err(other.mismatch(ParamsKind::Named)),
        }
    }
}

impl<T: Serialize + DeserializeOwned> Params for BTreeMap<String, T> {
    const KIND: ParamsKind = ParamsKind::Named;

    fn to_params(&self) -> Result<ParamsValue> {
        encode_named(self)
    }

    fn from_params(params: ParamsValue) -> Result<Self> {
        decode_named(params)
    }
}

impl<T: Serialize + DeserializeOwned> Params for HashMap<String, T> {
    const KIND: ParamsKind = ParamsKind::Named;

    fn to_params(&self) -> Result<ParamsValue> {
        encode_named(self)
    }

    fn from_params(params: ParamsValue) -> Result<Self> {
        decode_named(params)
    }
}

/// Binds any serde type to by-position params
///
/// Useful for tuples and tuple structs: `Positional<(i64, i64)>` travels as
/// `[42, 23]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Positional<T>(pub T);

impl<T: Serialize + DeserializeOwned> Params for Positional<T> {
    const KIND: ParamsKind = ParamsKind::Positional;

    fn to_params(&self) -> Result<ParamsValue> {
        encode_positional(&self.0)
    }

    fn from_params(params: ParamsValue) -> Result<Self> {
        decode_positional(params).map(Positional)
    }
}

/// Binds any serde type to by-name params
///
/// Useful for structs with named fields: `Named<Subtract>` travels as
/// `{"minuend": 42, "subtrahend": 23}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Named<T>(pub T);

impl<T: Serialize + DeserializeOwned> Params for Named<T> {
    const KIND: ParamsKind = ParamsKind::Named;

    fn to_params(&self) -> Result<ParamsValue> {
        encode_named(&self.0)
    }

    fn from_params(params: ParamsValue) -> Result<Self> {
        decode_named(params).map(Named)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Subtract {
        minuend: i64,
        subtrahend: i64,
    }

    #[test]
    fn test_kinds_and_shapes() {
        assert_eq!(ParamsValue::Absent.kind(), None);
        assert!(!ParamsValue::Absent.is_structured());
        assert_eq!(ParamsValue::positional(vec![]).kind(), Some(ParamsKind::Positional));
        assert!(ParamsValue::named(Vec::<(String, Value)>::new()).is_structured());
        assert_eq!(ParamsValue::Absent.shape(), Shape::Absent);
    }

    #[test]
    fn test_as_named() {
        let params = ParamsValue::named([("minuend", json!(42)), ("subtrahend", json!(23))]);

        let members = params.as_named::<i64>().unwrap();
        assert_eq!(members["minuend"], 42);
        assert_eq!(members["subtrahend"], 23);

        let object: Subtract = params.as_named_object().unwrap();
        assert_eq!(object, Subtract { minuend: 42, subtrahend: 23 });
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let positional = ParamsValue::positional(vec![json!(1)]);
        let err = positional.as_named::<i64>().unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch {
                expected: Shape::Object,
                found: Shape::Array
            }
        );

        let absent = ParamsValue::Absent;
        assert!(absent.as_positional::<i64>().unwrap_err().is_shape_mismatch());
    }

    #[test]
    fn test_from_wire() {
        assert_eq!(ParamsValue::from_wire(None).unwrap(), ParamsValue::Absent);
        assert_eq!(
            ParamsValue::from_wire(Some(json!([1, 2]))).unwrap().kind(),
            Some(ParamsKind::Positional)
        );
        assert_eq!(
            ParamsValue::from_wire(Some(json!({"a": 1}))).unwrap().kind(),
            Some(ParamsKind::Named)
        );
        assert!(ParamsValue::from_wire(Some(json!(null))).is_err());
        assert!(ParamsValue::from_wire(Some(json!(3))).is_err());
    }

    #[test]
    fn test_wrapper_params() {
        let named = Named(Subtract { minuend: 42, subtrahend: 23 });
        let encoded = named.to_params().unwrap();
        assert_eq!(encoded.to_wire(), Some(json!({"minuend": 42, "subtrahend": 23})));
        assert_eq!(Named::<Subtract>::from_params(encoded).unwrap(), named);

        let positional = Positional((42i64, 23i64));
        let encoded = positional.to_params().unwrap();
        assert_eq!(encoded.to_wire(), Some(json!([42, 23])));

        let err = Named::<Subtract>::from_params(encoded).unwrap_err();
        assert!(err.is_shape_mismatch());
    }

    #[test]
    fn test_positional_wrapper_rejects_object_payload() {
        let wrong = Positional(Subtract { minuend: 1, subtrahend: 2 });
        assert!(wrong.to_params().unwrap_err().is_shape_mismatch());
    }

    #[test]
    fn test_map_params() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1u32);
        let encoded = map.to_params().unwrap();
        assert_eq!(encoded.kind(), Some(ParamsKind::Named));
        assert_eq!(BTreeMap::<String, u32>::from_params(encoded).unwrap(), map);

        let raw = Map::<String, Value>::from_params(ParamsValue::named([("x", json!(true))])).unwrap();
        assert_eq!(raw["x"], json!(true));
    }
    #[test]
    fn test_positional_elements() {
        let params = ParamsValue::positional(vec![json!(7), json!("x")]);
        let elements = positional_elements(params.clone(), 3).unwrap();
        let mut elements = elements.into_iter();
        assert_eq!(decode_element::<i64>(elements.next()).unwrap(), 7);
        assert_eq!(decode_element::<String>(elements.next()).unwrap(), "x");
        assert_eq!(decode_element::<Option<bool>>(elements.next()).unwrap(), None);

        assert!(matches!(positional_elements(params, 1), Err(Error::Format(_))));
        assert!(positional_elements(ParamsValue::Absent, 1)
            .unwrap_err()
            .is_shape_mismatch());
        assert_eq!(encode_element(&[1, 2]).unwrap(), json!([1, 2]));
    }
}
