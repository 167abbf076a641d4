//! Message identifiers
//!
//! The JSON-RPC 2.0 `id` member is polymorphic: it may be a string, a number
//! (which SHOULD NOT have fractional parts), `null`, or missing entirely. A
//! missing id turns a request into a notification; an explicit `null` is only
//! meaningful on error responses to requests whose id could not be read.
//!
//! [`IdValue`] keeps all four states apart so that an `"id": null` on the wire
//! decodes to [`IdValue::Null`] and re-encodes as `null`, while a missing id
//! stays missing.
//!
//! Integral ids are held as [`IdNumber`], an arbitrary-precision integer kept
//! as its canonical decimal literal. Narrowing to `i64`/`i32` is explicit and
//! fails with `Error::Range` when the value does not fit.
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::IdValue;
//!
//! let id = IdValue::from_integer(42i64);
//! assert_eq!(id.as_string().as_deref(), Some("42"));
//! assert_eq!(id.as_long().unwrap(), Some(42));
//!
//! let text = IdValue::from_string("17");
//! assert_eq!(text.as_i32().unwrap(), Some(17));
//!
//! assert!(IdValue::from_string("abc").as_long().is_err());
//! ```

use crate::error::{Error, Result};
use serde_json::{Number, Value};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Arbitrary-precision integer id
///
/// Stored as a canonical decimal literal: an optional `-` followed by digits
/// without leading zeros (`0` itself is allowed, `-0` is not). Two ids with
/// the same numeric value therefore always have the same representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdNumber(String);

impl IdNumber {
    /// Parse a canonical integer literal
    ///
    /// # Errors
    ///
    /// Returns `Error::Format` for anything that is not a canonical integer
    /// literal: empty strings, signs other than a leading `-`, leading zeros,
    /// `-0`, fractions, exponents, or surrounding whitespace.
    pub fn parse(literal: &str) -> Result<Self> {
        if is_canonical_integer(literal) {
            Ok(Self(literal.to_string()))
        } else {
            Err(Error::Format(format!(
                "{:?} is not a canonical integer literal",
                literal
            )))
        }
    }

    /// The canonical decimal literal
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the value is below zero
    pub fn is_negative(&self) -> bool {
        self.0.starts_with('-')
    }

    /// Narrow to `i64`
    ///
    /// # Errors
    ///
    /// Returns `Error::Range` if the value does not fit exactly.
    pub fn to_i64(&self) -> Result<i64> {
        // the literal is canonical, so a parse failure can only mean overflow
        self.0.parse::<i64>().map_err(|_| self.out_of_range("i64"))
    }

    /// Narrow to `i32`
    ///
    /// # Errors
    ///
    /// Returns `Error::Range` if the value does not fit exactly.
    pub fn to_i32(&self) -> Result<i32> {
        self.0.parse::<i32>().map_err(|_| self.out_of_range("i32"))
    }

    /// Narrow to `u64`
    ///
    /// # Errors
    ///
    /// Returns `Error::Range` for negative values or values above `u64::MAX`.
    pub fn to_u64(&self) -> Result<u64> {
        self.0.parse::<u64>().map_err(|_| self.out_of_range("u64"))
    }

    /// Convert a JSON number, accepting only integral values
    ///
    /// Returns `None` for numbers with a fractional part or an exponent.
    /// `-0` reads as `0`.
    pub fn from_number(number: &Number) -> Option<Self> {
        if let Some(n) = number.as_i64() {
            return Some(Self::from(n));
        }
        if let Some(n) = number.as_u64() {
            return Some(Self::from(n));
        }
        // Beyond 64 bits the literal is only available with arbitrary precision
        Self::parse(&number.to_string()).ok()
    }

    /// Convert to a JSON number without losing precision
    ///
    /// # Errors
    ///
    /// Returns `Error::Format` if the JSON number type cannot hold the literal.
    pub fn to_number(&self) -> Result<Number> {
        if let Ok(n) = self.0.parse::<i64>() {
            return Ok(Number::from(n));
        }
        if let Ok(n) = self.0.parse::<u64>() {
            return Ok(Number::from(n));
        }
        Number::from_str(&self.0)
            .map_err(|e| Error::Format(format!("id {} is not representable: {}", self.0, e)))
    }

    fn out_of_range(&self, target: &'static str) -> Error {
        Error::Range {
            value: self.0.clone(),
            target,
        }
    }
}

fn is_canonical_integer(literal: &str) -> bool {
    let digits = literal.strip_prefix('-').unwrap_or(literal);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return false;
    }
    // "-0" is the same value as "0" and has to be written that way
    !(literal.starts_with('-') && digits == "0")
}

impl FromStr for IdNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for IdNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! id_number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for IdNumber {
                fn from(n: $t) -> Self {
                    IdNumber(n.to_string())
                }
            }
        )*
    };
}

id_number_from!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128);

/// Where an id appears, which narrows what is contextually valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdContext {
    /// On a request; an absent id makes it a notification
    Request,
    /// On a successful response; the id must echo a real request id
    ResolvedResponse,
    /// On an error response; `null` or absent marks an unmatched request
    RejectedResponse,
}

/// The tri-state `id` member plus the explicit `null` marker
///
/// - `Absent`: the member is not present (notifications)
/// - `Null`: the member is present as JSON `null`
/// - `Text`: a string id
/// - `Integer`: an integral number id of any size
///
/// Only one representation is authoritative per instance; `as_string` and
/// `as_integer` derive the other one on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum IdValue {
    /// No `id` member
    #[default]
    Absent,
    /// `"id": null`
    Null,
    /// `"id": "..."`
    Text(String),
    /// `"id": 123`
    Integer(IdNumber),
}

impl IdValue {
    /// A string id
    pub fn from_string(id: impl Into<String>) -> Self {
        IdValue::Text(id.into())
    }

    /// An integral id
    pub fn from_integer(id: impl Into<IdNumber>) -> Self {
        IdValue::Integer(id.into())
    }

    /// The explicit `null` id
    pub fn null() -> Self {
        IdValue::Null
    }

    /// True if the member is missing
    pub fn is_absent(&self) -> bool {
        matches!(self, IdValue::Absent)
    }

    /// True if the member is present as `null`
    pub fn is_null(&self) -> bool {
        matches!(self, IdValue::Null)
    }

    /// True if missing or `null`: no request can be correlated with it
    pub fn is_semantically_null(&self) -> bool {
        matches!(self, IdValue::Absent | IdValue::Null)
    }

    /// Display form of the id
    ///
    /// Integers are rendered in decimal. Returns `None` for absent and null ids.
    pub fn as_string(&self) -> Option<String> {
        match self {
            IdValue::Text(s) => Some(s.clone()),
            IdValue::Integer(n) => Some(n.to_string()),
            IdValue::Absent | IdValue::Null => None,
        }
    }

    /// The id as an integer
    ///
    /// Text ids are parsed. Returns `Ok(None)` for absent and null ids.
    ///
    /// # Errors
    ///
    /// Returns `Error::Format` if a text id is not a canonical integer literal.
    pub fn as_integer(&self) -> Result<Option<IdNumber>> {
        match self {
            IdValue::Integer(n) => Ok(Some(n.clone())),
            IdValue::Text(s) => IdNumber::parse(s).map(Some),
            IdValue::Absent | IdValue::Null => Ok(None),
        }
    }

    /// The id as an `i64`
    ///
    /// # Errors
    ///
    /// `Error::Format` for non-integer text, `Error::Range` if it does not fit.
    pub fn as_long(&self) -> Result<Option<i64>> {
        self.as_integer()?.map(|n| n.to_i64()).transpose()
    }

    /// The id as an `i32`
    ///
    /// # Errors
    ///
    /// `Error::Format` for non-integer text, `Error::Range` if it does not fit.
    pub fn as_i32(&self) -> Result<Option<i32>> {
        self.as_integer()?.map(|n| n.to_i32()).transpose()
    }

    /// Whether the id is acceptable where it appears
    ///
    /// An absent id is always acceptable on a request (it is a notification)
    /// and on an error response (the request could not be matched). A
    /// successful response always answers a real request, so it must carry a
    /// string or number id.
    pub fn is_contextually_valid(&self, context: IdContext) -> bool {
        match context {
            IdContext::Request | IdContext::RejectedResponse => true,
            IdContext::ResolvedResponse => !self.is_semantically_null(),
        }
    }

    /// Wire form of the id, `None` when the member must be omitted
    ///
    /// # Errors
    ///
    /// Returns `Error::Format` if an integer id cannot be represented as a
    /// JSON number.
    pub fn to_wire(&self) -> Result<Option<Value>> {
        Ok(match self {
            IdValue::Absent => None,
            IdValue::Null => Some(Value::Null),
            IdValue::Text(s) => Some(Value::String(s.clone())),
            IdValue::Integer(n) => Some(Value::Number(n.to_number()?)),
        })
    }

    /// Read the id from an optional wire member
    ///
    /// # Errors
    ///
    /// Returns `Error::Format` for fractional numbers, booleans, arrays and
    /// objects.
    pub fn from_wire(member: Option<&Value>) -> Result<Self> {
        match member {
            None => Ok(IdValue::Absent),
            Some(Value::Null) => Ok(IdValue::Null),
            Some(Value::String(s)) => Ok(IdValue::Text(s.clone())),
            Some(Value::Number(n)) => IdNumber::from_number(n)
                .map(IdValue::Integer)
                .ok_or_else(|| Error::Format(format!("id {} is not an integer", n))),
            Some(other) => Err(Error::Format(format!(
                "id must be a string, number or null, found {}",
                crate::error::Shape::of(other)
            ))),
        }
    }
}

impl fmt::Display for IdValue {
    /// JSON-like rendering: strings quoted, numbers bare, `null`, or `absent`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdValue::Absent => write!(f, "absent"),
            IdValue::Null => write!(f, "null"),
            IdValue::Text(s) => write!(f, "\"{}\"", s),
            IdValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for IdValue {
    fn from(s: String) -> Self {
        IdValue::Text(s)
    }
}

impl From<&str> for IdValue {
    fn from(s: &str) -> Self {
        IdValue::Text(s.to_string())
    }
}

impl From<IdNumber> for IdValue {
    fn from(n: IdNumber) -> Self {
        IdValue::Integer(n)
    }
}

macro_rules! id_value_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for IdValue {
                fn from(n: $t) -> Self {
                    IdValue::Integer(IdNumber::from(n))
                }
            }
        )*
    };
}

id_value_from_integer!(i32, i64, u32, u64);

/// Narrower id constraint declared by a message type
///
/// A message type parameterized with `TextId` only accepts string ids, one
/// with `NumberId` only integral ids. Absent and `null` ids are left to the
/// contextual rules of [`IdValue::is_contextually_valid`].
pub trait IdShape:
    fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + Default + Send + Sync + 'static
{
    /// Human-readable name used in violation messages
    const NAME: &'static str;

    /// Whether a concrete id value is allowed by this shape
    fn accepts(id: &IdValue) -> bool;
}

/// Accepts string and number ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AnyId;

impl IdShape for AnyId {
    const NAME: &'static str = "string or number";

    fn accepts(_id: &IdValue) -> bool {
        true
    }
}

/// Accepts string ids only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextId;

impl IdShape for TextId {
    const NAME: &'static str = "string";

    fn accepts(id: &IdValue) -> bool {
        !matches!(id, IdValue::Integer(_))
    }
}

/// Accepts integral number ids only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NumberId;

impl IdShape for NumberId {
    const NAME: &'static str = "number";

    fn accepts(id: &IdValue) -> bool {
        !matches!(id, IdValue::Text(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_literals() {
        for ok in ["0", "7", "-7", "42", "123456789012345678901234567890"] {
            assert!(IdNumber::parse(ok).is_ok(), "{ok} should parse");
        }
        for bad in ["", "-", "-0", "007", "+5", "1.0", "1e3", " 1", "abc", "0x10"] {
            assert!(
                matches!(IdNumber::parse(bad), Err(Error::Format(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_narrowing() {
        let n = IdNumber::from(i64::MAX);
        assert_eq!(n.to_i64().unwrap(), i64::MAX);
        assert!(matches!(n.to_i32(), Err(Error::Range { target: "i32", .. })));

        let big = IdNumber::parse("9223372036854775808").unwrap();
        assert!(matches!(big.to_i64(), Err(Error::Range { .. })));
        assert_eq!(big.to_u64().unwrap(), 9_223_372_036_854_775_808);

        let negative = IdNumber::from(-1i32);
        assert!(negative.is_negative());
        assert!(negative.to_u64().is_err());
    }

    #[test]
    fn test_as_string_and_integer() {
        assert_eq!(IdValue::from(12i64).as_string().as_deref(), Some("12"));
        assert_eq!(IdValue::from("x").as_string().as_deref(), Some("x"));
        assert_eq!(IdValue::Absent.as_string(), None);

        assert_eq!(IdValue::from("-3").as_long().unwrap(), Some(-3));
        assert_eq!(IdValue::Null.as_long().unwrap(), None);
        assert!(matches!(IdValue::from("3.5").as_long(), Err(Error::Format(_))));
        assert!(matches!(
            IdValue::from(1i64 << 40).as_i32(),
            Err(Error::Range { .. })
        ));
    }

    #[test]
    fn test_semantic_null() {
        assert!(IdValue::Absent.is_absent());
        assert!(IdValue::Absent.is_semantically_null());
        assert!(!IdValue::Null.is_absent());
        assert!(IdValue::Null.is_semantically_null());
        assert!(!IdValue::from(1i64).is_semantically_null());
    }

    #[test]
    fn test_contextual_validity() {
        assert!(IdValue::Absent.is_contextually_valid(IdContext::Request));
        assert!(IdValue::Absent.is_contextually_valid(IdContext::RejectedResponse));
        assert!(IdValue::Null.is_contextually_valid(IdContext::RejectedResponse));
        assert!(!IdValue::Absent.is_contextually_valid(IdContext::ResolvedResponse));
        assert!(!IdValue::Null.is_contextually_valid(IdContext::ResolvedResponse));
        assert!(IdValue::from("a").is_contextually_valid(IdContext::ResolvedResponse));
    }

    #[test]
    fn test_wire_mapping() {
        assert_eq!(IdValue::from_wire(None).unwrap(), IdValue::Absent);
        assert_eq!(IdValue::from_wire(Some(&json!(null))).unwrap(), IdValue::Null);
        assert_eq!(IdValue::from_wire(Some(&json!(1))).unwrap(), IdValue::from(1i64));
        assert_eq!(IdValue::from_wire(Some(&json!("1"))).unwrap(), IdValue::from("1"));
        assert!(IdValue::from_wire(Some(&json!(1.5))).is_err());
        assert!(IdValue::from_wire(Some(&json!(true))).is_err());
        assert!(IdValue::from_wire(Some(&json!([1]))).is_err());

        assert_eq!(IdValue::Absent.to_wire().unwrap(), None);
        assert_eq!(IdValue::Null.to_wire().unwrap(), Some(json!(null)));
        assert_eq!(IdValue::from(7u64).to_wire().unwrap(), Some(json!(7)));
    }

    #[test]
    fn test_negative_zero_id_reads_as_zero() {
        let wire: Value = serde_json::from_str("-0").unwrap();
        let id = IdValue::from_wire(Some(&wire)).unwrap();
        assert_eq!(id, IdValue::from(0i64));
        assert_eq!(id.to_wire().unwrap(), Some(json!(0)));

        // The literal itself is not canonical
        assert!(IdNumber::parse("-0").is_err());
    }

    #[test]
    fn test_exponent_id_is_rejected() {
        for literal in ["1e2", "1E2", "1.0e3"] {
            let wire: Value = serde_json::from_str(literal).unwrap();
            let err = IdValue::from_wire(Some(&wire)).unwrap_err();
            assert!(matches!(err, Error::Format(ref message) if message.contains("not an integer")));
        }
    }

    #[test]
    fn test_big_integer_survives_wire() {
        let literal = "123456789012345678901234567890";
        let id = IdValue::from(IdNumber::parse(literal).unwrap());
        let wire = id.to_wire().unwrap().unwrap();
        assert_eq!(wire.to_string(), literal);
        assert_eq!(IdValue::from_wire(Some(&wire)).unwrap(), id);
    }

    #[test]
    fn test_id_shapes() {
        assert!(AnyId::accepts(&IdValue::from(1i64)));
        assert!(TextId::accepts(&IdValue::from("a")));
        assert!(!TextId::accepts(&IdValue::from(1i64)));
        assert!(NumberId::accepts(&IdValue::from(1i64)));
        assert!(!NumberId::accepts(&IdValue::from("a")));
        assert!(NumberId::accepts(&IdValue::Absent));
        assert!(TextId::accepts(&IdValue::Null));
    }

    #[test]
    fn test_display() {
        assert_eq!(IdValue::from("req-1").to_string(), "\"req-1\"");
        assert_eq!(IdValue::from(42i64).to_string(), "42");
        assert_eq!(IdValue::Null.to_string(), "null");
        assert_eq!(IdValue::Absent.to_string(), "absent");
    }
}
