//! Error types for jbind
//!
//! Every failure in this crate is reported as a typed value, never as a
//! silently repaired message. The taxonomy follows the kinds of mistakes a
//! caller can make when binding JSON-RPC 2.0 messages:
//!
//! - **Validation**: one or more invariant violations found while constructing
//!   or decoding a message (version mismatch, blank method, params shape,
//!   result/error exclusivity, id constraints). All violations of one object
//!   are collected, not just the first.
//! - **Format**: a value could not be parsed into the requested representation
//!   (e.g. a text id that is not a canonical integer literal).
//! - **Range**: a value parses but does not fit the requested numeric width.
//! - **ShapeMismatch**: params or a result read as the wrong structural kind.
//! - **NoSuchProperty / TypeMismatch / Construction**: misuse of the generic
//!   accessor cache and type registry.
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::{codec, Error, ViolationKind};
//! use serde_json::json;
//!
//! let wire = json!({"jsonrpc": "1.0", "method": " ", "id": 1});
//! let err = codec::decode_request::<Vec<i64>>(wire).unwrap_err();
//!
//! match err {
//!     Error::Validation(report) => {
//!         assert!(report.has(ViolationKind::VersionMismatch));
//!         assert!(report.has(ViolationKind::BlankMethod));
//!     }
//!     other => panic!("unexpected error: {other}"),
//! }
//! ```

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type for jbind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all jbind operations
///
/// Variants are grouped by who is at fault: the wire data (`Parse`,
/// `Validation`), a conversion the caller asked for (`Format`, `Range`,
/// `ShapeMismatch`, `Serialization`), or generic accessor misuse
/// (`NoSuchProperty`, `TypeMismatch`, `Construction`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The input text is not JSON at all
    #[error("Parse error: {0}")]
    Parse(String),

    /// One or more invariant violations collected from a single message
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A value could not be parsed into the requested representation
    #[error("Format error: {0}")]
    Format(String),

    /// A value parsed but does not fit the requested width
    #[error("Range error: {value} does not fit in {target}")]
    Range {
        /// Decimal form of the offending value
        value: String,
        /// Name of the requested type (e.g. `i64`)
        target: &'static str,
    },

    /// A structured value was read as the wrong kind
    #[error("Shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch {
        /// The shape the caller asked for
        expected: Shape,
        /// The shape actually present
        found: Shape,
    },

    /// The payload could not be converted by serde
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A property name that the message type does not declare
    #[error("No such property: {type_name} has no property `{property}`")]
    NoSuchProperty {
        /// Name of the message type that was asked
        type_name: String,
        /// The property that was requested
        property: String,
    },

    /// A cached accessor was applied to an instance of another type
    #[error("Type mismatch: accessor for {expected} applied to {found}")]
    TypeMismatch {
        /// The type the accessor was computed for
        expected: String,
        /// The type of the instance it was applied to
        found: String,
    },

    /// The registry has no construction path for the requested type
    #[error("Construction error: cannot construct {type_name}: {reason}")]
    Construction {
        /// Tag or name of the requested type
        type_name: String,
        /// Why construction was impossible
        reason: String,
    },

    /// Batch contains more items than the configured limit
    #[error("Batch size limit exceeded: limit={limit}, actual={actual}")]
    BatchSizeExceeded {
        /// The maximum allowed batch size
        limit: usize,
        /// The actual batch size that was rejected
        actual: usize,
    },
}

impl Error {
    /// Wrap a serde_json error raised while converting a payload
    pub(crate) fn serialization(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }

    /// Returns the validation report if this is a validation failure
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(report) => Some(report),
            _ => None,
        }
    }

    /// Returns true if this error is, or contains, a shape mismatch
    ///
    /// Decoding a request whose params have the wrong structure produces a
    /// validation report carrying a `ShapeMismatch` violation; reading params
    /// directly produces `Error::ShapeMismatch`. Both count here.
    pub fn is_shape_mismatch(&self) -> bool {
        match self {
            Error::ShapeMismatch { .. } => true,
            Error::Validation(report) => report.has(ViolationKind::ShapeMismatch),
            _ => false,
        }
    }
}

/// Structural kind of a JSON value, used in shape mismatch reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// The member is not present at all
    Absent,
    /// JSON `null`
    Null,
    /// JSON `true` / `false`
    Bool,
    /// JSON number
    Number,
    /// JSON string
    String,
    /// JSON array
    Array,
    /// JSON object
    Object,
}

impl Shape {
    /// Shape of a present JSON value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Shape::Null,
            Value::Bool(_) => Shape::Bool,
            Value::Number(_) => Shape::Number,
            Value::String(_) => Shape::String,
            Value::Array(_) => Shape::Array,
            Value::Object(_) => Shape::Object,
        }
    }

    /// Shape of an optional JSON member
    pub fn of_member(value: Option<&Value>) -> Self {
        value.map_or(Shape::Absent, Shape::of)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Absent => "absent",
            Shape::Null => "null",
            Shape::Bool => "bool",
            Shape::Number => "number",
            Shape::String => "string",
            Shape::Array => "array",
            Shape::Object => "object",
        };
        f.write_str(name)
    }
}

/// Category of a single invariant violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// `jsonrpc` is missing or not exactly `"2.0"`
    VersionMismatch,
    /// A required member is missing
    MissingField,
    /// `method` is empty or whitespace only
    BlankMethod,
    /// `params` (or another structured member) has the wrong shape
    ShapeMismatch,
    /// `id` has an unsupported form or is not allowed in this context
    InvalidId,
    /// `result` and `error` are both present, or both absent
    Exclusivity,
    /// A payload member could not be bound to its declared type
    InvalidPayload,
    /// The message itself is not a JSON object
    NotAnObject,
}

/// A single violated invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// What kind of rule was broken
    pub kind: ViolationKind,
    /// Wire name of the offending member (`""` for the whole message)
    pub field: &'static str,
    /// Human-readable detail
    pub message: String,
}

impl Violation {
    /// Create a violation for the given member
    pub fn new(kind: ViolationKind, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Every invariant violation found in one message
///
/// Validation never stops at the first problem: decoders and constructors
/// push each violation they find and only fail once the whole object has been
/// inspected, so callers can report everything that is wrong at once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a report holding exactly one violation
    pub fn single(kind: ViolationKind, field: &'static str, message: impl Into<String>) -> Self {
        let mut report = Self::new();
        report.push(kind, field, message);
        report
    }

    /// Record a violation
    pub fn push(&mut self, kind: ViolationKind, field: &'static str, message: impl Into<String>) {
        self.violations.push(Violation::new(kind, field, message));
    }

    /// Append all violations of another report
    pub fn merge(&mut self, other: ValidationError) {
        self.violations.extend(other.violations);
    }

    /// True if no violation has been recorded
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of recorded violations
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// True if at least one violation of the given kind was recorded
    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }

    /// All recorded violations, in discovery order
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consume the report, returning its violations
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    /// `Ok(value)` if the report is empty, otherwise `Err(self)`
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, ValidationError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violations.len() {
            0 => write!(f, "no violations"),
            1 => write!(f, "{}", self.violations[0]),
            n => {
                write!(f, "{} violations: ", n)?;
                for (i, violation) in self.violations.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}", violation)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_collects_all_violations() {
        let mut report = ValidationError::new();
        assert!(report.is_empty());

        report.push(ViolationKind::BlankMethod, "method", "method must not be blank");
        report.push(ViolationKind::VersionMismatch, "jsonrpc", "expected \"2.0\"");

        assert_eq!(report.len(), 2);
        assert!(report.has(ViolationKind::BlankMethod));
        assert!(report.has(ViolationKind::VersionMismatch));
        assert!(!report.has(ViolationKind::Exclusivity));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationError::new().into_result(7), Ok(7));

        let report = ValidationError::single(ViolationKind::InvalidId, "id", "bad id");
        let err = report.clone().into_result(7).unwrap_err();
        assert_eq!(err, report);
    }

    #[test]
    fn test_display_lists_every_violation() {
        let mut report = ValidationError::single(ViolationKind::MissingField, "method", "missing");
        report.push(ViolationKind::InvalidId, "id", "fractional number");

        let display = report.to_string();
        assert!(display.starts_with("2 violations"));
        assert!(display.contains("method: missing"));
        assert!(display.contains("id: fractional number"));
    }

    #[test]
    fn test_report_serializes_as_array() {
        let report = ValidationError::single(ViolationKind::Exclusivity, "", "both present");
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(
            value,
            json!([{"kind": "exclusivity", "field": "", "message": "both present"}])
        );
    }

    #[test]
    fn test_shape_of() {
        assert_eq!(Shape::of(&json!([1])), Shape::Array);
        assert_eq!(Shape::of(&json!({"a": 1})), Shape::Object);
        assert_eq!(Shape::of(&json!(null)), Shape::Null);
        assert_eq!(Shape::of_member(None), Shape::Absent);
        assert_eq!(Shape::Object.to_string(), "object");
    }

    #[test]
    fn test_is_shape_mismatch() {
        let direct = Error::ShapeMismatch {
            expected: Shape::Object,
            found: Shape::Array,
        };
        assert!(direct.is_shape_mismatch());

        let nested = Error::Validation(ValidationError::single(
            ViolationKind::ShapeMismatch,
            "params",
            "expected object",
        ));
        assert!(nested.is_shape_mismatch());

        assert!(!Error::Format("x".into()).is_shape_mismatch());
    }

    #[test]
    fn test_error_display_formatting() {
        let error = Error::Range {
            value: "4294967296".into(),
            target: "i32",
        };
        let display = error.to_string();
        assert!(display.contains("4294967296"));
        assert!(display.contains("i32"));

        let error = Error::BatchSizeExceeded { limit: 10, actual: 11 };
        assert!(error.to_string().contains("limit=10"));
    }
}
