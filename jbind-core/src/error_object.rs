//! The JSON-RPC 2.0 error object
//!
//! An error response carries an object with a numeric `code`, a `message`
//! and optional `data`. This module defines that object, the well-known codes
//! and the reserved code ranges.
//!
//! # Reserved Ranges
//!
//! The protocol reserves `-32768..=-32000` for pre-defined errors and, inside
//! it, `-32099..=-32000` for implementation-defined server errors. Both
//! bounds are inclusive, and the overlap is deliberate: a server error code
//! is also a pre-defined code. Everything else is application-defined.
//! Classification is a query only; any integer is a legal code on the wire.
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::{CodeRange, ErrorObject};
//! use serde_json::Value;
//!
//! let parse = ErrorObject::<Value>::parse_error();
//! assert_eq!(parse.code, -32700);
//! assert!(parse.is_predefined_range());
//!
//! let server = ErrorObject::<Value>::new(-32001, "Database unavailable");
//! assert!(server.is_predefined_range());
//! assert!(server.is_implementation_defined_server_range());
//! assert_eq!(server.code_range(), CodeRange::ImplementationDefinedServer);
//!
//! let app = ErrorObject::with_data(1001, "Insufficient funds", 50);
//! assert_eq!(app.code_range(), CodeRange::Application);
//! ```

use crate::error::{Error, Shape, ValidationError, ViolationKind};
use crate::message::PROPERTY_PARAMS;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::ops::RangeInclusive;

/// Invalid JSON was received
pub const CODE_PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid request object
pub const CODE_INVALID_REQUEST: i64 = -32600;
/// The method does not exist or is not available
pub const CODE_METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters
pub const CODE_INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error
pub const CODE_INTERNAL_ERROR: i64 = -32603;

/// Codes reserved for pre-defined errors
pub const PREDEFINED_RANGE: RangeInclusive<i64> = -32768..=-32000;
/// Codes reserved for implementation-defined server errors
pub const SERVER_ERROR_RANGE: RangeInclusive<i64> = -32099..=-32000;

/// Wire names of the error object members
pub const PROPERTY_CODE: &str = "code";
/// See [`PROPERTY_CODE`]
pub const PROPERTY_MESSAGE: &str = "message";
/// See [`PROPERTY_CODE`]
pub const PROPERTY_DATA: &str = "data";

/// The most specific reserved band a code falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeRange {
    /// `-32099..=-32000`
    ImplementationDefinedServer,
    /// The rest of `-32768..=-32000`
    Predefined,
    /// Anything outside the reserved range
    Application,
}

impl CodeRange {
    /// Classify a code
    pub fn of(code: i64) -> Self {
        if SERVER_ERROR_RANGE.contains(&code) {
            CodeRange::ImplementationDefinedServer
        } else if PREDEFINED_RANGE.contains(&code) {
            CodeRange::Predefined
        } else {
            CodeRange::Application
        }
    }
}

/// A JSON-RPC 2.0 error object
///
/// `message` is always present on the wire; a missing message decodes as the
/// empty string. `data` is opaque to this crate and is bound to `D` with
/// serde, so any validation `D` performs while deserializing applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ErrorObject<D = Value> {
    /// Numeric error code
    pub code: i64,
    /// Short description of the error
    pub message: String,
    /// Additional information about the error
    pub data: Option<D>,
}

impl<D> ErrorObject<D> {
    /// Create an error object from all three members
    pub fn of(code: i64, message: impl Into<String>, data: Option<D>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    /// Create an error object without data
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self::of(code, message, None)
    }

    /// Create an error object with data
    pub fn with_data(code: i64, message: impl Into<String>, data: D) -> Self {
        Self::of(code, message, Some(data))
    }

    /// Parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(CODE_PARSE_ERROR, "Parse error")
    }

    /// Invalid request (-32600)
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(CODE_INVALID_REQUEST, message)
    }

    /// Method not found (-32601)
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            CODE_METHOD_NOT_FOUND,
            format!("Method not found: {}", method.into()),
        )
    }

    /// Invalid params (-32602)
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(CODE_INVALID_PARAMS, message)
    }

    /// Internal error (-32603)
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(CODE_INTERNAL_ERROR, message)
    }

    /// Implementation-defined server error
    ///
    /// `code` is not checked against [`SERVER_ERROR_RANGE`].
    pub fn server_error(code: i64, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    /// True if the code is within `-32768..=-32000`
    pub fn is_predefined_range(&self) -> bool {
        PREDEFINED_RANGE.contains(&self.code)
    }

    /// True if the code is within `-32099..=-32000`
    pub fn is_implementation_defined_server_range(&self) -> bool {
        SERVER_ERROR_RANGE.contains(&self.code)
    }

    /// The most specific band of the code
    pub fn code_range(&self) -> CodeRange {
        CodeRange::of(self.code)
    }

    /// Replace the data type, keeping code and message
    pub fn map_data<F, T>(self, f: F) -> ErrorObject<T>
    where
        F: FnOnce(D) -> T,
    {
        ErrorObject {
            code: self.code,
            message: self.message,
            data: self.data.map(f),
        }
    }
}

impl<D: Serialize> ErrorObject<D> {
    /// Wire form of the error object
    ///
    /// # Errors
    ///
    /// `Error::Serialization` if `data` cannot be serialized.
    pub fn to_wire(&self) -> crate::Result<Value> {
        let mut object = Map::new();
        object.insert(PROPERTY_CODE.into(), Value::from(self.code));
        object.insert(PROPERTY_MESSAGE.into(), Value::String(self.message.clone()));
        if let Some(data) = &self.data {
            let data = serde_json::to_value(data).map_err(Error::serialization)?;
            object.insert(PROPERTY_DATA.into(), data);
        }
        Ok(Value::Object(object))
    }

    /// The same error with `data` converted to a generic JSON value
    ///
    /// # Errors
    ///
    /// `Error::Serialization` if `data` cannot be serialized.
    pub fn to_generic(&self) -> crate::Result<ErrorObject<Value>> {
        let data = self
            .data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(Error::serialization)?;
        Ok(ErrorObject::of(self.code, self.message.clone(), data))
    }
}

impl<D: DeserializeOwned> ErrorObject<D> {
    /// Read an error object, recording every problem in `report`
    ///
    /// Returns `None` when the object cannot be bound at all; the reasons
    /// are in `report`. Unknown members are ignored.
    pub(crate) fn from_wire(value: Value, report: &mut ValidationError) -> Option<Self> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                report.push(
                    ViolationKind::InvalidPayload,
                    "error",
                    format!("error must be an object, found {}", Shape::of(&other)),
                );
                return None;
            }
        };

        let code = match object.remove(PROPERTY_CODE) {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(code) => Some(code),
                None => {
                    report.push(
                        ViolationKind::InvalidPayload,
                        "error",
                        format!("error code {} is not a 64-bit integer", n),
                    );
                    None
                }
            },
            Some(other) => {
                report.push(
                    ViolationKind::InvalidPayload,
                    "error",
                    format!("error code must be a number, found {}", Shape::of(&other)),
                );
                None
            }
            None => {
                report.push(ViolationKind::MissingField, "error", "error code is required");
                None
            }
        };

        let message = match object.remove(PROPERTY_MESSAGE) {
            Some(Value::String(message)) => message,
            None => String::new(),
            Some(other) => {
                report.push(
                    ViolationKind::InvalidPayload,
                    "error",
                    format!("error message must be a string, found {}", Shape::of(&other)),
                );
                String::new()
            }
        };

        let data = match object.remove(PROPERTY_DATA).map(serde_json::from_value::<D>) {
            None => None,
            Some(Ok(data)) => Some(data),
            Some(Err(e)) => {
                report.push(
                    ViolationKind::InvalidPayload,
                    "error",
                    format!("error data does not bind: {}", e),
                );
                return None;
            }
        };

        code.map(|code| Self::of(code, message, data))
    }
}

impl<D> fmt::Display for ErrorObject<D> {
    /// Formats as "[code] message"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl<D: fmt::Debug> std::error::Error for ErrorObject<D> {}

impl From<&Error> for ErrorObject<Value> {
    /// Map a binding failure to the error object a peer should receive
    ///
    /// Validation failures become "Invalid Request" with the violations as
    /// `data`, or "Invalid params" when only the params were at fault;
    /// conversion failures become "Invalid params"; accessor and registry
    /// misuse is an internal error.
    fn from(err: &Error) -> Self {
        match err {
            Error::Parse(_) => Self::parse_error(),
            Error::Validation(report) => {
                let data = serde_json::to_value(report).ok();
                let params_only = !report.is_empty()
                    && report.violations().iter().all(|v| v.field == PROPERTY_PARAMS);
                if params_only {
                    Self::of(CODE_INVALID_PARAMS, "Invalid params", data)
                } else {
                    Self::of(CODE_INVALID_REQUEST, "Invalid Request", data)
                }
            }
            Error::BatchSizeExceeded { .. } => Self::invalid_request(err.to_string()),
            Error::Format(_)
            | Error::Range { .. }
            | Error::ShapeMismatch { .. }
            | Error::Serialization(_) => Self::invalid_params(err.to_string()),
            Error::NoSuchProperty { .. }
            | Error::TypeMismatch { .. }
            | Error::Construction { .. } => Self::internal_error(err.to_string()),
        }
    }
}

impl From<Error> for ErrorObject<Value> {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}
