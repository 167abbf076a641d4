//! Response messages
//!
//! A response carries exactly one of `result` and `error`. Instead of two
//! optional fields checked after the fact, [`ResponseMessage`] stores an
//! [`Outcome`], so a response with both or neither cannot exist. The only
//! place where "neither" is observable is [`ResponseBuilder`], before
//! `build()` succeeds.
//!
//! A successful response must echo a real request id. An error response may
//! carry `"id": null` (or no id) when the request id could not be read.
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::{ErrorObject, HasResultOrError, ResponseMessage, ResponseState};
//!
//! let mut response = ResponseMessage::<i64>::resolved(19, 1i64).unwrap();
//! assert_eq!(response.state(), ResponseState::Resolved);
//!
//! response.set_error_exclusively(ErrorObject::internal_error("overflow"));
//! assert_eq!(response.state(), ResponseState::Rejected);
//! assert!(response.result().is_none());
//!
//! // Both members at once is caught by the builder
//! let err = ResponseMessage::<i64>::builder()
//!     .result(1)
//!     .error(ErrorObject::internal_error("x"))
//!     .id(1i64)
//!     .build()
//!     .unwrap_err();
//! assert_eq!(err.len(), 1);
//! ```

use crate::error::{Error, Result, Shape, ValidationError, ViolationKind};
use crate::error_object::ErrorObject;
use crate::id::{AnyId, IdContext, IdShape, IdValue};
use crate::message::{
    HasId, HasResultOrError, MessageType, Property, JSONRPC_VERSION, PROPERTY_ERROR, PROPERTY_ID,
    PROPERTY_JSONRPC, PROPERTY_RESULT,
};
use crate::request::{check_id_shape, set_version};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;

const PROPERTIES: &[&str] = &[PROPERTY_JSONRPC, PROPERTY_ID, PROPERTY_RESULT, PROPERTY_ERROR];

/// What a response resolved to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Outcome<R, E = Value> {
    /// The call succeeded
    Resolved(R),
    /// The call failed
    Rejected(ErrorObject<E>),
}

impl<R, E> Outcome<R, E> {
    /// Which of the two states this is
    pub fn state(&self) -> ResponseState {
        match self {
            Outcome::Resolved(_) => ResponseState::Resolved,
            Outcome::Rejected(_) => ResponseState::Rejected,
        }
    }

    /// The result, if resolved
    pub fn result(&self) -> Option<&R> {
        match self {
            Outcome::Resolved(result) => Some(result),
            Outcome::Rejected(_) => None,
        }
    }

    /// The error, if rejected
    pub fn error(&self) -> Option<&ErrorObject<E>> {
        match self {
            Outcome::Resolved(_) => None,
            Outcome::Rejected(error) => Some(error),
        }
    }

    /// Convert into a standard result
    pub fn into_result(self) -> std::result::Result<R, ErrorObject<E>> {
        match self {
            Outcome::Resolved(result) => Ok(result),
            Outcome::Rejected(error) => Err(error),
        }
    }
}

/// Observable state of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseState {
    /// `result` present, `error` absent
    Resolved,
    /// `error` present, `result` absent
    Rejected,
}

/// A JSON-RPC 2.0 response
///
/// `R` is the result type, `E` the type of the error object's `data` and
/// `I` the accepted id shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseMessage<R, E = Value, I = AnyId> {
    outcome: Outcome<R, E>,
    id: IdValue,
    shape: PhantomData<I>,
}

impl<R, E, I: IdShape> ResponseMessage<R, E, I> {
    /// Successful response
    ///
    /// # Errors
    ///
    /// Fails if the id is absent or `null`, or rejected by `I`.
    pub fn resolved(
        result: R,
        id: impl Into<IdValue>,
    ) -> std::result::Result<Self, ValidationError> {
        Self::from_outcome(Outcome::Resolved(result), id)
    }

    /// Error response
    ///
    /// # Errors
    ///
    /// Fails if the id is rejected by `I`.
    pub fn rejected(
        error: ErrorObject<E>,
        id: impl Into<IdValue>,
    ) -> std::result::Result<Self, ValidationError> {
        Self::from_outcome(Outcome::Rejected(error), id)
    }

    /// Response from an existing outcome
    ///
    /// # Errors
    ///
    /// Fails if the id is not allowed for the outcome's state.
    pub fn from_outcome(
        outcome: Outcome<R, E>,
        id: impl Into<IdValue>,
    ) -> std::result::Result<Self, ValidationError> {
        let response = Self::assemble(outcome, id.into());
        response.validate()?;
        Ok(response)
    }

    /// Builder that checks exclusivity when it is done
    pub fn builder() -> ResponseBuilder<R, E, I> {
        ResponseBuilder::default()
    }

    /// Check every invariant of the current state
    ///
    /// # Errors
    ///
    /// All violations found, not just the first.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut report = ValidationError::new();
        check_response_id::<I>(&self.id, Some(self.state()), &mut report);
        report.into_result(())
    }
}

impl<R, E, I> ResponseMessage<R, E, I> {
    /// Build without validation; callers check invariants themselves
    pub(crate) fn assemble(outcome: Outcome<R, E>, id: IdValue) -> Self {
        Self {
            outcome,
            id,
            shape: PhantomData,
        }
    }

    /// Always `"2.0"`
    pub fn jsonrpc(&self) -> &'static str {
        JSONRPC_VERSION
    }

    /// Resolved or rejected
    pub fn state(&self) -> ResponseState {
        self.outcome.state()
    }

    /// The outcome
    pub fn outcome(&self) -> &Outcome<R, E> {
        &self.outcome
    }

    /// Take the outcome out of the response
    pub fn into_outcome(self) -> Outcome<R, E> {
        self.outcome
    }

    /// Take the result, or the error, out of the response
    pub fn into_result(self) -> std::result::Result<R, ErrorObject<E>> {
        self.outcome.into_result()
    }
}

impl<E, I> ResponseMessage<Value, E, I> {
    /// Decode the result into `T`
    ///
    /// Returns `Ok(None)` for error responses.
    ///
    /// # Errors
    ///
    /// `Error::Serialization` if the result does not decode as `T`.
    pub fn result_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.outcome
            .result()
            .map(|result| T::deserialize(result).map_err(Error::serialization))
            .transpose()
    }

    /// Decode an array result element by element
    ///
    /// # Errors
    ///
    /// `Error::ShapeMismatch` if the result is not an array;
    /// `Error::Serialization` if an element does not decode as `T`.
    pub fn result_as_array<T: DeserializeOwned>(&self) -> Result<Option<Vec<T>>> {
        match self.outcome.result() {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| T::deserialize(item).map_err(Error::serialization))
                .collect::<Result<Vec<T>>>()
                .map(Some),
            Some(other) => Err(Error::ShapeMismatch {
                expected: Shape::Array,
                found: Shape::of(other),
            }),
        }
    }

    /// Decode an object result into `T`
    ///
    /// # Errors
    ///
    /// `Error::ShapeMismatch` if the result is not an object;
    /// `Error::Serialization` if it does not decode as `T`.
    pub fn result_as_object<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.outcome.result() {
            None => Ok(None),
            Some(object @ Value::Object(_)) => {
                T::deserialize(object).map(Some).map_err(Error::serialization)
            }
            Some(other) => Err(Error::ShapeMismatch {
                expected: Shape::Object,
                found: Shape::of(other),
            }),
        }
    }
}

impl<R, I> ResponseMessage<R, Value, I> {
    /// Decode the error's `data` into `D`
    ///
    /// Returns `Ok(None)` for successful responses.
    ///
    /// # Errors
    ///
    /// `Error::Serialization` if `data` does not decode as `D`.
    pub fn error_as<D: DeserializeOwned>(&self) -> Result<Option<ErrorObject<D>>> {
        let Some(error) = self.outcome.error() else {
            return Ok(None);
        };
        let data = error
            .data
            .as_ref()
            .map(|data| D::deserialize(data).map_err(Error::serialization))
            .transpose()?;
        Ok(Some(ErrorObject::of(error.code, error.message.clone(), data)))
    }
}

impl<R, E, I> HasId for ResponseMessage<R, E, I> {
    fn id(&self) -> &IdValue {
        &self.id
    }

    fn set_id(&mut self, id: IdValue) {
        self.id = id;
    }

    fn id_context(&self) -> IdContext {
        match self.state() {
            ResponseState::Resolved => IdContext::ResolvedResponse,
            ResponseState::Rejected => IdContext::RejectedResponse,
        }
    }
}

impl<R, E, I> HasResultOrError for ResponseMessage<R, E, I> {
    type Result = R;
    type ErrorData = E;

    fn result(&self) -> Option<&R> {
        self.outcome.result()
    }

    fn error(&self) -> Option<&ErrorObject<E>> {
        self.outcome.error()
    }

    fn set_result_exclusively(&mut self, result: R) {
        self.outcome = Outcome::Resolved(result);
    }

    fn set_error_exclusively(&mut self, error: ErrorObject<E>) {
        self.outcome = Outcome::Rejected(error);
    }
}

impl<R, E, I> MessageType for ResponseMessage<R, E, I>
where
    R: Serialize + DeserializeOwned,
    E: Serialize + DeserializeOwned,
    I: IdShape,
{
    fn property_names() -> &'static [&'static str] {
        PROPERTIES
    }

    fn property(name: &str) -> Option<Property<Self>> {
        let property: Property<Self> = match name {
            PROPERTY_JSONRPC => Property {
                name: PROPERTY_JSONRPC,
                get: |_| Ok(Some(Value::from(JSONRPC_VERSION))),
                set: |_, value| set_version(value),
            },
            PROPERTY_ID => Property {
                name: PROPERTY_ID,
                get: |response| response.id.to_wire(),
                set: |response, value| {
                    response.id = IdValue::from_wire(value.as_ref())?;
                    Ok(())
                },
            },
            PROPERTY_RESULT => Property {
                name: PROPERTY_RESULT,
                get: |response| {
                    response
                        .outcome
                        .result()
                        .map(|result| serde_json::to_value(result).map_err(Error::serialization))
                        .transpose()
                },
                set: |response, value| match value {
                    Some(value) => {
                        let result = serde_json::from_value(value).map_err(Error::serialization)?;
                        response.set_result_exclusively(result);
                        Ok(())
                    }
                    None if response.has_result() => Err(cannot_clear(PROPERTY_RESULT)),
                    None => Ok(()),
                },
            },
            PROPERTY_ERROR => Property {
                name: PROPERTY_ERROR,
                get: |response| response.outcome.error().map(ErrorObject::to_wire).transpose(),
                set: |response, value| match value {
                    Some(value) => {
                        let mut report = ValidationError::new();
                        match ErrorObject::from_wire(value, &mut report) {
                            Some(error) if report.is_empty() => {
                                response.set_error_exclusively(error);
                                Ok(())
                            }
                            _ => Err(Error::Validation(report)),
                        }
                    }
                    None if response.has_error() => Err(cannot_clear(PROPERTY_ERROR)),
                    None => Ok(()),
                },
            },
            _ => return None,
        };
        Some(property)
    }

    fn encode_wire(&self) -> Result<Value> {
        let mut object = Map::new();
        object.insert(PROPERTY_JSONRPC.into(), Value::from(JSONRPC_VERSION));
        match &self.outcome {
            Outcome::Resolved(result) => {
                let result = serde_json::to_value(result).map_err(Error::serialization)?;
                object.insert(PROPERTY_RESULT.into(), result);
            }
            Outcome::Rejected(error) => {
                object.insert(PROPERTY_ERROR.into(), error.to_wire()?);
            }
        }
        if let Some(id) = self.id.to_wire()? {
            object.insert(PROPERTY_ID.into(), id);
        }
        Ok(Value::Object(object))
    }

    fn collect_violations(&self) -> ValidationError {
        let mut report = ValidationError::new();
        check_response_id::<I>(&self.id, Some(self.state()), &mut report);
        report
    }
}

/// Removing the only present member would leave neither
fn cannot_clear(field: &'static str) -> Error {
    Error::Validation(ValidationError::single(
        ViolationKind::Exclusivity,
        field,
        format!("cannot remove {}: a response needs a result or an error", field),
    ))
}

/// Record id violations for a response in the given state
///
/// `state` is `None` when exclusivity is already broken and the state is
/// unknown; only the id shape is checked then.
pub(crate) fn check_response_id<I: IdShape>(
    id: &IdValue,
    state: Option<ResponseState>,
    report: &mut ValidationError,
) {
    if state == Some(ResponseState::Resolved)
        && !id.is_contextually_valid(IdContext::ResolvedResponse)
    {
        report.push(
            ViolationKind::InvalidId,
            PROPERTY_ID,
            format!("a successful response needs a string or number id, found {}", id),
        );
    }
    check_id_shape::<I>(id, report);
}

/// Collects the members of a response before committing to a state
///
/// Until `build()` the builder may hold a result, an error, both, or neither.
/// `build()` only returns responses with exactly one of them.
#[derive(Debug, Clone)]
pub struct ResponseBuilder<R, E = Value, I = AnyId> {
    result: Option<R>,
    error: Option<ErrorObject<E>>,
    id: IdValue,
    shape: PhantomData<I>,
}

impl<R, E, I> Default for ResponseBuilder<R, E, I> {
    fn default() -> Self {
        Self {
            result: None,
            error: None,
            id: IdValue::Absent,
            shape: PhantomData,
        }
    }
}

impl<R, E, I: IdShape> ResponseBuilder<R, E, I> {
    /// Set the result
    pub fn result(mut self, result: R) -> Self {
        self.result = Some(result);
        self
    }

    /// Set the error
    pub fn error(mut self, error: ErrorObject<E>) -> Self {
        self.error = Some(error);
        self
    }

    /// Set the id
    pub fn id(mut self, id: impl Into<IdValue>) -> Self {
        self.id = id.into();
        self
    }

    /// True while neither result nor error has been set
    pub fn is_pending(&self) -> bool {
        self.result.is_none() && self.error.is_none()
    }

    /// Commit to a state
    ///
    /// # Errors
    ///
    /// A report listing every violation: both members set, neither set, or
    /// an id that is not allowed for the resulting state.
    pub fn build(self) -> std::result::Result<ResponseMessage<R, E, I>, ValidationError> {
        let mut report = ValidationError::new();
        let outcome = match (self.result, self.error) {
            (Some(result), None) => Some(Outcome::Resolved(result)),
            (None, Some(error)) => Some(Outcome::Rejected(error)),
            (Some(_), Some(_)) => {
                report.push(
                    ViolationKind::Exclusivity,
                    "",
                    "result and error are both present",
                );
                None
            }
            (None, None) => {
                report.push(
                    ViolationKind::Exclusivity,
                    "",
                    "neither result nor error is present",
                );
                None
            }
        };

        check_response_id::<I>(&self.id, outcome.as_ref().map(Outcome::state), &mut report);

        match outcome {
            Some(outcome) if report.is_empty() => Ok(ResponseMessage::assemble(outcome, self.id)),
            _ => Err(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NumberId;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_resolved_requires_real_id() {
        assert!(ResponseMessage::<i64>::resolved(1, 1i64).is_ok());

        let err = ResponseMessage::<i64>::resolved(1, IdValue::Null).unwrap_err();
        assert!(err.has(ViolationKind::InvalidId));
        assert!(ResponseMessage::<i64>::resolved(1, IdValue::Absent).is_err());
    }

    #[test]
    fn test_rejected_allows_null_and_absent_id() {
        let error = ErrorObject::<Value>::parse_error();
        let response = ResponseMessage::<i64>::rejected(error.clone(), IdValue::Null).unwrap();
        assert!(response.id().is_null());
        assert!(ResponseMessage::<i64>::rejected(error, IdValue::Absent).is_ok());
    }

    #[test]
    fn test_exclusive_transitions() {
        let mut response = ResponseMessage::<i64>::resolved(1, 5i64).unwrap();

        response.set_error_exclusively(ErrorObject::internal_error("x"));
        assert!(response.result().is_none());
        assert_eq!(response.error().unwrap().code, -32603);

        response.set_result_exclusively(2);
        assert!(response.error().is_none());
        assert_eq!(response.result(), Some(&2));
        assert!(response.is_result_and_error_exclusive());
    }

    #[test]
    fn test_builder_collects_every_violation() {
        let err = ResponseMessage::<i64, Value, NumberId>::builder()
            .id("text")
            .build()
            .unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(err.has(ViolationKind::Exclusivity));
        assert!(err.has(ViolationKind::InvalidId));

        let err = ResponseMessage::<i64>::builder()
            .result(1)
            .id(IdValue::Null)
            .build()
            .unwrap_err();
        assert!(err.has(ViolationKind::InvalidId));
    }

    #[test]
    fn test_builder_pending_state() {
        let builder = ResponseMessage::<i64>::builder();
        assert!(builder.is_pending());

        let builder = builder.error(ErrorObject::invalid_request("bad")).id(IdValue::Null);
        assert!(!builder.is_pending());
        let response = builder.build().unwrap();
        assert_eq!(response.state(), ResponseState::Rejected);
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_result_views() {
        let response = ResponseMessage::<Value>::resolved(json!([1, 2, 3]), 1i64).unwrap();
        assert_eq!(response.result_as_array::<u8>().unwrap(), Some(vec![1, 2, 3]));
        assert!(response
            .result_as_object::<Point>()
            .unwrap_err()
            .is_shape_mismatch());

        let response = ResponseMessage::<Value>::resolved(json!({"x": 1, "y": 2}), 1i64).unwrap();
        assert_eq!(
            response.result_as_object::<Point>().unwrap(),
            Some(Point { x: 1, y: 2 })
        );
        assert!(response.result_as_array::<u8>().unwrap_err().is_shape_mismatch());

        let rejected =
            ResponseMessage::<Value>::rejected(ErrorObject::internal_error("x"), 1i64).unwrap();
        assert_eq!(rejected.result_as::<Point>().unwrap(), None);
    }

    #[test]
    fn test_error_as_typed_data() {
        let error = ErrorObject::with_data(1001, "Insufficient funds", json!({"x": 1, "y": 2}));
        let response = ResponseMessage::<Value>::rejected(error, 7i64).unwrap();

        let typed = response.error_as::<Point>().unwrap().unwrap();
        assert_eq!(typed.data, Some(Point { x: 1, y: 2 }));
        assert!(response.error_as::<String>().is_err());
    }

    #[test]
    fn test_result_property_cannot_be_cleared() {
        let mut response = ResponseMessage::<i64>::resolved(1, 1i64).unwrap();
        let result = ResponseMessage::<i64>::property("result").unwrap();
        let error = ResponseMessage::<i64>::property("error").unwrap();

        let err = (result.set)(&mut response, None).unwrap_err();
        assert!(matches!(err, Error::Validation(ref r) if r.has(ViolationKind::Exclusivity)));

        // Clearing the absent member is a no-op
        (error.set)(&mut response, None).unwrap();

        (error.set)(&mut response, Some(json!({"code": -32000, "message": "busy"}))).unwrap();
        assert_eq!(response.state(), ResponseState::Rejected);
        assert_eq!((result.get)(&response).unwrap(), None);
    }

    #[test]
    fn test_encode_wire() {
        let response = ResponseMessage::<i64>::resolved(19, 1i64).unwrap();
        assert_eq!(
            response.encode_wire().unwrap(),
            json!({"jsonrpc": "2.0", "result": 19, "id": 1})
        );

        let response =
            ResponseMessage::<i64>::rejected(ErrorObject::parse_error(), IdValue::Null).unwrap();
        assert_eq!(
            response.encode_wire().unwrap(),
            json!({"jsonrpc": "2.0", "error": {"code": -32700, "message": "Parse error"}, "id": null})
        );
    }
}
