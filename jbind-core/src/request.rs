//! Request and notification messages
//!
//! A [`RequestMessage`] is `{jsonrpc, method, params, id}`. Whether it is a
//! notification is not a separate type: a request without an `id` member is
//! a notification and expects no response.
//!
//! The params type `P` fixes the parameter structure (see
//! [`Params`](crate::Params)) and the id shape `I` optionally narrows the
//! accepted ids.
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::{HasMethodAndParams, RequestMessage};
//!
//! let request = RequestMessage::<Vec<i64>>::new("subtract", Some(vec![42, 23]), 1i64).unwrap();
//! assert_eq!(request.method(), "subtract");
//! assert!(!request.is_notification());
//!
//! let update = RequestMessage::<Vec<i64>>::notification("update", Some(vec![1, 2, 3])).unwrap();
//! assert!(update.is_notification());
//!
//! // A blank method never makes it past construction
//! assert!(RequestMessage::<Vec<i64>>::new("  ", None, 1i64).is_err());
//! ```

use crate::error::{Error, Result, Shape, ValidationError, ViolationKind};
use crate::error_object::ErrorObject;
use crate::id::{AnyId, IdContext, IdShape, IdValue};
use crate::message::{
    HasId, HasMethodAndParams, MessageType, Property, JSONRPC_VERSION, PROPERTY_ID,
    PROPERTY_JSONRPC, PROPERTY_METHOD, PROPERTY_PARAMS,
};
use crate::params::{Params, ParamsValue};
use crate::response::ResponseMessage;
use serde_json::{Map, Value};
use std::marker::PhantomData;

const PROPERTIES: &[&str] = &[PROPERTY_JSONRPC, PROPERTY_ID, PROPERTY_METHOD, PROPERTY_PARAMS];

/// A JSON-RPC 2.0 request or notification
///
/// Equality and hashing are structural over method, params and id; the
/// `jsonrpc` member is always `"2.0"` and is not stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestMessage<P, I = AnyId> {
    method: String,
    params: Option<P>,
    id: IdValue,
    shape: PhantomData<I>,
}

impl<P: Params, I: IdShape> RequestMessage<P, I> {
    /// Create a request
    ///
    /// # Errors
    ///
    /// A report listing every violation: a blank method, params that do not
    /// encode as the declared structure, or an id rejected by `I`.
    pub fn new(
        method: impl Into<String>,
        params: Option<P>,
        id: impl Into<IdValue>,
    ) -> std::result::Result<Self, ValidationError> {
        let request = Self::assemble(method.into(), params, id.into());
        request.validate()?;
        Ok(request)
    }

    /// Create a notification (a request without an id)
    ///
    /// # Errors
    ///
    /// Same as [`RequestMessage::new`].
    pub fn notification(
        method: impl Into<String>,
        params: Option<P>,
    ) -> std::result::Result<Self, ValidationError> {
        Self::new(method, params, IdValue::Absent)
    }

    /// Check every invariant of the current state
    ///
    /// # Errors
    ///
    /// All violations found, not just the first.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.collect_violations().into_result(())
    }

    /// Untyped view of the params
    ///
    /// # Errors
    ///
    /// Whatever `P::to_params` reports.
    pub fn params_value(&self) -> Result<ParamsValue> {
        match &self.params {
            Some(params) => params.to_params(),
            None => Ok(ParamsValue::Absent),
        }
    }
}

impl<P, I> RequestMessage<P, I> {
    /// Build without validation; callers check invariants themselves
    pub(crate) fn assemble(method: String, params: Option<P>, id: IdValue) -> Self {
        Self {
            method,
            params,
            id,
            shape: PhantomData,
        }
    }

    /// Always `"2.0"`
    pub fn jsonrpc(&self) -> &'static str {
        JSONRPC_VERSION
    }

    /// Take the params out of the request
    pub fn into_params(self) -> Option<P> {
        self.params
    }

    /// Successful response to this request, echoing its id
    ///
    /// # Errors
    ///
    /// Fails for notifications: a successful response needs an id.
    pub fn respond_ok<R>(
        &self,
        result: R,
    ) -> std::result::Result<ResponseMessage<R, Value, I>, ValidationError>
    where
        I: IdShape,
    {
        ResponseMessage::resolved(result, self.id.clone())
    }

    /// Error response to this request, echoing its id
    ///
    /// # Errors
    ///
    /// Fails only if the id is rejected by `I`.
    pub fn respond_err<R, E>(
        &self,
        error: ErrorObject<E>,
    ) -> std::result::Result<ResponseMessage<R, E, I>, ValidationError>
    where
        I: IdShape,
    {
        ResponseMessage::rejected(error, self.id.clone())
    }
}

impl<P, I> HasId for RequestMessage<P, I> {
    fn id(&self) -> &IdValue {
        &self.id
    }

    fn set_id(&mut self, id: IdValue) {
        self.id = id;
    }

    fn id_context(&self) -> IdContext {
        IdContext::Request
    }
}

impl<P, I> HasMethodAndParams for RequestMessage<P, I> {
    type Params = P;

    fn method(&self) -> &str {
        &self.method
    }

    fn set_method(&mut self, method: String) {
        self.method = method;
    }

    fn params(&self) -> Option<&P> {
        self.params.as_ref()
    }

    fn set_params(&mut self, params: Option<P>) {
        self.params = params;
    }
}

impl<P: Params, I: IdShape> MessageType for RequestMessage<P, I> {
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
                get: |request| request.id.to_wire(),
                set: |request, value| {
                    request.id = IdValue::from_wire(value.as_ref())?;
                    Ok(())
                },
            },
            PROPERTY_METHOD => Property {
                name: PROPERTY_METHOD,
                get: |request| Ok(Some(Value::String(request.method.clone()))),
                set: |request, value| match value {
                    Some(Value::String(method)) => {
                        request.method = method;
                        Ok(())
                    }
                    other => Err(Error::ShapeMismatch {
                        expected: Shape::String,
                        found: Shape::of_member(other.as_ref()),
                    }),
                },
            },
            PROPERTY_PARAMS => Property {
                name: PROPERTY_PARAMS,
                get: |request| Ok(request.params_value()?.to_wire()),
                set: |request, value| {
                    request.params = match ParamsValue::from_wire(value)? {
                        ParamsValue::Absent => None,
                        present => Some(P::from_params(present)?),
                    };
                    Ok(())
                },
            },
            _ => return None,
        };
        Some(property)
    }

    fn encode_wire(&self) -> Result<Value> {
        let mut object = Map::new();
        object.insert(PROPERTY_JSONRPC.into(), Value::from(JSONRPC_VERSION));
        object.insert(PROPERTY_METHOD.into(), Value::String(self.method.clone()));
        if let Some(params) = self.params_value()?.to_wire() {
            object.insert(PROPERTY_PARAMS.into(), params);
        }
        if let Some(id) = self.id.to_wire()? {
            object.insert(PROPERTY_ID.into(), id);
        }
        Ok(Value::Object(object))
    }

    fn collect_violations(&self) -> ValidationError {
        let mut report = ValidationError::new();

        if self.method.trim().is_empty() {
            report.push(
                ViolationKind::BlankMethod,
                PROPERTY_METHOD,
                "method must not be blank",
            );
        }

        if let Some(params) = &self.params {
            match params.to_params() {
                Ok(value) if value.kind() == Some(P::KIND) => {}
                Ok(value) => report.push(
                    ViolationKind::ShapeMismatch,
                    PROPERTY_PARAMS,
                    format!("expected {} params, found {}", P::KIND, value.shape()),
                ),
                Err(e) if e.is_shape_mismatch() => {
                    report.push(ViolationKind::ShapeMismatch, PROPERTY_PARAMS, e.to_string())
                }
                Err(e) => report.push(ViolationKind::InvalidPayload, PROPERTY_PARAMS, e.to_string()),
            }
        }

        check_id_shape::<I>(&self.id, &mut report);
        report
    }
}

/// The `jsonrpc` member is fixed; only `"2.0"` may be written
pub(crate) fn set_version(value: Option<Value>) -> Result<()> {
    match value {
        Some(Value::String(version)) if version == JSONRPC_VERSION => Ok(()),
        other => Err(Error::Format(format!(
            "jsonrpc must be \"{}\", got {}",
            JSONRPC_VERSION,
            other.map_or_else(|| "nothing".to_string(), |v| v.to_string())
        ))),
    }
}

/// Record an id the message's id shape does not accept
pub(crate) fn check_id_shape<I: IdShape>(id: &IdValue, report: &mut ValidationError) {
    if !I::accepts(id) {
        report.push(
            ViolationKind::InvalidId,
            PROPERTY_ID,
            format!("id must be a {}, found {}", I::NAME, id),
        );
    }
}
