//! Conversion between wire JSON and typed messages
//!
//! This module is the only place where untyped JSON becomes a typed message
//! and back. Parsing JSON text itself is left to `serde_json`; everything
//! here works on [`serde_json::Value`].
//!
//! # Why a Codec Module?
//!
//! Plain `#[derive(Deserialize)]` would accept far too much: a missing
//! `jsonrpc`, a `null` params member, both `result` and `error`, a fractional
//! id. The decoders in this module check every protocol rule, collect every
//! violation of one message into a single [`ValidationError`], and only then
//! fail. Nothing is repaired silently.
//!
//! # Decoding Rules
//!
//! - `jsonrpc` must be exactly the string `"2.0"`
//! - `method` must be a non-blank string
//! - `params`, when present, must be an array or object matching the
//!   request's declared structure (`null` is rejected)
//! - `id` must be a string, an integral number or `null`
//! - a response has exactly one of `result` and `error`; a `result` member
//!   that is `null` still counts as present
//! - a successful response must carry a string or number id
//!
//! # Batches
//!
//! A batch is a JSON array of messages. [`decode_batch`] decodes each item on
//! its own and keeps going past failures, so callers can answer the valid
//! items and report the invalid ones. An empty batch is itself invalid.
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::{codec, HasMethodAndParams, HasId};
//! use serde_json::json;
//!
//! let wire = json!({"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 1});
//! let request = codec::decode_request::<Vec<i64>>(wire.clone()).unwrap();
//!
//! assert_eq!(request.method(), "subtract");
//! assert_eq!(request.params(), Some(&vec![42, 23]));
//! assert_eq!(request.id_as_long().unwrap(), Some(1));
//!
//! assert_eq!(codec::encode(&request).unwrap(), wire);
//! ```

use crate::error::{Error, Result, Shape, ValidationError, ViolationKind};
use crate::error_object::ErrorObject;
use crate::id::{IdShape, IdValue};
use crate::message::{
    MessageType, JSONRPC_VERSION, PROPERTY_ERROR, PROPERTY_ID, PROPERTY_JSONRPC,
    PROPERTY_METHOD, PROPERTY_PARAMS, PROPERTY_RESULT,
};
use crate::metrics::CodecMetrics;
use crate::params::{Params, ParamsValue};
use crate::request::{check_id_shape, RequestMessage};
use crate::response::{check_response_id, Outcome, ResponseMessage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Types that can be read from a wire value
///
/// Implemented by the message types of this crate. Implementations must
/// check every protocol rule and report all violations at once.
pub trait Decode: Sized {
    /// Decode and validate a wire value
    ///
    /// # Errors
    ///
    /// `Error::Validation` listing every violated rule, or `Error::Format` if
    /// a value is not representable.
    fn decode_wire(value: Value) -> Result<Self>;
}

/// Rough kind of an untyped wire value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Has `method` and `id`
    Request,
    /// Has `method` but no `id`
    Notification,
    /// Has `result` or `error`
    Response,
    /// An array with the given number of items
    Batch(usize),
    /// None of the above
    Invalid,
}

impl MessageKind {
    /// Lower-case name, used as a metric attribute
    pub fn label(&self) -> &'static str {
        match self {
            MessageKind::Request => "request",
            MessageKind::Notification => "notification",
            MessageKind::Response => "response",
            MessageKind::Batch(_) => "batch",
            MessageKind::Invalid => "invalid",
        }
    }
}

/// Classify a wire value without validating it
///
/// Only the presence of members is inspected; a value classified as a
/// request can still fail to decode.
///
/// # Examples
///
/// ```rust
/// use jbind_core::codec::{classify, MessageKind};
/// use serde_json::json;
///
/// assert_eq!(classify(&json!({"jsonrpc": "2.0", "method": "a", "id": 1})), MessageKind::Request);
/// assert_eq!(classify(&json!({"jsonrpc": "2.0", "method": "a"})), MessageKind::Notification);
/// assert_eq!(classify(&json!({"jsonrpc": "2.0", "result": 1, "id": 1})), MessageKind::Response);
/// assert_eq!(classify(&json!([1, 2])), MessageKind::Batch(2));
/// assert_eq!(classify(&json!(42)), MessageKind::Invalid);
/// ```
pub fn classify(value: &Value) -> MessageKind {
    match value {
        Value::Array(items) => MessageKind::Batch(items.len()),
        Value::Object(object) if object.contains_key(PROPERTY_METHOD) => {
            if object.contains_key(PROPERTY_ID) {
                MessageKind::Request
            } else {
                MessageKind::Notification
            }
        }
        Value::Object(object)
            if object.contains_key(PROPERTY_RESULT) || object.contains_key(PROPERTY_ERROR) =>
        {
            MessageKind::Response
        }
        _ => MessageKind::Invalid,
    }
}

/// Decode any message type
///
/// # Errors
///
/// See [`Decode::decode_wire`].
pub fn decode<M: Decode>(value: Value) -> Result<M> {
    let kind = classify(&value).label();
    match M::decode_wire(value) {
        Ok(message) => {
            CodecMetrics::global().record_decoded(kind);
            Ok(message)
        }
        Err(e) => {
            let violations = e.as_validation().map_or(1, ValidationError::len);
            tracing::debug!(kind, violations, error = %e, "rejected wire message");
            CodecMetrics::global().record_rejected(kind, violations);
            Err(e)
        }
    }
}

/// Decode a request whose params bind to `P`
///
/// # Errors
///
/// `Error::Validation` listing every violated rule.
pub fn decode_request<P: Params>(value: Value) -> Result<RequestMessage<P>> {
    decode(value)
}

/// Decode a response whose result binds to `R`
///
/// # Errors
///
/// `Error::Validation` listing every violated rule.
pub fn decode_response<R: DeserializeOwned>(value: Value) -> Result<ResponseMessage<R>> {
    decode(value)
}

/// Validate a message and produce its wire form
///
/// Absent members are omitted; an explicit `null` id is written as `null`.
///
/// # Errors
///
/// `Error::Validation` if the message currently violates an invariant;
/// `Error::Serialization` if a payload cannot be serialized.
pub fn encode<M: MessageType>(message: &M) -> Result<Value> {
    message.collect_violations().into_result(())?;
    message.encode_wire()
}

/// Parse JSON text and decode it
///
/// # Errors
///
/// `Error::Parse` if the text is not JSON, otherwise as [`decode`].
pub fn from_str<M: Decode>(text: &str) -> Result<M> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;
    decode(value)
}

/// Encode a message as JSON text
///
/// # Errors
///
/// As [`encode`].
pub fn to_string<M: MessageType>(message: &M) -> Result<String> {
    serde_json::to_string(&encode(message)?).map_err(Error::serialization)
}

/// Codec settings
///
/// # Examples
///
/// ```rust
/// use jbind_core::CodecConfig;
///
/// let unlimited = CodecConfig::default();
/// assert_eq!(unlimited.max_batch_size, None);
///
/// let limited = CodecConfig::new().with_max_batch_size(100);
/// assert_eq!(limited.max_batch_size, Some(100));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecConfig {
    /// Largest accepted batch, `None` for no limit
    pub max_batch_size: Option<usize>,
}

impl CodecConfig {
    /// Settings without limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject batches with more than `limit` items
    pub fn with_max_batch_size(mut self, limit: usize) -> Self {
        self.max_batch_size = Some(limit);
        self
    }

    /// Accept batches of any size
    pub fn without_batch_limit(mut self) -> Self {
        self.max_batch_size = None;
        self
    }
}

/// Per-item outcome of a batch decode, in input order
#[derive(Debug)]
pub struct BatchDecoded<M> {
    items: Vec<Result<M>>,
}

impl<M> BatchDecoded<M> {
    /// Every item's result, in input order
    pub fn items(&self) -> &[Result<M>] {
        &self.items
    }

    /// Number of items in the batch
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a decoded batch
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The items that decoded, with their positions
    pub fn successes(&self) -> impl Iterator<Item = (usize, &M)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_ref().ok().map(|m| (i, m)))
    }

    /// The items that failed, with their positions
    pub fn failures(&self) -> impl Iterator<Item = (usize, &Error)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_ref().err().map(|e| (i, e)))
    }

    /// True if every item decoded
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|item| item.is_ok())
    }

    /// Split into decoded messages and positioned failures
    pub fn into_parts(self) -> (Vec<M>, Vec<(usize, Error)>) {
        let mut messages = Vec::new();
        let mut failures = Vec::new();
        for (i, item) in self.items.into_iter().enumerate() {
            match item {
                Ok(message) => messages.push(message),
                Err(e) => failures.push((i, e)),
            }
        }
        (messages, failures)
    }

    /// Every item's result, in input order
    pub fn into_items(self) -> Vec<Result<M>> {
        self.items
    }
}

/// Decode a batch without a size limit
///
/// # Errors
///
/// `Error::Validation` if the value is not an array or is empty. Failures of
/// individual items are reported per item, not here.
pub fn decode_batch<M: Decode>(value: Value) -> Result<BatchDecoded<M>> {
    decode_batch_with(value, &CodecConfig::default())
}

/// Decode a batch with the given settings
///
/// # Errors
///
/// `Error::Validation` if the value is not an array or is empty;
/// `Error::BatchSizeExceeded` if it has more items than allowed.
pub fn decode_batch_with<M: Decode>(value: Value, config: &CodecConfig) -> Result<BatchDecoded<M>> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ValidationError::single(
                ViolationKind::InvalidPayload,
                "",
                format!("batch must be an array, found {}", Shape::of(&other)),
            )
            .into())
        }
    };

    if items.is_empty() {
        return Err(
            ValidationError::single(ViolationKind::InvalidPayload, "", "batch is empty").into(),
        );
    }

    if let Some(limit) = config.max_batch_size {
        if items.len() > limit {
            tracing::warn!(limit, actual = items.len(), "batch size limit exceeded");
            return Err(Error::BatchSizeExceeded {
                limit,
                actual: items.len(),
            });
        }
    }

    CodecMetrics::global().record_batch(items.len());
    let items = items.into_iter().map(decode::<M>).collect();
    Ok(BatchDecoded { items })
}

/// Encode a batch of messages as a JSON array
///
/// # Errors
///
/// The first encoding error, or `Error::Validation` if `messages` is empty.
pub fn encode_batch<M: MessageType>(messages: &[M]) -> Result<Value> {
    if messages.is_empty() {
        return Err(
            ValidationError::single(ViolationKind::InvalidPayload, "", "batch is empty").into(),
        );
    }
    messages
        .iter()
        .map(encode)
        .collect::<Result<Vec<Value>>>()
        .map(Value::Array)
}

fn take_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(ValidationError::single(
            ViolationKind::NotAnObject,
            "",
            format!("message must be an object, found {}", Shape::of(&other)),
        )
        .into()),
    }
}

fn check_version(object: &Map<String, Value>, report: &mut ValidationError) {
    match object.get(PROPERTY_JSONRPC) {
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        Some(other) => report.push(
            ViolationKind::VersionMismatch,
            PROPERTY_JSONRPC,
            format!("expected \"{}\", found {}", JSONRPC_VERSION, other),
        ),
        None => report.push(
            ViolationKind::VersionMismatch,
            PROPERTY_JSONRPC,
            format!("missing; expected \"{}\"", JSONRPC_VERSION),
        ),
    }
}

/// `None` once the id has been reported as unreadable
fn read_id(object: &Map<String, Value>, report: &mut ValidationError) -> Option<IdValue> {
    match IdValue::from_wire(object.get(PROPERTY_ID)) {
        Ok(id) => Some(id),
        Err(e) => {
            report.push(ViolationKind::InvalidId, PROPERTY_ID, e.to_string());
            None
        }
    }
}

fn read_method(object: &mut Map<String, Value>, report: &mut ValidationError) -> Option<String> {
    match object.remove(PROPERTY_METHOD) {
        Some(Value::String(method)) if method.trim().is_empty() => {
            report.push(
                ViolationKind::BlankMethod,
                PROPERTY_METHOD,
                "method must not be blank",
            );
            None
        }
        Some(Value::String(method)) => Some(method),
        Some(other) => {
            report.push(
                ViolationKind::InvalidPayload,
                PROPERTY_METHOD,
                format!("method must be a string, found {}", Shape::of(&other)),
            );
            None
        }
        None => {
            report.push(ViolationKind::MissingField, PROPERTY_METHOD, "method is required");
            None
        }
    }
}

fn read_params<P: Params>(object: &mut Map<String, Value>, report: &mut ValidationError) -> Option<P> {
    let value = match ParamsValue::from_wire(object.remove(PROPERTY_PARAMS)) {
        Ok(ParamsValue::Absent) => return None,
        Ok(value) => value,
        Err(e) => {
            report.push(ViolationKind::ShapeMismatch, PROPERTY_PARAMS, e.to_string());
            return None;
        }
    };

    if value.kind() != Some(P::KIND) {
        report.push(
            ViolationKind::ShapeMismatch,
            PROPERTY_PARAMS,
            format!("expected {} params, found {}", P::KIND, value.shape()),
        );
        return None;
    }

    match P::from_params(value) {
        Ok(params) => Some(params),
        Err(e) if e.is_shape_mismatch() => {
            report.push(ViolationKind::ShapeMismatch, PROPERTY_PARAMS, e.to_string());
            None
        }
        Err(e) => {
            report.push(ViolationKind::InvalidPayload, PROPERTY_PARAMS, e.to_string());
            None
        }
    }
}

impl<P: Params, I: IdShape> Decode for RequestMessage<P, I> {
    fn decode_wire(value: Value) -> Result<Self> {
        let mut object = take_object(value)?;
        let mut report = ValidationError::new();

        check_version(&object, &mut report);
        let id = read_id(&object, &mut report);
        let method = read_method(&mut object, &mut report);
        let params = read_params::<P>(&mut object, &mut report);
        if let Some(id) = &id {
            check_id_shape::<I>(id, &mut report);
        }

        match (method, id) {
            (Some(method), Some(id)) if report.is_empty() => {
                Ok(RequestMessage::assemble(method, params, id))
            }
            _ => Err(report.into()),
        }
    }
}

impl<R, E, I> Decode for ResponseMessage<R, E, I>
where
    R: DeserializeOwned,
    E: DeserializeOwned,
    I: IdShape,
{
    fn decode_wire(value: Value) -> Result<Self> {
        let mut object = take_object(value)?;
        let mut report = ValidationError::new();

        check_version(&object, &mut report);
        let id = read_id(&object, &mut report);

        let outcome = match (object.remove(PROPERTY_RESULT), object.remove(PROPERTY_ERROR)) {
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
            (Some(result), None) => match serde_json::from_value::<R>(result) {
                Ok(result) => Some(Outcome::Resolved(result)),
                Err(e) => {
                    report.push(
                        ViolationKind::InvalidPayload,
                        PROPERTY_RESULT,
                        format!("result does not bind: {}", e),
                    );
                    None
                }
            },
            (None, Some(error)) => ErrorObject::<E>::from_wire(error, &mut report).map(Outcome::Rejected),
        };

        if let Some(id) = &id {
            check_response_id::<I>(id, outcome.as_ref().map(Outcome::state), &mut report);
        }

        match (outcome, id) {
            (Some(outcome), Some(id)) if report.is_empty() => {
                Ok(ResponseMessage::assemble(outcome, id))
            }
            _ => Err(report.into()),
        }
    }
}

impl<P: Params, I: IdShape> Serialize for RequestMessage<P, I> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        encode(self)
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl<'de, P: Params, I: IdShape> Deserialize<'de> for RequestMessage<P, I> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode_wire(value).map_err(serde::de::Error::custom)
    }
}

impl<R, E, I> Serialize for ResponseMessage<R, E, I>
where
    R: Serialize + DeserializeOwned,
    E: Serialize + DeserializeOwned,
    I: IdShape,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        encode(self)
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl<'de, R, E, I> Deserialize<'de> for ResponseMessage<R, E, I>
where
    R: DeserializeOwned,
    E: DeserializeOwned,
    I: IdShape,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode_wire(value).map_err(serde::de::Error::custom)
    }
}
