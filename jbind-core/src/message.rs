//! Capability traits shared by all message kinds
//!
//! Requests and responses are flat structs. What they have in common is
//! expressed as small traits instead of a type hierarchy:
//!
//! - [`HasId`]: the `id` member and its conversions
//! - [`HasMethodAndParams`]: `method` and `params` on requests
//! - [`HasResultOrError`]: the exclusive `result` / `error` pair on responses
//!
//! Generic code that has to work on messages whose concrete type is only
//! known at runtime (equality, string form, the registry) goes through the
//! object-safe [`Message`] trait. Concrete types opt in by implementing
//! [`MessageType`], which declares their wire properties; [`Message`] then
//! comes for free.
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::{HasId, IdValue, Message, RequestMessage};
//! use serde_json::json;
//!
//! let mut request = RequestMessage::<Vec<i64>>::new("sum", Some(vec![1, 2]), 7i64).unwrap();
//! assert_eq!(request.id_as_long().unwrap(), Some(7));
//!
//! request.set_id_as_string("req-7");
//! assert_eq!(request.id(), &IdValue::from("req-7"));
//!
//! let message: &dyn Message = &request;
//! assert_eq!(message.declared_properties(), &["jsonrpc", "id", "method", "params"]);
//! assert_eq!(message.to_value().unwrap()["id"], json!("req-7"));
//! ```

use crate::accessor::Accessor;
use crate::error::{Result, ValidationError};
use crate::error_object::ErrorObject;
use crate::id::{IdContext, IdNumber, IdValue};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The only protocol version this crate reads and writes
pub const JSONRPC_VERSION: &str = "2.0";

/// Wire name of the version member
pub const PROPERTY_JSONRPC: &str = "jsonrpc";
/// Wire name of the id member
pub const PROPERTY_ID: &str = "id";
/// Wire name of the method member
pub const PROPERTY_METHOD: &str = "method";
/// Wire name of the params member
pub const PROPERTY_PARAMS: &str = "params";
/// Wire name of the result member
pub const PROPERTY_RESULT: &str = "result";
/// Wire name of the error member
pub const PROPERTY_ERROR: &str = "error";

/// Access to the `id` member
pub trait HasId {
    /// The id as stored
    fn id(&self) -> &IdValue;

    /// Replace the id
    ///
    /// No check is made here; [`HasId::is_id_contextually_valid`] and the
    /// message's `validate` report ids that are not allowed.
    fn set_id(&mut self, id: IdValue);

    /// Where this message places its id
    fn id_context(&self) -> IdContext;

    /// True unless the id member is missing
    fn has_id(&self) -> bool {
        !self.id().is_absent()
    }

    /// Whether the id is acceptable for this message in its current state
    fn is_id_contextually_valid(&self) -> bool {
        self.id().is_contextually_valid(self.id_context())
    }

    /// Display form of the id
    fn id_as_string(&self) -> Option<String> {
        self.id().as_string()
    }

    /// The id as an arbitrary-precision integer
    ///
    /// # Errors
    ///
    /// `Error::Format` if a text id is not a canonical integer literal.
    fn id_as_integer(&self) -> Result<Option<IdNumber>> {
        self.id().as_integer()
    }

    /// The id as an `i64`
    ///
    /// # Errors
    ///
    /// `Error::Format` for non-integer text, `Error::Range` if it does not fit.
    fn id_as_long(&self) -> Result<Option<i64>> {
        self.id().as_long()
    }

    /// The id as an `i32`
    ///
    /// # Errors
    ///
    /// `Error::Format` for non-integer text, `Error::Range` if it does not fit.
    fn id_as_i32(&self) -> Result<Option<i32>> {
        self.id().as_i32()
    }

    /// Set a string id
    fn set_id_as_string(&mut self, id: impl Into<String>)
    where
        Self: Sized,
    {
        self.set_id(IdValue::from_string(id));
    }

    /// Set a 64-bit integer id
    fn set_id_as_long(&mut self, id: i64) {
        self.set_id(IdValue::from_integer(id));
    }

    /// Set a 32-bit integer id
    fn set_id_as_i32(&mut self, id: i32) {
        self.set_id(IdValue::from_integer(id));
    }

    /// Give `other` the same id as this message
    fn copy_id_to<T: HasId + ?Sized>(&self, other: &mut T)
    where
        Self: Sized,
    {
        other.set_id(self.id().clone());
    }

    /// Take the id of `other`
    fn copy_id_from<T: HasId + ?Sized>(&mut self, other: &T)
    where
        Self: Sized,
    {
        self.set_id(other.id().clone());
    }
}

/// Access to `method` and `params` on requests and notifications
pub trait HasMethodAndParams: HasId {
    /// Typed params carried by the message
    type Params;

    /// The method name
    fn method(&self) -> &str;

    /// Replace the method name
    fn set_method(&mut self, method: String);

    /// The params, `None` when the member is omitted
    fn params(&self) -> Option<&Self::Params>;

    /// Replace the params
    fn set_params(&mut self, params: Option<Self::Params>);

    /// True when params are present
    ///
    /// Present params are always by-position or by-name; which one is fixed
    /// by the params type.
    fn is_params_structured(&self) -> bool {
        self.params().is_some()
    }

    /// A request without an id expects no response
    fn is_notification(&self) -> bool {
        self.id().is_absent()
    }
}

/// Access to the exclusive `result` / `error` pair on responses
pub trait HasResultOrError {
    /// Type of a successful result
    type Result;
    /// Type of the error object's `data`
    type ErrorData;

    /// The result, `None` for error responses
    fn result(&self) -> Option<&Self::Result>;

    /// The error, `None` for successful responses
    fn error(&self) -> Option<&ErrorObject<Self::ErrorData>>;

    /// Make this a successful response, dropping any error
    fn set_result_exclusively(&mut self, result: Self::Result);

    /// Make this an error response, dropping any result
    fn set_error_exclusively(&mut self, error: ErrorObject<Self::ErrorData>);

    /// True for successful responses
    fn has_result(&self) -> bool {
        self.result().is_some()
    }

    /// True for error responses
    fn has_error(&self) -> bool {
        self.error().is_some()
    }

    /// Exactly one of `result` and `error` is present
    fn is_result_and_error_exclusive(&self) -> bool {
        self.has_result() != self.has_error()
    }
}

/// Stable runtime identity of a message type
///
/// Compares by [`TypeId`]; the name is kept for error messages and logs.
#[derive(Debug, Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// The tag of `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The Rust type name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Getter for one declared property, in wire form
///
/// `Ok(None)` means the member is omitted on the wire.
pub type PropertyGetter<T> = fn(&T) -> Result<Option<Value>>;

/// Setter for one declared property, from wire form
///
/// `None` asks for the member to be omitted.
pub type PropertySetter<T> = fn(&mut T, Option<Value>) -> Result<()>;

/// Typed accessor pair for one declared property of `T`
pub struct Property<T> {
    /// Wire name of the property
    pub name: &'static str,
    /// Read the property
    pub get: PropertyGetter<T>,
    /// Write the property
    pub set: PropertySetter<T>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Property<T> {}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property").field("name", &self.name).finish()
    }
}

/// Per-type description of a concrete message type
///
/// Implemented by [`RequestMessage`](crate::RequestMessage) and
/// [`ResponseMessage`](crate::ResponseMessage); user-defined message types
/// implement it to take part in the accessor cache and the registry.
pub trait MessageType: Sized {
    /// Wire names of every declared property, in encoding order
    fn property_names() -> &'static [&'static str];

    /// The accessor pair for a declared property
    fn property(name: &str) -> Option<Property<Self>>;

    /// Wire form without validation
    ///
    /// # Errors
    ///
    /// `Error::Serialization` if a payload cannot be serialized.
    fn encode_wire(&self) -> Result<Value>;

    /// Every invariant this instance currently violates
    fn collect_violations(&self) -> ValidationError;
}

/// Object-safe view of any message
///
/// Implemented for every [`MessageType`] that is also
/// `Clone + Debug + Send + Sync + 'static`.
pub trait Message: Any + fmt::Debug + Send + Sync {
    /// Runtime identity of the concrete type
    fn type_tag(&self) -> TypeTag;

    /// Wire names of the declared properties
    fn declared_properties(&self) -> &'static [&'static str];

    /// Build a fresh, uncached accessor for a declared property
    ///
    /// Use [`AccessorCache`](crate::AccessorCache) instead of calling this
    /// directly.
    fn resolve_accessor(&self, name: &str) -> Option<Accessor>;

    /// Validated wire form
    ///
    /// # Errors
    ///
    /// `Error::Validation` if the message violates an invariant.
    fn to_value(&self) -> Result<Value>;

    /// Check every invariant
    ///
    /// # Errors
    ///
    /// Every violation found, at once.
    fn validate_message(&self) -> std::result::Result<(), ValidationError>;

    /// Clone behind a box
    fn clone_message(&self) -> Box<dyn Message>;

    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Upcast for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Upcast for downcasting an owned box
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T> Message for T
where
    T: MessageType + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }

    fn declared_properties(&self) -> &'static [&'static str] {
        T::property_names()
    }

    fn resolve_accessor(&self, name: &str) -> Option<Accessor> {
        T::property(name).map(Accessor::new)
    }

    fn to_value(&self) -> Result<Value> {
        crate::codec::encode(self)
    }

    fn validate_message(&self) -> std::result::Result<(), ValidationError> {
        self.collect_violations().into_result(())
    }

    fn clone_message(&self) -> Box<dyn Message> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn Message {
    /// True if the concrete type is `T`
    pub fn is<T: Message>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow as the concrete type
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow as the concrete type
    pub fn downcast_mut<T: Message>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Take ownership as the concrete type
    ///
    /// The box is dropped if the type does not match; check with
    /// [`is`](Self::is) first when that matters.
    pub fn downcast<T: Message>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl Clone for Box<dyn Message> {
    fn clone(&self) -> Self {
        self.clone_message()
    }
}

impl fmt::Display for dyn Message {
    /// `TypeName{property=value, ...}` over the declared properties
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::accessor::describe(self))
    }
}

impl PartialEq for dyn Message {
    fn eq(&self, other: &Self) -> bool {
        crate::accessor::messages_equal(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnyId, ErrorObject, RequestMessage, ResponseMessage};
    use serde_json::json;

    #[test]
    fn test_type_tag_identity() {
        let a = TypeTag::of::<RequestMessage<Vec<i64>>>();
        let b = TypeTag::of::<RequestMessage<Vec<i64>, AnyId>>();
        let c = TypeTag::of::<RequestMessage<Vec<String>>>();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.name().contains("RequestMessage"));
    }

    #[test]
    fn test_copy_id_between_messages() {
        let request = RequestMessage::<Vec<i64>>::new("ping", None, "abc").unwrap();
        let mut response = ResponseMessage::<bool>::rejected(
            ErrorObject::internal_error("boom"),
            IdValue::Null,
        )
        .unwrap();

        request.copy_id_to(&mut response);
        assert_eq!(response.id_as_string().as_deref(), Some("abc"));

        let mut other = RequestMessage::<Vec<i64>>::notification("tick", None).unwrap();
        assert!(other.is_notification());
        other.copy_id_from(&response);
        assert!(!other.is_notification());
    }

    #[test]
    fn test_id_setters() {
        let mut request = RequestMessage::<Vec<i64>>::notification("tick", None).unwrap();
        assert!(!request.has_id());

        request.set_id_as_long(1 << 40);
        assert!(request.id_as_i32().is_err());
        request.set_id_as_i32(5);
        assert_eq!(request.id_as_long().unwrap(), Some(5));
        assert_eq!(request.id_as_integer().unwrap(), Some(IdNumber::from(5)));
    }

    #[test]
    fn test_exclusivity_queries() {
        let mut response = ResponseMessage::<i64>::resolved(19, 1i64).unwrap();
        assert!(response.has_result());
        assert!(response.is_result_and_error_exclusive());

        response.set_error_exclusively(ErrorObject::invalid_params("bad"));
        assert!(!response.has_result());
        assert!(response.has_error());
        assert!(response.is_result_and_error_exclusive());
    }

    #[test]
    fn test_boxed_message_downcast_and_clone() {
        let request = RequestMessage::<Vec<i64>>::new("sum", Some(vec![1]), 1i64).unwrap();
        let boxed: Box<dyn Message> = Box::new(request.clone());
        let copy = boxed.clone();

        assert!(copy.is::<RequestMessage<Vec<i64>>>());
        assert_eq!(copy.downcast_ref::<RequestMessage<Vec<i64>>>(), Some(&request));
        assert!(copy.downcast_ref::<ResponseMessage<i64>>().is_none());
        assert_eq!(copy.to_value().unwrap()["params"], json!([1]));
    }
}
