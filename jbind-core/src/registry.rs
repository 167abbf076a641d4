//! Type registry and generic message builder
//!
//! Some callers only learn which message type to build at runtime, for
//! example from configuration or from a routing table. The [`Registry`] maps
//! a [`TypeTag`] (and optionally a name) to a construction function, and the
//! [`GenericBuilder`] collects the members of a message before asking the
//! registry to construct it.
//!
//! Construction always goes through the same decoder as the wire, so a
//! generically built message satisfies exactly the same invariants as a
//! decoded one.
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::{HasMethodAndParams, ParamsValue, Registry, RequestMessage};
//! use serde_json::json;
//!
//! let registry = Registry::new();
//! registry.register_as::<RequestMessage<Vec<i64>>>("sum").unwrap();
//!
//! let message = registry
//!     .builder()
//!     .method("sum")
//!     .params(ParamsValue::positional(vec![json!(1), json!(2)]))
//!     .id(5i64)
//!     .build_named("sum")
//!     .unwrap();
//!
//! let request = message.downcast_ref::<RequestMessage<Vec<i64>>>().unwrap();
//! assert_eq!(request.params(), Some(&vec![1, 2]));
//! ```

use crate::codec::Decode;
use crate::error::{Error, Result};
use crate::error_object::ErrorObject;
use crate::id::IdValue;
use crate::message::{
    Message, MessageType, TypeTag, JSONRPC_VERSION, PROPERTY_ERROR, PROPERTY_ID,
    PROPERTY_JSONRPC, PROPERTY_METHOD, PROPERTY_PARAMS, PROPERTY_RESULT,
};
use crate::params::ParamsValue;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::any::TypeId;
use std::sync::OnceLock;

/// Members collected by the generic builder
///
/// Members left unset are omitted; the target type's decoder decides which
/// of them it requires.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parts {
    /// The `id` member
    pub id: IdValue,
    /// The `method` member
    pub method: Option<String>,
    /// The `params` member
    pub params: ParamsValue,
    /// The `result` member
    pub result: Option<Value>,
    /// The `error` member
    pub error: Option<ErrorObject<Value>>,
}

impl Parts {
    /// Wire object holding the collected members
    ///
    /// # Errors
    ///
    /// `Error::Format` if an integer id cannot be represented.
    pub fn into_value(self) -> Result<Value> {
        let mut object = Map::new();
        object.insert(PROPERTY_JSONRPC.into(), Value::from(JSONRPC_VERSION));
        if let Some(id) = self.id.to_wire()? {
            object.insert(PROPERTY_ID.into(), id);
        }
        if let Some(method) = self.method {
            object.insert(PROPERTY_METHOD.into(), Value::String(method));
        }
        if let Some(params) = self.params.to_wire() {
            object.insert(PROPERTY_PARAMS.into(), params);
        }
        if let Some(result) = self.result {
            object.insert(PROPERTY_RESULT.into(), result);
        }
        if let Some(error) = self.error {
            object.insert(PROPERTY_ERROR.into(), error.to_wire()?);
        }
        Ok(Value::Object(object))
    }
}

/// Construction function stored per registered type
pub type Factory = fn(Parts) -> Result<Box<dyn Message>>;

#[derive(Debug, Clone, Copy)]
struct Entry {
    tag: TypeTag,
    factory: Factory,
}

fn construct<T>(parts: Parts) -> Result<Box<dyn Message>>
where
    T: Message + MessageType + Decode,
{
    let message = T::decode_wire(parts.into_value()?)?;
    Ok(Box::new(message))
}

/// Construction paths for message types, by tag and by name
#[derive(Debug, Default)]
pub struct Registry {
    by_tag: DashMap<TypeId, Entry>,
    by_name: DashMap<String, TypeId>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Register `T`, returning its tag
    ///
    /// Registering the same type again has no effect.
    pub fn register<T>(&self) -> TypeTag
    where
        T: Message + MessageType + Decode,
    {
        let tag = TypeTag::of::<T>();
        self.by_tag.entry(tag.id()).or_insert_with(|| {
            tracing::debug!(type_name = tag.name(), "registering message type");
            Entry {
                tag,
                factory: construct::<T>,
            }
        });
        tag
    }

    /// Register `T` and bind it to `name`
    ///
    /// A rejected binding leaves the registry unchanged.
    ///
    /// # Errors
    ///
    /// `Error::Construction` if `name` is already bound to another type.
    pub fn register_as<T>(&self, name: impl Into<String>) -> Result<TypeTag>
    where
        T: Message + MessageType + Decode,
    {
        let tag = TypeTag::of::<T>();
        let name = name.into();

        // The name's shard stays locked until `T` is registered
        match self.by_name.entry(name) {
            dashmap::Entry::Occupied(bound) if *bound.get() != tag.id() => {
                Err(Error::Construction {
                    type_name: tag.name().to_string(),
                    reason: format!("name `{}` is already bound to another type", bound.key()),
                })
            }
            dashmap::Entry::Occupied(_) => Ok(self.register::<T>()),
            dashmap::Entry::Vacant(slot) => {
                let tag = self.register::<T>();
                slot.insert(tag.id());
                Ok(tag)
            }
        }
    }

    /// True if `T` has been registered
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.by_tag.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// True if no type has been registered
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Construct the type identified by `tag`
    ///
    /// # Errors
    ///
    /// `Error::Construction` if the type is not registered, or the decoding
    /// error if `parts` do not form a valid message of that type.
    pub fn construct(&self, tag: TypeTag, parts: Parts) -> Result<Box<dyn Message>> {
        // Copy the entry out so no shard lock is held while decoding
        let entry = self.by_tag.get(&tag.id()).map(|entry| *entry.value());
        match entry {
            Some(entry) => (entry.factory)(parts),
            None => {
                tracing::debug!(type_name = tag.name(), "construction of unregistered type");
                Err(Error::Construction {
                    type_name: tag.name().to_string(),
                    reason: "type is not registered".to_string(),
                })
            }
        }
    }

    /// Construct the type bound to `name`
    ///
    /// # Errors
    ///
    /// `Error::Construction` if no type is bound to `name`, or the decoding
    /// error if `parts` do not form a valid message of that type.
    pub fn construct_named(&self, name: &str, parts: Parts) -> Result<Box<dyn Message>> {
        let type_id = self.by_name.get(name).map(|entry| *entry.value());
        let entry = type_id.and_then(|id| self.by_tag.get(&id).map(|entry| *entry.value()));
        match entry {
            Some(entry) => {
                tracing::trace!(name, type_name = entry.tag.name(), "constructing by name");
                (entry.factory)(parts)
            }
            None => Err(Error::Construction {
                type_name: name.to_string(),
                reason: "no type is registered under this name".to_string(),
            }),
        }
    }

    /// Start building a message
    pub fn builder(&self) -> GenericBuilder<'_> {
        GenericBuilder {
            registry: self,
            parts: Parts::default(),
        }
    }
}

/// Populates the members of a message whose type is chosen at build time
#[derive(Debug)]
pub struct GenericBuilder<'r> {
    registry: &'r Registry,
    parts: Parts,
}

impl GenericBuilder<'_> {
    /// Set the id
    pub fn id(mut self, id: impl Into<IdValue>) -> Self {
        self.parts.id = id.into();
        self
    }

    /// Set the method
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.parts.method = Some(method.into());
        self
    }

    /// Set the params
    pub fn params(mut self, params: ParamsValue) -> Self {
        self.parts.params = params;
        self
    }

    /// Set the result
    pub fn result(mut self, result: Value) -> Self {
        self.parts.result = Some(result);
        self
    }

    /// Set the error
    pub fn error(mut self, error: ErrorObject<Value>) -> Self {
        self.parts.error = Some(error);
        self
    }

    /// The members collected so far
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Construct the type identified by `tag`
    ///
    /// # Errors
    ///
    /// See [`Registry::construct`].
    pub fn build(self, tag: TypeTag) -> Result<Box<dyn Message>> {
        self.registry.construct(tag, self.parts)
    }

    /// Construct the type bound to `name`
    ///
    /// # Errors
    ///
    /// See [`Registry::construct_named`].
    pub fn build_named(self, name: &str) -> Result<Box<dyn Message>> {
        self.registry.construct_named(name, self.parts)
    }

    /// Construct `T` and return it unboxed
    ///
    /// # Errors
    ///
    /// See [`Registry::construct`]; `T` must have been registered.
    pub fn build_as<T: Message>(self) -> Result<T> {
        let tag = TypeTag::of::<T>();
        let message = self.build(tag)?;
        let found = message.type_tag();
        message
            .downcast::<T>()
            .map(|boxed| *boxed)
            .ok_or_else(|| Error::TypeMismatch {
                expected: tag.name().to_string(),
                found: found.name().to_string(),
            })
    }
}
