//! Process-wide cache of property accessors
//!
//! Generic code that only holds a `&dyn Message` still needs to read and
//! write individual properties: structural equality, the string form and
//! the generic builder all do. An [`Accessor`] is the type-erased getter and
//! setter for one declared property of one concrete message type, and the
//! [`AccessorCache`] hands out one shared accessor per `(type, property)`.
//!
//! # Concurrency
//!
//! The cache is a sharded [`DashMap`], so lookups for unrelated keys do not
//! contend. A miss computes the accessor without holding any shard lock and
//! then inserts it only if the key is still vacant. When several threads
//! miss on the same key at once, every one of them gets the accessor that
//! was stored first; the others are dropped. Entries are never replaced.
//!
//! # Examples
//!
//! ```rust
//! use jbind_core::accessor::{self, AccessorCache};
//! use jbind_core::{Message, RequestMessage};
//! use serde_json::json;
//!
//! let mut request = RequestMessage::<Vec<i64>>::new("sum", Some(vec![1, 2]), 1i64).unwrap();
//!
//! let cache = AccessorCache::new();
//! let method = cache.get::<RequestMessage<Vec<i64>>>("method").unwrap();
//! assert_eq!(method.get(&request).unwrap(), Some(json!("sum")));
//!
//! method.set(&mut request, Some(json!("product"))).unwrap();
//! assert_eq!(accessor::get_property(&request, "method").unwrap(), Some(json!("product")));
//!
//! assert!(cache.get::<RequestMessage<Vec<i64>>>("result").is_err());
//! ```

use crate::error::{Error, Result};
use crate::message::{Message, MessageType, Property, TypeTag};
use dashmap::DashMap;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, OnceLock};

type ErasedGetter = Box<dyn Fn(&dyn Any) -> Option<Result<Option<Value>>> + Send + Sync>;
type ErasedSetter = Box<dyn Fn(&mut dyn Any, Option<Value>) -> Option<Result<()>> + Send + Sync>;

/// Type-erased getter and setter for one property of one message type
///
/// Applying an accessor to an instance of another type fails with
/// `Error::TypeMismatch`.
pub struct Accessor {
    tag: TypeTag,
    property: &'static str,
    getter: ErasedGetter,
    setter: ErasedSetter,
}

impl Accessor {
    /// Erase a typed property
    pub fn new<T: Message + MessageType>(property: Property<T>) -> Self {
        let Property { name, get, set } = property;
        Self {
            tag: TypeTag::of::<T>(),
            property: name,
            getter: Box::new(move |target: &dyn Any| target.downcast_ref::<T>().map(get)),
            setter: Box::new(move |target: &mut dyn Any, value: Option<Value>| {
                target.downcast_mut::<T>().map(|message| set(message, value))
            }),
        }
    }

    /// The type this accessor was computed for
    pub fn type_tag(&self) -> TypeTag {
        self.tag
    }

    /// Wire name of the property
    pub fn property(&self) -> &'static str {
        self.property
    }

    /// Read the property from `message`
    ///
    /// # Errors
    ///
    /// `Error::TypeMismatch` if `message` is not of the accessor's type, or
    /// whatever the property getter reports.
    pub fn get(&self, message: &dyn Message) -> Result<Option<Value>> {
        (self.getter)(message.as_any()).unwrap_or_else(|| Err(self.mismatch(message.type_tag())))
    }

    /// Write the property on `message`
    ///
    /// # Errors
    ///
    /// `Error::TypeMismatch` if `message` is not of the accessor's type, or
    /// whatever the property setter reports.
    pub fn set(&self, message: &mut dyn Message, value: Option<Value>) -> Result<()> {
        let found = message.type_tag();
        (self.setter)(message.as_any_mut(), value).unwrap_or_else(|| Err(self.mismatch(found)))
    }

    fn mismatch(&self, found: TypeTag) -> Error {
        Error::TypeMismatch {
            expected: self.tag.name().to_string(),
            found: found.name().to_string(),
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("type", &self.tag.name())
            .field("property", &self.property)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AccessorKey {
    type_id: TypeId,
    property: String,
}

/// Shared accessors keyed by `(type, property)`
#[derive(Debug, Default)]
pub struct AccessorCache {
    entries: DashMap<AccessorKey, Arc<Accessor>>,
}

impl AccessorCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache
    pub fn global() -> &'static AccessorCache {
        static GLOBAL: OnceLock<AccessorCache> = OnceLock::new();
        GLOBAL.get_or_init(AccessorCache::new)
    }

    /// Accessor for a property of `T`
    ///
    /// # Errors
    ///
    /// `Error::NoSuchProperty` if `T` does not declare `property`.
    pub fn get<T: Message + MessageType>(&self, property: &str) -> Result<Arc<Accessor>> {
        self.lookup(TypeTag::of::<T>(), property, || {
            T::property(property).map(Accessor::new)
        })
    }

    /// Accessor for a property of the concrete type behind `message`
    ///
    /// # Errors
    ///
    /// `Error::NoSuchProperty` if that type does not declare `property`.
    pub fn get_for(&self, message: &dyn Message, property: &str) -> Result<Arc<Accessor>> {
        self.lookup(message.type_tag(), property, || message.resolve_accessor(property))
    }

    /// Number of cached accessors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup<F>(&self, tag: TypeTag, property: &str, resolve: F) -> Result<Arc<Accessor>>
    where
        F: FnOnce() -> Option<Accessor>,
    {
        let key = AccessorKey {
            type_id: tag.id(),
            property: property.to_string(),
        };

        if let Some(cached) = self.entries.get(&key) {
            return Ok(Arc::clone(cached.value()));
        }

        // Computed outside the shard lock; a racing insert wins over this one
        let computed = resolve().ok_or_else(|| Error::NoSuchProperty {
            type_name: tag.name().to_string(),
            property: property.to_string(),
        })?;
        tracing::trace!(type_name = tag.name(), property, "caching property accessor");

        let stored = self
            .entries
            .entry(key)
            .or_insert_with(|| Arc::new(computed));
        Ok(Arc::clone(stored.value()))
    }
}

/// Accessor for a property of `T` from the global cache
///
/// # Errors
///
/// `Error::NoSuchProperty` if `T` does not declare `property`.
pub fn accessor<T: Message + MessageType>(property: &str) -> Result<Arc<Accessor>> {
    AccessorCache::global().get::<T>(property)
}

/// Accessor for a property of `message`'s type from the global cache
///
/// # Errors
///
/// `Error::NoSuchProperty` if that type does not declare `property`.
pub fn accessor_for(message: &dyn Message, property: &str) -> Result<Arc<Accessor>> {
    AccessorCache::global().get_for(message, property)
}

/// Read one property in wire form
///
/// # Errors
///
/// `Error::NoSuchProperty` for undeclared properties, or whatever the
/// property getter reports.
pub fn get_property(message: &dyn Message, property: &str) -> Result<Option<Value>> {
    accessor_for(message, property)?.get(message)
}

/// Write one property from wire form
///
/// # Errors
///
/// `Error::NoSuchProperty` for undeclared properties, or whatever the
/// property setter reports.
pub fn set_property(message: &mut dyn Message, property: &str, value: Option<Value>) -> Result<()> {
    let accessor = accessor_for(message, property)?;
    accessor.set(message, value)
}

/// Structural equality of two messages of possibly different types
///
/// Messages of different concrete types are never equal. Otherwise every
/// declared property is compared in wire form.
pub fn messages_equal(a: &dyn Message, b: &dyn Message) -> bool {
    if a.type_tag() != b.type_tag() {
        return false;
    }
    a.declared_properties().iter().all(|property| {
        match (get_property(a, property), get_property(b, property)) {
            (Ok(left), Ok(right)) => left == right,
            _ => false,
        }
    })
}

/// String form `TypeName{property=value, ...}` over the declared properties
///
/// Absent properties are skipped; properties that fail to read are shown as
/// `<error>`.
pub fn describe(message: &dyn Message) -> String {
    let tag = message.type_tag();
    let short = tag.name().split('<').next().unwrap_or(tag.name());
    let short = short.rsplit("::").next().unwrap_or(short);

    let members: Vec<String> = message
        .declared_properties()
        .iter()
        .filter_map(|property| match get_property(message, property) {
            Ok(Some(value)) => Some(format!("{}={}", property, value)),
            Ok(None) => None,
            Err(_) => Some(format!("{}=<error>", property)),
        })
        .collect();

    format!("{}{{{}}}", short, members.join(", "))
}
