//! Procedural macros for the jbind JSON-RPC binding model
//!
//! This crate provides the `#[derive(Params)]` macro, which binds a struct to
//! JSON-RPC request parameters. Every request type in jbind commits to either
//! by-position params (a JSON array) or by-name params (a JSON object), and
//! the derive writes that commitment down at compile time.
//!
//! # Available Macros
//!
//! ## `#[derive(Params)]` - Request Parameters
//!
//! Implements `jbind_core::Params` for a struct:
//! - Structs with named fields travel by-name (`{"a": 1, "b": 2}`)
//! - Tuple structs travel by-position (`[1, 2]`)
//! - `#[params(positional)]` sends a named-field struct by-position, in
//!   declaration order
//!
//! # How It Works
//!
//! The derive performs compile-time code generation:
//!
//! 1. Parses the struct and its `#[params(...)]` attribute
//! 2. Chooses by-position or by-name structure
//! 3. Generates `to_params` / `from_params` that encode and decode through
//!    the helpers in `jbind_core::params`
//!
//! Params sent with the other structure are rejected with
//! `Error::ShapeMismatch`; they are never coerced.
//!
//! # Examples
//!
//! ```ignore
//! use jbind::{codec, Params, RequestMessage};
//! use serde::{Deserialize, Serialize};
//!
//! // By-name: {"minuend": 42, "subtrahend": 23}
//! #[derive(Params, Serialize, Deserialize)]
//! struct Subtract {
//!     minuend: i64,
//!     subtrahend: i64,
//! }
//!
//! // By-position: [42, 23]
//! #[derive(Params)]
//! #[params(positional)]
//! struct SubtractArgs {
//!     minuend: i64,
//!     subtrahend: i64,
//! }
//!
//! let request: RequestMessage<SubtractArgs> = codec::decode(wire)?;
//! ```

mod params;

use proc_macro::TokenStream;

/// Derive macro for JSON-RPC request parameters
///
/// Implements `jbind_core::Params` for a struct, fixing whether it travels
/// by-position or by-name.
///
/// # Generated Code
///
/// For a by-name struct:
///
/// ```ignore
/// #[derive(Params, Serialize, Deserialize)]
/// struct Subtract { minuend: i64, subtrahend: i64 }
/// ```
///
/// the derive generates approximately:
///
/// ```ignore
/// impl ::jbind_core::Params for Subtract {
///     const KIND: ::jbind_core::ParamsKind = ::jbind_core::ParamsKind::Named;
///
///     fn to_params(&self) -> ::jbind_core::Result<::jbind_core::ParamsValue> {
///         ::jbind_core::params::encode_named(self)
///     }
///
///     fn from_params(params: ::jbind_core::ParamsValue) -> ::jbind_core::Result<Self> {
///         ::jbind_core::params::decode_named(params)
///     }
/// }
/// ```
///
/// For a by-position struct each field is encoded as one array element, in
/// declaration order, and decoded from the element at the same index.
///
/// # Attributes
///
/// - `#[params(named)]`: by-name (default for named fields, needs serde's
///   `Serialize` and `Deserialize` on the struct)
/// - `#[params(positional)]`: by-position (default for tuple structs, only
///   needs serde on the field types)
/// - `#[params(crate = "path")]`: path to `jbind_core` when it is re-exported,
///   e.g. `#[params(crate = "jbind::core")]`
///
/// # By-position Arity
///
/// Missing trailing elements decode as `null`, so trailing `Option` fields
/// may be left out. Extra elements are rejected with `Error::Format`.
///
/// # Limitations
///
/// - Only structs; enums, unions and unit structs are rejected
/// - Tuple structs cannot travel by-name
#[proc_macro_derive(Params, attributes(params))]
pub fn derive_params(input: TokenStream) -> TokenStream {
    params::derive_params_impl(input)
}
