//! jbind - JSON-RPC 2.0 message binding and validation
//!
//! This is the main convenience crate that re-exports the jbind sub-crates.
//! Use this crate if you want a single dependency that provides the message
//! model together with the `#[derive(Params)]` macro.
//!
//! # Architecture
//!
//! jbind is organized into modular crates:
//!
//! - **jbind-core**: identifiers, params, error objects, messages, codec,
//!   accessor cache, registry, observability
//! - **jbind-macros**: the `#[derive(Params)]` macro
//!
//! # Quick Start
//!
//! ```rust
//! use jbind::{codec, ErrorObject, HasMethodAndParams, Params, RequestMessage, ResponseMessage};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, Clone, PartialEq, Params, Serialize, Deserialize)]
//! #[params(crate = "jbind::core")]
//! struct Subtract {
//!     minuend: i64,
//!     subtrahend: i64,
//! }
//!
//! let wire = json!({
//!     "jsonrpc": "2.0",
//!     "method": "subtract",
//!     "params": {"subtrahend": 23, "minuend": 42},
//!     "id": 3
//! });
//! let request: RequestMessage<Subtract> = codec::decode(wire).unwrap();
//!
//! let response: ResponseMessage<i64> = match request.params() {
//!     Some(p) => request.respond_ok(p.minuend - p.subtrahend).unwrap(),
//!     None => request.respond_err(ErrorObject::invalid_params("missing params")).unwrap(),
//! };
//! assert_eq!(
//!     codec::encode(&response).unwrap(),
//!     json!({"jsonrpc": "2.0", "result": 19, "id": 3})
//! );
//!
//! // The same type refuses by-position params
//! let wire = json!({"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 4});
//! let err = codec::decode::<RequestMessage<Subtract>>(wire).unwrap_err();
//! assert!(err.is_shape_mismatch());
//! ```

// Re-export all public APIs from sub-crates
// This allows users to access everything through the `jbind::` prefix
pub use jbind_core as core;
pub use jbind_macros as macros;

// Convenience re-exports of the core model and the derive macro
// The derive shares its name with the trait; they live in different namespaces
pub use jbind_core::*;
pub use jbind_macros::Params;
