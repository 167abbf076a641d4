//! Core JSON-RPC 2.0 binding and validation model for jbind
//!
//! This crate turns wire JSON into typed JSON-RPC 2.0 messages and back,
//! checking every protocol rule on the way. It includes:
//!
//! - **Identifiers**: the polymorphic `id` (string, number, `null` or absent)
//! - **Params**: by-position or by-name parameters, fixed per request type
//! - **Error objects**: `{code, message, data}` and the reserved code ranges
//! - **Messages**: requests, notifications and responses with their invariants
//! - **Codec**: decoding and encoding with complete violation reports
//! - **Accessor cache and registry**: generic property access and construction
//!   for message types only known at runtime
//! - **Observability**: `tracing` events, a logging setup helper and
//!   OpenTelemetry codec metrics
//!
//! # Overview
//!
//! Invalid states are either unrepresentable or rejected at the boundary.
//! A response holds an [`Outcome`], so it can never carry both a result and
//! an error. A request type commits to by-position or by-name params through
//! [`Params`], so an array can never be read as a struct's named fields.
//! Everything that can still go wrong is reported as a typed [`Error`].
//!
//! # Architecture
//!
//! The crate does not parse JSON text or move bytes; `serde_json::Value` is
//! the boundary. Transports and method dispatch are left to the caller.
//!
//! # Example
//!
//! ```rust
//! use jbind_core::{codec, HasResultOrError, RequestMessage};
//! use serde_json::json;
//!
//! // Decode a request
//! let wire = json!({"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 1});
//! let request: RequestMessage<Vec<i64>> = codec::decode(wire).unwrap();
//!
//! // Answer it
//! let params = request.clone().into_params().unwrap_or_default();
//! let response = request.respond_ok(params[0] - params[1]).unwrap();
//! assert_eq!(response.result(), Some(&19));
//!
//! // Encode the answer
//! let encoded = codec::encode(&response).unwrap();
//! assert_eq!(encoded, json!({"jsonrpc": "2.0", "result": 19, "id": 1}));
//! ```

pub mod accessor;
pub mod codec;
pub mod error;
pub mod error_object;
pub mod id;
pub mod message;
pub mod metrics;
pub mod observability;
pub mod params;
pub mod registry;
pub mod request;
pub mod response;

// Re-export the most commonly used types for convenience
// This allows users to use `jbind_core::Error` instead of `jbind_core::error::Error`
pub use accessor::{Accessor, AccessorCache};
pub use codec::{BatchDecoded, CodecConfig, Decode, MessageKind};
pub use error::{Error, Result, Shape, ValidationError, Violation, ViolationKind};
pub use error_object::{CodeRange, ErrorObject};
pub use id::{AnyId, IdContext, IdNumber, IdShape, IdValue, NumberId, TextId};
pub use message::{
    HasId, HasMethodAndParams, HasResultOrError, Message, MessageType, Property, TypeTag,
    JSONRPC_VERSION,
};
pub use metrics::CodecMetrics;
pub use observability::{init_logging, LogConfig};
pub use params::{Named, Params, ParamsKind, ParamsValue, Positional};
pub use registry::{GenericBuilder, Parts, Registry};
pub use request::RequestMessage;
pub use response::{Outcome, ResponseBuilder, ResponseMessage, ResponseState};
