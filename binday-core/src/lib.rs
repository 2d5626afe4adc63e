//! Core types and service wiring for the binday bin collection aggregator.

/// Parser for pipe-delimited raw HTTP header strings.
pub mod headers;
/// Domain models and identifiers shared by all councils.
pub mod model;
/// Registry and helpers for plugging council-specific providers into the service.
pub mod plugin;
/// Traits describing the provider interfaces.
pub mod ports;
/// High-level service facade used by clients.
pub mod service;
/// Validation of user supplied postcodes and house numbers.
pub mod validate;

pub use headers::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use service::*;
pub use validate::*;
