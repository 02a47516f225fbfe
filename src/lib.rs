//! Specification-driven request gate.
//!
//! Admits HTTP requests only when they match a registered API path template
//! and their query parameters and body satisfy the path's declared schema.

pub mod config;
pub mod gate;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod registry;

pub use config::GateConfig;
pub use gate::RequestGate;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::PathSpecRegistry;
