//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign request ID)
//!     → gate (match + validate, reject early)
//!     → server.rs forward_handler (send to upstream API)
//!     → response.rs (strip hop-by-hop headers, map upstream errors)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeUuidRequestId, RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
