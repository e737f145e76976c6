//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → middleware/access_log.rs
//!     → middleware/parse_request.rs (RpcRequest into extensions)
//!     → middleware/serve_call.rs (run call, format or stream result)
//!     → fallback handler for other actions
//! ```

pub mod error_page;
pub mod middleware;
pub mod server;

pub use server::RiapServer;
