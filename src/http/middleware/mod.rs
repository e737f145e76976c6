//! Riap middleware stages.
//!
//! ```text
//! access_log → parse_request → serve_call → inner handler
//! ```

pub mod access_log;
pub mod parse_request;
pub mod serve_call;

pub use access_log::access_log_middleware;
pub use parse_request::parse_request_middleware;
pub use serve_call::serve_call_middleware;
