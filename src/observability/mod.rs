//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields)
//!     → per-request spans (tower-http TraceLayer, x-request-id)
//!     → access-log events (target "riap_http::access")
//!     → call log mirror (target "riap_http::call")
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through all stages
//! - `RUST_LOG` wins over the configured level

pub mod logging;

pub use logging::init_tracing;
