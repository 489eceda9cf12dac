//! # Observability Infrastructure
//!
//! Structured logging for the IR compiler. Resolution steps log through
//! `tracing`; the binary installs a subscriber via [`init_logging`].

pub mod logging;

pub use logging::{init_logging, log_config_info};
