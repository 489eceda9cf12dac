//! # Error Handling
//!
//! This module provides error handling for the gateway IR compiler.
//! Errors are defined with `thiserror`; see [`types`] for the variants.

pub mod types;

pub use types::{IrError, Result};
