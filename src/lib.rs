//! # Gateway IR
//!
//! The gateway-descriptor resolution stage of a gateway configuration
//! compiler. Declarative resources (modules, TLS contexts) go in; an
//! intermediate representation comes out, ready to be emitted as proxy
//! data-plane configuration by later stages.
//!
//! ## Architecture
//!
//! ```text
//! YAML resources → ResourceSet → ModuleStore ─┐
//!                                             ├→ GatewayDescriptor::resolve → IrGraph
//!                       TLSContext resources ─┘          ↓
//!                                             emit_probe_mappings → mappings
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gateway_ir::{compile, IrConfig, ResourceSet, Result};
//!
//! fn main() -> Result<()> {
//!     let yaml = std::fs::read_to_string("ambassador.yaml")?;
//!     let resources = ResourceSet::from_yaml_str("ambassador.yaml", &yaml)?;
//!     let ir = compile(&resources, &IrConfig::default())?;
//!     println!("{}", ir.to_json()?);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ir;
pub mod observability;

// Re-export commonly used types and traits
pub use config::{CompilerConfig, IrConfig};
pub use domain::{ModuleRecord, ResourceSet, TlsContextResource};
pub use errors::{IrError, Result};
pub use ir::{compile, CompiledIr, GatewayDescriptor, IrGraph};
pub use observability::init_logging;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "gateway-ir");
    }
}
