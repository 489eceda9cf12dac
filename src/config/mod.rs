//! # Configuration Management
//!
//! Settings for the IR compiler: which module drives the gateway descriptor,
//! how TLS context registration conflicts are settled, and how logs are emitted.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional file, then `GATEWAY_IR__*` environment variables
//! (for example `GATEWAY_IR__IR__MODULE_NAME=getambassador`).

pub mod settings;

pub use settings::{CompilerConfig, IrConfig, ObservabilityConfig, TlsPolicyKind};

use crate::errors::Result;
use std::path::Path;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "GATEWAY_IR";

impl CompilerConfig {
    /// Load configuration from an optional file and the environment, then validate it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: CompilerConfig = settings.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            module_name = %config.ir.module_name,
            tls_policy = ?config.ir.tls_policy,
            "Compiler configuration loaded"
        );

        Ok(config)
    }
}
