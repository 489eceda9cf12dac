//! # Configuration Settings
//!
//! Defines the configuration structure for the IR compiler.

use crate::errors::{IrError, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct CompilerConfig {
    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// IR resolution configuration
    #[validate(nested)]
    pub ir: IrConfig,
}

impl CompilerConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(IrError::from)?;

        self.validate_custom()?;

        Ok(())
    }

    fn validate_custom(&self) -> Result<()> {
        let level = self.observability.log_level.to_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(IrError::validation_field(
                format!("Unknown log level '{}'", self.observability.log_level),
                "observability.log_level",
            ));
        }

        Ok(())
    }
}

/// How the graph settles two TLS contexts registered under the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsPolicyKind {
    /// The first registration wins; later ones are rejected
    #[default]
    FirstWins,
    /// Every registration replaces the previous occupant
    Replace,
}

/// Gateway descriptor resolution settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IrConfig {
    /// Name of the module record that drives the gateway descriptor
    #[validate(length(min = 1, message = "Module name cannot be empty"))]
    pub module_name: String,

    /// Label domain used when the module does not name one
    #[validate(length(min = 1, message = "Label domain sentinel cannot be empty"))]
    pub label_domain_sentinel: String,

    /// TLS context registration policy
    pub tls_policy: TlsPolicyKind,
}

impl Default for IrConfig {
    fn default() -> Self {
        Self {
            module_name: "ambassador".to_string(),
            label_domain_sentinel: "ambassador".to_string(),
            tls_policy: TlsPolicyKind::FirstWins,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Service name attached to log lines
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "gateway-ir".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}
