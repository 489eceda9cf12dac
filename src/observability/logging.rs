//! # Structured Logging
//!
//! Provides the logging subscriber setup and span macros used while
//! resolving IR entities.
//!
//! `RUST_LOG` takes precedence over the configured level, so a single run can
//! be made verbose with `RUST_LOG=gateway_ir=debug` without touching config.

use crate::config::ObservabilityConfig;
use crate::errors::{IrError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Create a tracing span for resolving a single IR resource.
///
/// ```rust,ignore
/// let span = ir_span!("IRAmbassador", "ir.ambassador");
/// let span = ir_span!("IRAmbassador", "ir.ambassador", location = "ambassador.yaml.1");
/// ```
#[macro_export]
macro_rules! ir_span {
    ($kind:expr, $name:expr) => {
        tracing::info_span!(
            "ir_resolve",
            kind = %$kind,
            name = %$name
        )
    };
    ($kind:expr, $name:expr, $($field:tt)*) => {
        tracing::info_span!(
            "ir_resolve",
            kind = %$kind,
            name = %$name,
            $($field)*
        )
    };
}

/// Install the global logging subscriber.
///
/// Installing twice is not an error; the first subscriber stays in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| IrError::config(format!("Invalid log filter: {}", e)))?;

    let installed = if config.json_logging {
        tracing::subscriber::set_global_default(
            fmt().json().with_env_filter(filter).with_current_span(true).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(fmt().with_env_filter(filter).finish())
    };

    if installed.is_err() {
        // Subscriber already set elsewhere (e.g. integration tests); ignore.
        tracing::debug!("Global subscriber already installed");
    }

    Ok(())
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::CompilerConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        module_name = %config.ir.module_name,
        label_domain_sentinel = %config.ir.label_domain_sentinel,
        tls_policy = ?config.ir.tls_policy,
        json_logging = config.observability.json_logging,
        "Gateway IR compiler configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_compile() {
        let _span = ir_span!("IRAmbassador", "ir.ambassador");
        let _span = ir_span!("IRAmbassador", "ir.ambassador", location = "test.yaml.1");
    }

    #[test]
    fn test_init_logging_twice() {
        let config = ObservabilityConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_log_config_info() {
        let config = crate::config::CompilerConfig::default();

        // This should not panic
        log_config_info(&config);
    }
}
