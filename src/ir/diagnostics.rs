//! Pass-level diagnostic sink
//!
//! Notices are soft failures: something was skipped or ignored and resolution
//! went on. Errors are hard failures that excluded a resource from the pass.
//! The sink outlives any staged graph, so errors survive a discarded stage.

use crate::ir::provenance::EntityRef;
use serde::Serialize;

/// One diagnostic entry, attributed to the resource that raised it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub resource: EntityRef,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    notices: Vec<Diagnostic>,
    errors: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Record a soft failure
    pub fn notice(&mut self, resource: &EntityRef, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(resource = %resource, %message, "IR notice");
        self.notices.push(Diagnostic { resource: resource.clone(), message });
    }

    /// Record a hard failure
    pub fn error(&mut self, resource: &EntityRef, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(resource = %resource, %message, "IR error");
        self.errors.push(Diagnostic { resource: resource.clone(), message });
    }

    pub fn notices(&self) -> &[Diagnostic] {
        &self.notices
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_and_errors_are_separate() {
        let mut diagnostics = Diagnostics::default();
        let resource = EntityRef::new("IRAmbassador", "ir.ambassador", "ir.ambassador");

        diagnostics.notice(&resource, "not updating context server");
        assert!(!diagnostics.has_errors());

        diagnostics.error(&resource, "missing required field: max_request_bytes");
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.notices().len(), 1);
        assert_eq!(diagnostics.errors()[0].message, "missing required field: max_request_bytes");
    }
}
