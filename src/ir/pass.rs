//! One compile pass over an ingested resource set
//!
//! The gateway descriptor writes into a staged copy of the graph. If it
//! resolves, the stage becomes the graph and probe mappings are emitted into
//! it; if it fails, the stage is dropped with everything the descriptor wrote,
//! and only the error survives.

use crate::config::IrConfig;
use crate::domain::ResourceSet;
use crate::errors::Result;
use crate::ir::diagnostics::Diagnostics;
use crate::ir::gateway::{GatewayDescriptor, ResolveContext};
use crate::ir::graph::{policy_for, IrGraph};
use crate::ir::module_store::{InMemoryModuleStore, ModuleStore};
use crate::ir::tls::LegacyTlsModule;
use serde::Serialize;

/// Name of the standalone legacy TLS module
pub const TLS_MODULE_NAME: &str = "tls";

/// Result of a compile pass
#[derive(Debug, Clone, Serialize)]
pub struct CompiledIr {
    /// Absent when the descriptor failed to resolve
    pub ambassador: Option<GatewayDescriptor>,
    pub graph: IrGraph,
    pub diagnostics: Diagnostics,
}

impl CompiledIr {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Pretty JSON rendering of the whole IR
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compile a resource set using the in-memory module store
pub fn compile(resources: &ResourceSet, settings: &IrConfig) -> Result<CompiledIr> {
    let store = InMemoryModuleStore::from_resources(resources);

    let mut graph = IrGraph::with_policy(policy_for(settings.tls_policy));
    for resource in resources.tls_contexts() {
        graph.add_tls_context_resource(resource.clone());
    }

    compile_with_store(&store, graph, settings)
}

/// Compile against an arbitrary module store and a pre-seeded graph
pub fn compile_with_store(
    modules: &dyn ModuleStore,
    mut graph: IrGraph,
    settings: &IrConfig,
) -> Result<CompiledIr> {
    if let Some(tls) = modules.get_module(TLS_MODULE_NAME) {
        graph.tls_module_mut().set(LegacyTlsModule::from_module(tls));
    }

    let mut diagnostics = Diagnostics::default();
    let mut descriptor = GatewayDescriptor::new();
    let mut staged = graph.clone();

    let outcome = {
        let mut ctx = ResolveContext {
            modules,
            graph: &mut staged,
            settings,
            diagnostics: &mut diagnostics,
        };
        descriptor.resolve(&mut ctx)
    };

    let ambassador = match outcome {
        Ok(()) => {
            graph = staged;
            let emitted = descriptor.emit_probe_mappings(&mut graph)?;
            tracing::info!(
                service_port = descriptor.service_port,
                probe_mappings = emitted,
                tls_contexts = graph.tls_contexts().count(),
                "Compile pass finished"
            );
            Some(descriptor)
        }
        Err(err) => {
            diagnostics.error(&descriptor.entity_ref(), err.to_string());
            None
        }
    };

    Ok(CompiledIr { ambassador, graph, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModuleRecord, TlsContextResource};
    use serde_json::json;

    fn resources(config: serde_json::Value) -> ResourceSet {
        let mut set = ResourceSet::new();
        set.add_module(ModuleRecord::new(
            "ambassador",
            "ambassador.yaml.1",
            "ambassador.yaml.1",
            config.as_object().cloned().unwrap(),
        ));
        set
    }

    #[test]
    fn test_successful_pass_commits_graph() {
        let set = resources(json!({"tls": {"server": {"secret": "edge"}}}));
        let ir = compile(&set, &IrConfig::default()).unwrap();

        assert!(!ir.has_errors());
        assert_eq!(ir.ambassador.as_ref().unwrap().service_port, 443);
        assert!(ir.graph.lookup_tls_context("server").is_some());
        assert_eq!(ir.graph.mappings().len(), 3);
    }

    #[test]
    fn test_failed_pass_discards_staged_graph() {
        let set = resources(json!({
            "tls": {"server": {"secret": "edge"}},
            "buffer": {"max_request_time": 5000}
        }));
        let ir = compile(&set, &IrConfig::default()).unwrap();

        assert!(ir.has_errors());
        assert!(ir.ambassador.is_none());
        assert!(ir.graph.lookup_tls_context("server").is_none());
        assert!(!ir.graph.tls_module().is_occupied());
        assert!(ir.graph.mappings().is_empty());
        assert!(ir.graph.provenance().is_empty());
    }

    #[test]
    fn test_standalone_tls_module_is_replaced_by_nested() {
        let mut set = resources(json!({"tls": {"server": {"secret": "nested"}}}));
        set.add_module(ModuleRecord::new(
            "tls",
            "tls.yaml.1",
            "tls.yaml.1",
            json!({"server": {"secret": "standalone"}, "client": {"cacert_chain_file": "/ca.pem"}})
                .as_object()
                .cloned()
                .unwrap(),
        ));

        let ir = compile(&set, &IrConfig::default()).unwrap();

        let slot = ir.graph.tls_module().get().unwrap();
        assert_eq!(slot.name.as_str(), "tls-from-ambassador-module");
        assert!(!slot.entries.contains_key("client"));
        assert!(ir.graph.lookup_tls_context("client").is_none());
        assert_eq!(
            ir.graph.lookup_tls_context("server").unwrap().spec.secret.as_deref(),
            Some("nested")
        );
    }

    #[test]
    fn test_standalone_tls_module_alone() {
        let mut set = ResourceSet::new();
        set.add_module(ModuleRecord::new(
            "tls",
            "tls.yaml.1",
            "tls.yaml.1",
            json!({"server": {"cert_chain_file": "/c.pem", "private_key_file": "/k.pem"}})
                .as_object()
                .cloned()
                .unwrap(),
        ));

        let ir = compile(&set, &IrConfig::default()).unwrap();
        assert_eq!(ir.ambassador.unwrap().service_port, 443);
    }

    #[test]
    fn test_first_class_context_escalates_port() {
        let mut set = ResourceSet::new();
        set.add_tls_context(TlsContextResource {
            rkey: "ctx.yaml.1".into(),
            name: "edge".into(),
            location: "ctx.yaml.1".into(),
            hosts: Some(vec!["example.com".to_string()]),
            secret: Some("edge-cert".to_string()),
            extra: Default::default(),
        });

        let ir = compile(&set, &IrConfig::default()).unwrap();
        assert_eq!(ir.ambassador.unwrap().service_port, 443);
    }

    #[test]
    fn test_to_json_renders_descriptor() {
        let ir = compile(&ResourceSet::new(), &IrConfig::default()).unwrap();
        let rendered: serde_json::Value = serde_json::from_str(&ir.to_json().unwrap()).unwrap();

        assert_eq!(rendered["ambassador"]["service_port"], json!(80));
        assert_eq!(rendered["graph"]["mappings"].as_array().unwrap().len(), 3);
        assert_eq!(
            rendered["graph"]["mappings"][0]["name"],
            json!("internal_liveness_probe_mapping")
        );
    }
}
