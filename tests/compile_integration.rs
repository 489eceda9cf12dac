//! Integration tests for full compile passes
//!
//! These drive the public API the way the CLI does: parse a resource stream,
//! compile it, and inspect the resulting descriptor and graph.

use gateway_ir::config::TlsPolicyKind;
use gateway_ir::domain::{Location, ModuleRecord, Record};
use gateway_ir::ir::{
    compile_with_store, policy_for, EntityRef, IrFilter, IrGraph, InMemoryModuleStore,
    ProbeConfig, Relation, ResolvedTlsContext,
};
use gateway_ir::{compile, IrConfig, ResourceSet, Result};
use serde_json::{json, Value};
use tracing_test::traced_test;

const FIXTURE: &str = include_str!("fixtures/ambassador.yaml");

fn record(value: Value) -> Record {
    value.as_object().cloned().expect("record must be an object")
}

fn module_set(config: Value) -> ResourceSet {
    let mut set = ResourceSet::new();
    set.add_module(ModuleRecord::new(
        "ambassador",
        "ambassador.yaml.1",
        "ambassador.yaml.1",
        record(config),
    ));
    set
}

#[test]
fn test_fixture_compiles() -> Result<()> {
    let resources = ResourceSet::from_yaml_str("ambassador.yaml", FIXTURE)?;
    assert_eq!(resources.modules().len(), 1);
    assert_eq!(resources.tls_contexts().len(), 1);

    let ir = compile(&resources, &IrConfig::default())?;
    assert!(!ir.has_errors());

    let descriptor = ir.ambassador.as_ref().expect("descriptor resolved");
    assert_eq!(descriptor.service_port, 443);
    assert_eq!(descriptor.admin_port, 8002);
    assert_eq!(descriptor.diag_port, 9000);
    assert!(descriptor.use_proxy_proto);
    assert!(descriptor.use_remote_address);
    assert_eq!(descriptor.default_label_domain(), "edge");
    assert_eq!(descriptor.default_label_prefix_for(None), Some("edge-proxy"));
    assert_eq!(descriptor.default_labels_for(Some("edge")).map(<[Value]>::len), Some(2));
    assert!(descriptor.default_labels_for(Some("missing")).is_none());

    let server = ir.graph.lookup_tls_context("server").expect("server context");
    assert!(server.valid_tls);
    assert_eq!(server.spec.redirect_cleartext_from, Some(8080));
    assert_eq!(server.location.as_str(), "ambassador.yaml.1");

    let client = ir.graph.lookup_tls_context("client").expect("client context");
    assert!(!client.valid_tls);

    let cors = descriptor.cors.as_ref().expect("cors policy");
    assert_eq!(cors.origins, vec!["http://foo.example", "http://bar.example"]);
    assert_eq!(cors.allow_methods, vec!["GET", "POST"]);
    assert_eq!(cors.allow_credentials, Some(true));
    assert_eq!(cors.max_age, Some(86400));

    Ok(())
}

#[test]
fn test_probe_mappings_follow_diag_port() -> Result<()> {
    let set = module_set(json!({
        "diag_port": 9000,
        "liveness_probe": {"enabled": true},
        "readiness_probe": {"enabled": false},
        "diagnostics": {"enabled": true}
    }));

    let ir = compile(&set, &IrConfig::default())?;

    let descriptor = ir.ambassador.as_ref().expect("descriptor resolved");
    assert_eq!(descriptor.diag_port, 9000);
    assert_eq!(
        descriptor.liveness_probe,
        Some(ProbeConfig {
            enabled: true,
            prefix: Some("/ambassador/v0/check_alive".to_string()),
            rewrite: Some("/ambassador/v0/check_alive".to_string()),
            service: Some("127.0.0.1:9000".to_string()),
            ..Default::default()
        })
    );
    assert_eq!(
        descriptor.diagnostics,
        Some(ProbeConfig {
            enabled: true,
            prefix: Some("/ambassador/v0/".to_string()),
            rewrite: Some("/ambassador/v0/".to_string()),
            service: Some("127.0.0.1:9000".to_string()),
            ..Default::default()
        })
    );
    // Disabled probes are left exactly as written.
    assert_eq!(
        descriptor.readiness_probe,
        Some(ProbeConfig { enabled: false, ..Default::default() })
    );

    let mappings = ir.graph.mappings();
    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[0].name.as_str(), "internal_liveness_probe_mapping");
    assert_eq!(mappings[0].prefix, "/ambassador/v0/check_alive");
    assert_eq!(mappings[0].rewrite, "/ambassador/v0/check_alive");
    assert_eq!(mappings[1].name.as_str(), "internal_diagnostics_probe_mapping");
    assert_eq!(mappings[1].prefix, "/ambassador/v0/");
    assert!(mappings.iter().all(|m| m.service == "127.0.0.1:9000"));

    Ok(())
}

#[test]
fn test_probe_overrides_are_kept() -> Result<()> {
    let set = module_set(json!({
        "liveness_probe": {"enabled": true, "prefix": "/healthz", "service": "health:8080"},
        "readiness_probe": null,
        "diagnostics": {"prefix": "/diag/"}
    }));

    let ir = compile(&set, &IrConfig::default())?;
    let names: Vec<&str> = ir.graph.mappings().iter().map(|m| m.name.as_str()).collect();
    // A probe record without `enabled: true` is off.
    assert_eq!(names, vec!["internal_liveness_probe_mapping"]);

    let liveness = &ir.graph.mappings()[0];
    assert_eq!(liveness.prefix, "/healthz");
    assert_eq!(liveness.rewrite, "/ambassador/v0/check_alive");
    assert_eq!(liveness.service, "health:8080");

    Ok(())
}

#[test]
fn test_falsy_enabled_replaces_default_probe() -> Result<()> {
    let set = module_set(json!({
        "liveness_probe": {"enabled": 0},
        "readiness_probe": {"enabled": null}
    }));

    let ir = compile(&set, &IrConfig::default())?;
    let names: Vec<&str> = ir.graph.mappings().iter().map(|m| m.name.as_str()).collect();

    assert_eq!(names, vec!["internal_diagnostics_probe_mapping"]);
    assert!(ir.diagnostics.notices().is_empty());

    Ok(())
}

#[test]
fn test_buffer_failure_excludes_descriptor() -> Result<()> {
    let set = module_set(json!({
        "tls": {"server": {"secret": "edge"}},
        "buffer": {"max_request_time": 5000}
    }));

    let ir = compile(&set, &IrConfig::default())?;

    assert!(ir.has_errors());
    assert!(ir.ambassador.is_none());
    assert!(ir.graph.mappings().is_empty());
    assert!(ir.graph.filters().is_empty());
    assert!(ir.diagnostics.errors()[0].message.contains("max_request_bytes"));

    Ok(())
}

#[test]
fn test_buffer_filter_is_shared_with_graph() -> Result<()> {
    let set = module_set(json!({"buffer": {"max_request_bytes": 16384}}));
    let ir = compile(&set, &IrConfig::default())?;

    let descriptor = ir.ambassador.as_ref().expect("descriptor resolved");
    let buffer = descriptor.buffer.as_ref().expect("buffer filter");
    assert_eq!(buffer.max_request_bytes, 16384);

    match &ir.graph.filters()[..] {
        [IrFilter::Buffer(filter)] => assert!(std::sync::Arc::ptr_eq(filter, buffer)),
        other => panic!("expected one buffer filter, got {:?}", other),
    }

    Ok(())
}

#[test]
fn test_invalid_cors_excludes_descriptor() -> Result<()> {
    let set = module_set(json!({"cors": {"origins": "*", "credentials": "yes"}}));
    let ir = compile(&set, &IrConfig::default())?;

    assert!(ir.ambassador.is_none());
    assert!(ir.diagnostics.errors()[0].message.contains("credentials"));

    Ok(())
}

#[test]
fn test_provenance_links_descriptor_to_module() -> Result<()> {
    let set = module_set(json!({"cors": {"origins": "*"}}));
    let ir = compile(&set, &IrConfig::default())?;

    let descriptor = ir.ambassador.as_ref().expect("descriptor resolved").entity_ref();
    let module = EntityRef::new("Module", "ambassador", "ambassador.yaml.1");

    let sources: Vec<&EntityRef> = ir.graph.provenance().sources_of(&descriptor).collect();
    assert_eq!(sources, vec![&module]);

    let has_cors_edge = ir.graph.provenance().edges().iter().any(|edge| {
        edge.subject.kind == "IRCORS" && edge.relation == Relation::ReferencedBy && edge.target == descriptor
    });
    assert!(has_cors_edge);

    Ok(())
}

#[test]
fn test_mistyped_transparent_key_is_a_notice() -> Result<()> {
    let set = module_set(json!({"admin_port": "not-a-port", "use_remote_address": false}));
    let ir = compile(&set, &IrConfig::default())?;

    let descriptor = ir.ambassador.as_ref().expect("descriptor resolved");
    assert_eq!(descriptor.admin_port, 8001);
    assert!(!descriptor.use_remote_address);
    assert!(!ir.has_errors());
    assert_eq!(ir.diagnostics.notices().len(), 1);

    Ok(())
}

fn seeded_graph(kind: TlsPolicyKind) -> IrGraph {
    let mut graph = IrGraph::with_policy(policy_for(kind));
    let seed = ResolvedTlsContext::build(
        "server",
        &Location::from("seed.yaml.1"),
        &record(json!({"secret": "seeded"})),
    )
    .expect("seed context");
    assert!(graph.register_tls_context(seed));
    graph
}

#[traced_test]
#[test]
fn test_existing_context_is_not_updated() -> Result<()> {
    let mut store = InMemoryModuleStore::new();
    store.insert(ModuleRecord::new(
        "ambassador",
        "ambassador.yaml.1",
        "ambassador.yaml.1",
        record(json!({"tls": {"server": {"secret": "fresh"}}})),
    ));

    let ir = compile_with_store(&store, seeded_graph(TlsPolicyKind::FirstWins), &IrConfig::default())?;

    let server = ir.graph.lookup_tls_context("server").expect("server context");
    assert_eq!(server.spec.secret.as_deref(), Some("seeded"));
    assert_eq!(ir.ambassador.expect("descriptor resolved").service_port, 443);
    assert!(logs_contain("Not updating TLS context"));

    Ok(())
}

#[traced_test]
#[test]
fn test_replace_policy_updates_context() -> Result<()> {
    let mut store = InMemoryModuleStore::new();
    store.insert(ModuleRecord::new(
        "ambassador",
        "ambassador.yaml.1",
        "ambassador.yaml.1",
        record(json!({"tls": {"server": {"secret": "fresh"}}})),
    ));

    let settings = IrConfig { tls_policy: TlsPolicyKind::Replace, ..IrConfig::default() };
    let ir = compile_with_store(&store, seeded_graph(TlsPolicyKind::Replace), &settings)?;

    let server = ir.graph.lookup_tls_context("server").expect("server context");
    assert_eq!(server.spec.secret.as_deref(), Some("fresh"));
    assert!(logs_contain("Created TLS context"));

    Ok(())
}
