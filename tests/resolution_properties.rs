//! Property tests for descriptor resolution
//!
//! Port escalation, label-domain defaulting and probe-mapping counts must hold
//! for any module record, not just the fixtures.

use gateway_ir::domain::{ModuleRecord, TlsContextResource};
use gateway_ir::{compile, IrConfig, ResourceSet};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn module_resources(config: Map<String, Value>) -> ResourceSet {
    let mut set = ResourceSet::new();
    set.add_module(ModuleRecord::new("ambassador", "prop.yaml.1", "prop.yaml.1", config));
    set
}

fn compile_module(config: Map<String, Value>) -> gateway_ir::CompiledIr {
    compile(&module_resources(config), &IrConfig::default()).unwrap()
}

fn probe(enabled: bool) -> Value {
    json!({ "enabled": enabled })
}

proptest! {
    #[test]
    fn service_port_stays_cleartext_without_tls(
        admin_port in 1u16..,
        use_proxy_proto in any::<bool>(),
    ) {
        let mut config = Map::new();
        config.insert("admin_port".into(), json!(admin_port));
        config.insert("use_proxy_proto".into(), json!(use_proxy_proto));

        let ir = compile_module(config);
        prop_assert_eq!(ir.ambassador.unwrap().service_port, 80);
    }

    #[test]
    fn valid_legacy_context_escalates_port(
        name in "[a-z][a-z0-9-]{0,15}",
        secret in "[a-z0-9-]{1,32}",
    ) {
        let mut config = Map::new();
        config.insert("tls".into(), json!({ name.clone(): { "secret": secret } }));

        let ir = compile_module(config);
        prop_assert_eq!(ir.ambassador.unwrap().service_port, 443);
        prop_assert!(ir.graph.lookup_tls_context(&name).unwrap().valid_tls);
    }

    #[test]
    fn disabled_context_never_escalates(
        name in "[a-z][a-z0-9-]{0,15}",
        secret in "[a-z0-9-]{1,32}",
    ) {
        let mut config = Map::new();
        config.insert("tls".into(), json!({ name: { "enabled": false, "secret": secret } }));

        let ir = compile_module(config);
        prop_assert_eq!(ir.ambassador.unwrap().service_port, 80);
    }

    #[test]
    fn hosted_context_escalates_regardless_of_legacy_tls(
        host in "[a-z]{1,12}\\.example\\.com",
        legacy in prop::option::of(prop_oneof![
            Just(json!({ "enabled": false, "secret": "legacy" })),
            Just(json!({ "cacert_chain_file": "/etc/cacert/tls.crt" })),
            Just(json!({ "cert_chain_file": "/etc/certs/tls.crt" })),
        ]),
    ) {
        let mut config = Map::new();
        if let Some(entry) = legacy {
            config.insert("tls".into(), json!({ "server": entry }));
        }

        let mut set = module_resources(config);
        set.add_tls_context(TlsContextResource {
            rkey: "ctx.yaml.1".into(),
            name: "edge".into(),
            location: "ctx.yaml.1".into(),
            hosts: Some(vec![host]),
            secret: Some("edge-cert".to_string()),
            extra: Default::default(),
        });

        let ir = compile(&set, &IrConfig::default()).unwrap();
        prop_assert_eq!(ir.ambassador.unwrap().service_port, 443);
    }

    #[test]
    fn label_domain_is_never_empty(domain in prop::option::of("[a-z]{0,12}")) {
        let mut config = Map::new();
        if let Some(domain) = &domain {
            config.insert("default_label_domain".into(), json!(domain));
        }

        let ir = compile_module(config);
        let descriptor = ir.ambassador.unwrap();
        prop_assert!(!descriptor.default_label_domain().is_empty());

        match domain.filter(|d| !d.is_empty()) {
            Some(domain) => prop_assert_eq!(descriptor.default_label_domain(), domain.as_str()),
            None => prop_assert_eq!(descriptor.default_label_domain(), "ambassador"),
        }
    }

    #[test]
    fn one_mapping_per_enabled_probe(
        liveness in any::<bool>(),
        readiness in any::<bool>(),
        diagnostics in any::<bool>(),
        diag_port in 1u16..,
    ) {
        let mut config = Map::new();
        config.insert("liveness_probe".into(), probe(liveness));
        config.insert("readiness_probe".into(), probe(readiness));
        config.insert("diagnostics".into(), probe(diagnostics));
        config.insert("diag_port".into(), json!(diag_port));

        let ir = compile_module(config);
        let expected = [liveness, readiness, diagnostics].iter().filter(|on| **on).count();
        let service = format!("127.0.0.1:{}", diag_port);

        prop_assert_eq!(ir.graph.mappings().len(), expected);
        prop_assert!(ir.graph.mappings().iter().all(|m| m.service == service));
    }
}
