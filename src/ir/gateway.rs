//! The gateway descriptor
//!
//! One descriptor per compile pass holds the gateway-wide settings: ports,
//! forwarding behaviour, label defaults, the health/diagnostics probes, and the
//! gateway-wide buffer and CORS entities.
//!
//! [`GatewayDescriptor::resolve`] merges the gateway module into the descriptor:
//!
//! 1. TLS: the module's nested `tls` record replaces the graph's legacy TLS
//!    module; every context entry in it is registered into the graph. Any
//!    termination-capable context, legacy or first-class, moves the service
//!    port to 443.
//! 2. Whitelisted keys are copied over wholesale, then the label domain and
//!    label table are forced to their defaults if left empty.
//! 3. Enabled probes get their default prefix, rewrite and service.
//! 4. Buffer, then CORS, are built and registered. An invalid one fails the
//!    whole resolution; graph mutations already made are not undone.
//!
//! [`GatewayDescriptor::emit_probe_mappings`] then turns enabled probes into
//! route mappings, in liveness, readiness, diagnostics order.

use crate::config::IrConfig;
use crate::domain::{is_truthy, EntityName, Location, ModuleRecord, Record, ResourceKey};
use crate::errors::{IrError, Result};
use crate::ir::buffer::BufferFilter;
use crate::ir::cors::CorsPolicy;
use crate::ir::diagnostics::Diagnostics;
use crate::ir::graph::{IrFilter, IrGraph};
use crate::ir::mapping::Mapping;
use crate::ir::module_store::ModuleStore;
use crate::ir::provenance::{EntityRef, Relation};
use crate::ir::tls::{LegacyTlsModule, ResolvedTlsContext};
use crate::ir_span;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const DESCRIPTOR_KIND: &str = "IRAmbassador";
pub const DESCRIPTOR_NAME: &str = "ir.ambassador";

/// Location of entities not read from any source
pub const INTERNAL_LOCATION: &str = "--internal--";

pub const DEFAULT_SERVICE_PORT: u16 = 80;
pub const TLS_SERVICE_PORT: u16 = 443;
pub const DEFAULT_ADMIN_PORT: u16 = 8001;
pub const DEFAULT_DIAG_PORT: u16 = 8877;

/// Name of the TLS context that carries client certificate settings
pub const CLIENT_TLS_CONTEXT: &str = "client";

/// Module keys copied verbatim onto the descriptor
pub const TRANSPARENT_KEYS: [&str; 13] = [
    "admin_port",
    "auth_enabled",
    "default_label_domain",
    "default_labels",
    "diag_port",
    "diagnostics",
    "liveness_probe",
    "readiness_probe",
    "service_port",
    "statsd",
    "use_proxy_proto",
    "use_remote_address",
    "x_forwarded_proto_redirect",
];

/// The three synthetic probe routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Liveness,
    Readiness,
    Diagnostics,
}

impl ProbeKind {
    /// Emission order
    pub const ALL: [ProbeKind; 3] = [ProbeKind::Liveness, ProbeKind::Readiness, ProbeKind::Diagnostics];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Liveness => "liveness",
            ProbeKind::Readiness => "readiness",
            ProbeKind::Diagnostics => "diagnostics",
        }
    }

    /// Default `(prefix, rewrite)` for the probe
    pub fn default_route(&self) -> (&'static str, &'static str) {
        match self {
            ProbeKind::Liveness => ("/ambassador/v0/check_alive", "/ambassador/v0/check_alive"),
            ProbeKind::Readiness => ("/ambassador/v0/check_ready", "/ambassador/v0/check_ready"),
            ProbeKind::Diagnostics => ("/ambassador/v0/", "/ambassador/v0/"),
        }
    }

    pub fn mapping_name(&self) -> String {
        format!("internal_{}_probe_mapping", self.as_str())
    }
}

/// A probe record. Unknown keys are kept as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Any truthy value turns the probe on
    #[serde(default, deserialize_with = "truthy")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(flatten)]
    pub extra: Record,
}

impl ProbeConfig {
    pub fn enabled() -> Self {
        Self { enabled: true, ..Default::default() }
    }

    fn fill_defaults(&mut self, kind: ProbeKind, diag_service: &str) {
        let (prefix, rewrite) = kind.default_route();
        fill(&mut self.prefix, prefix);
        fill(&mut self.rewrite, rewrite);
        fill(&mut self.service, diag_service);
    }
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Value::deserialize(deserializer).map(|value| is_truthy(&value))
}

fn fill(slot: &mut Option<String>, default: &str) {
    if slot.as_deref().map_or(true, str::is_empty) {
        *slot = Some(default.to_string());
    }
}

/// Per-domain label settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_prefix: Option<String>,
    #[serde(flatten)]
    pub extra: Record,
}

/// StatsD export settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsdConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Record,
}

/// Lifecycle of a descriptor within one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorState {
    Uninitialized,
    Ready,
    Finalized,
    Failed,
}

/// What `resolve` reads and writes besides the descriptor itself
pub struct ResolveContext<'a> {
    pub modules: &'a dyn ModuleStore,
    pub graph: &'a mut IrGraph,
    pub settings: &'a IrConfig,
    pub diagnostics: &'a mut Diagnostics,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayDescriptor {
    pub rkey: ResourceKey,
    pub kind: String,
    pub name: EntityName,
    pub location: Location,

    pub service_port: u16,
    pub admin_port: u16,
    pub diag_port: u16,
    pub auth_enabled: Option<bool>,
    pub use_proxy_proto: bool,
    pub use_remote_address: bool,
    pub x_forwarded_proto_redirect: bool,

    pub default_label_domain: String,
    pub default_labels: BTreeMap<String, LabelDomain>,

    pub liveness_probe: Option<ProbeConfig>,
    pub readiness_probe: Option<ProbeConfig>,
    pub diagnostics: Option<ProbeConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub statsd: Option<StatsdConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Arc<BufferFilter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsPolicy>,

    state: DescriptorState,
}

impl Default for GatewayDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayDescriptor {
    pub fn new() -> Self {
        Self {
            rkey: DESCRIPTOR_NAME.into(),
            kind: DESCRIPTOR_KIND.to_string(),
            name: DESCRIPTOR_NAME.into(),
            location: INTERNAL_LOCATION.into(),
            service_port: DEFAULT_SERVICE_PORT,
            admin_port: DEFAULT_ADMIN_PORT,
            diag_port: DEFAULT_DIAG_PORT,
            auth_enabled: None,
            use_proxy_proto: false,
            use_remote_address: true,
            x_forwarded_proto_redirect: false,
            default_label_domain: String::new(),
            default_labels: BTreeMap::new(),
            liveness_probe: Some(ProbeConfig::enabled()),
            readiness_probe: Some(ProbeConfig::enabled()),
            diagnostics: Some(ProbeConfig::enabled()),
            statsd: None,
            buffer: None,
            cors: None,
            state: DescriptorState::Uninitialized,
        }
    }

    pub fn state(&self) -> DescriptorState {
        self.state
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind.clone(), self.name.clone(), self.rkey.clone())
    }

    pub fn probe(&self, kind: ProbeKind) -> Option<&ProbeConfig> {
        match kind {
            ProbeKind::Liveness => self.liveness_probe.as_ref(),
            ProbeKind::Readiness => self.readiness_probe.as_ref(),
            ProbeKind::Diagnostics => self.diagnostics.as_ref(),
        }
    }

    fn probe_mut(&mut self, kind: ProbeKind) -> Option<&mut ProbeConfig> {
        match kind {
            ProbeKind::Liveness => self.liveness_probe.as_mut(),
            ProbeKind::Readiness => self.readiness_probe.as_mut(),
            ProbeKind::Diagnostics => self.diagnostics.as_mut(),
        }
    }

    /// Merge the gateway module into this descriptor.
    ///
    /// `Ok(())` leaves the descriptor `Ready`. An `Err` is a hard failure: the
    /// descriptor is `Failed` and whatever it already wrote into the graph
    /// stays there for the caller to discard.
    pub fn resolve(&mut self, ctx: &mut ResolveContext<'_>) -> Result<()> {
        if self.state != DescriptorState::Uninitialized {
            return Err(IrError::invalid_state(format!(
                "{} cannot be resolved in state {:?}",
                self.name, self.state
            )));
        }

        let span = ir_span!(self.kind, self.name, module = %ctx.settings.module_name);
        let _enter = span.enter();

        match self.resolve_module(ctx) {
            Ok(()) => {
                self.state = DescriptorState::Ready;
                debug!(service_port = self.service_port, "Gateway descriptor resolved");
                Ok(())
            }
            Err(err) => {
                self.state = DescriptorState::Failed;
                error!(error = %err, "Gateway descriptor resolution failed");
                Err(err)
            }
        }
    }

    fn resolve_module(&mut self, ctx: &mut ResolveContext<'_>) -> Result<()> {
        let modules = ctx.modules;
        let module = modules.get_module(&ctx.settings.module_name);

        if let Some(module) = module {
            // Everything derived from the descriptor is attributed to the module.
            self.rkey = module.rkey.clone();
            self.location = module.location.clone();

            let module_ref = EntityRef::new("Module", module.name.clone(), module.rkey.clone());
            ctx.graph.record_edge(self.entity_ref(), Relation::SourcedBy, module_ref.clone());
            ctx.graph.record_edge(self.entity_ref(), Relation::ReferencedBy, module_ref);
        }

        self.resolve_tls(module, ctx);

        let rejected = match module {
            Some(module) => self.apply_transparent_keys(module, ctx.diagnostics),
            None => Vec::new(),
        };
        self.apply_label_defaults(&ctx.settings.label_domain_sentinel);

        // Looked up again from the module rather than taken from `diag_port`.
        let diag_port = match modules.module_lookup(&ctx.settings.module_name, "diag_port") {
            None => DEFAULT_DIAG_PORT,
            Some(value) => value
                .as_u64()
                .and_then(|port| u16::try_from(port).ok())
                .unwrap_or_else(|| {
                    if !rejected.contains(&"diag_port") {
                        ctx.diagnostics.notice(
                            &self.entity_ref(),
                            format!("diag_port {} is not a valid port, using {}", value, DEFAULT_DIAG_PORT),
                        );
                    }
                    DEFAULT_DIAG_PORT
                }),
        };
        self.default_probes(&format!("127.0.0.1:{}", diag_port));

        if let Some(module) = module {
            self.register_buffer(module, ctx.graph)?;
            self.register_cors(module, ctx.graph)?;
        }

        Ok(())
    }

    fn resolve_tls(&mut self, module: Option<&ModuleRecord>, ctx: &mut ResolveContext<'_>) {
        if let Some(module) = module {
            match module.get("tls") {
                Some(Value::Object(tls)) if !tls.is_empty() => {
                    let legacy = LegacyTlsModule::from_nested(module, tls);
                    if let Some(previous) = ctx.graph.tls_module_mut().set(legacy) {
                        debug!(replaced = %previous.name, "Replacing existing TLS module");
                    }
                }
                Some(value) if is_truthy(value) => {
                    ctx.diagnostics.notice(&self.entity_ref(), "tls must be a mapping; ignoring it");
                }
                _ => {}
            }
        }

        if let Some(legacy) = ctx.graph.tls_module().get().cloned() {
            debug!(
                tls_module = %serde_json::to_string(&legacy).unwrap_or_default(),
                "Final TLS module"
            );

            for (ctx_name, fields) in legacy.contexts() {
                let fallback = if legacy.location.is_empty() { &self.location } else { &legacy.location };

                let context = match ResolvedTlsContext::build(ctx_name, fallback, fields) {
                    Ok(context) => context,
                    Err(err) => {
                        ctx.diagnostics.notice(&self.entity_ref(), err.to_string());
                        continue;
                    }
                };

                let valid_tls = context.valid_tls;
                let location = context.location.clone();

                if ctx.graph.register_tls_context(context) {
                    debug!(context = %ctx_name, %location, "Created TLS context");
                } else {
                    debug!(context = %ctx_name, %location, "Not updating TLS context");
                }

                if valid_tls {
                    self.enable_tls_termination(ctx_name);
                }
            }
        }

        let termination_contexts: Vec<String> = ctx
            .graph
            .tls_context_resources()
            .iter()
            .filter(|resource| resource.is_termination_context())
            .map(|resource| resource.name.to_string())
            .collect();

        for name in termination_contexts {
            self.enable_tls_termination(&name);
        }

        if ctx.graph.lookup_tls_context(CLIENT_TLS_CONTEXT).is_some() {
            debug!("TLS client certs enabled");
        }
    }

    fn enable_tls_termination(&mut self, context: &str) {
        debug!(%context, "TLS termination enabled");
        self.service_port = TLS_SERVICE_PORT;
    }

    /// Copy every whitelisted key present in the module. Returns the keys
    /// whose values were rejected.
    fn apply_transparent_keys(
        &mut self,
        module: &ModuleRecord,
        diagnostics: &mut Diagnostics,
    ) -> Vec<&'static str> {
        let mut rejected = Vec::new();

        for key in TRANSPARENT_KEYS {
            let Some(value) = module.get(key) else {
                continue;
            };

            if let Err(err) = self.apply_transparent_key(key, value) {
                diagnostics.notice(&self.entity_ref(), format!("{}; keeping previous value", err));
                rejected.push(key);
            }
        }

        rejected
    }

    /// Overwrite the field named `key` with `value`, whole-value.
    pub fn apply_transparent_key(&mut self, key: &str, value: &Value) -> Result<()> {
        match key {
            "admin_port" => self.admin_port = parse_field(key, value)?,
            "auth_enabled" => self.auth_enabled = parse_field(key, value)?,
            "default_label_domain" => {
                self.default_label_domain = parse_field::<Option<String>>(key, value)?.unwrap_or_default()
            }
            "default_labels" => {
                self.default_labels = parse_field::<Option<_>>(key, value)?.unwrap_or_default()
            }
            "diag_port" => self.diag_port = parse_field(key, value)?,
            "diagnostics" => self.diagnostics = parse_field(key, value)?,
            "liveness_probe" => self.liveness_probe = parse_field(key, value)?,
            "readiness_probe" => self.readiness_probe = parse_field(key, value)?,
            "service_port" => self.service_port = parse_field(key, value)?,
            "statsd" => self.statsd = parse_field(key, value)?,
            "use_proxy_proto" => self.use_proxy_proto = parse_field(key, value)?,
            "use_remote_address" => self.use_remote_address = parse_field(key, value)?,
            "x_forwarded_proto_redirect" => self.x_forwarded_proto_redirect = parse_field(key, value)?,
            _ => {
                return Err(IrError::validation_field(
                    format!("'{}' is not a transparent key", key),
                    key,
                ))
            }
        }

        Ok(())
    }

    fn apply_label_defaults(&mut self, sentinel: &str) {
        if self.default_label_domain.is_empty() {
            self.default_label_domain = sentinel.to_string();
        }
        // `default_labels` is never absent; an empty table is already the default.
    }

    fn default_probes(&mut self, diag_service: &str) {
        for kind in ProbeKind::ALL {
            if let Some(probe) = self.probe_mut(kind) {
                if probe.enabled {
                    probe.fill_defaults(kind, diag_service);
                }
            }
        }
    }

    fn register_buffer(&mut self, module: &ModuleRecord, graph: &mut IrGraph) -> Result<()> {
        let Some(raw) = module.get("buffer") else {
            return Ok(());
        };

        let buffer = Arc::new(BufferFilter::build(raw, &self.location)?);
        graph.append_filter(IrFilter::Buffer(Arc::clone(&buffer)));
        graph.record_edge(buffer.entity_ref(), Relation::SourcedBy, self.entity_ref());
        self.buffer = Some(buffer);

        Ok(())
    }

    fn register_cors(&mut self, module: &ModuleRecord, graph: &mut IrGraph) -> Result<()> {
        let Some(raw) = module.get("cors") else {
            return Ok(());
        };

        let cors = CorsPolicy::build(raw, &self.location)?;
        graph.record_edge(cors.entity_ref(), Relation::ReferencedBy, self.entity_ref());
        self.cors = Some(cors);

        Ok(())
    }

    /// Insert one mapping per enabled probe, in liveness, readiness,
    /// diagnostics order. Returns how many were inserted.
    pub fn emit_probe_mappings(&mut self, graph: &mut IrGraph) -> Result<usize> {
        if self.state != DescriptorState::Ready {
            return Err(IrError::invalid_state(format!(
                "{} cannot emit probe mappings in state {:?}",
                self.name, self.state
            )));
        }

        let mut emitted = 0;

        for kind in ProbeKind::ALL {
            let Some(probe) = self.probe(kind).filter(|probe| probe.enabled) else {
                continue;
            };

            let mapping = Mapping::new(
                self.rkey.clone(),
                kind.mapping_name(),
                self.location.clone(),
                probe.prefix.clone().unwrap_or_default(),
                probe.rewrite.clone().unwrap_or_default(),
                probe.service.clone().unwrap_or_default(),
            );

            graph.record_edge(mapping.entity_ref(), Relation::SourcedBy, self.entity_ref());
            graph.record_edge(mapping.entity_ref(), Relation::ReferencedBy, self.entity_ref());
            debug!(mapping = %mapping.name, prefix = %mapping.prefix, "Adding probe mapping");
            graph.insert_mapping(mapping);
            emitted += 1;
        }

        self.state = DescriptorState::Finalized;
        Ok(emitted)
    }

    pub fn default_label_domain(&self) -> &str {
        &self.default_label_domain
    }

    fn label_domain(&self, domain: Option<&str>) -> Option<&LabelDomain> {
        let domain = domain.filter(|d| !d.is_empty()).unwrap_or(self.default_label_domain.as_str());
        let info = self.default_labels.get(domain);

        info!(%domain, found = info.is_some(), "default_labels lookup");
        info
    }

    /// The `defaults` list of a label domain (the default domain when `None`)
    pub fn default_labels_for(&self, domain: Option<&str>) -> Option<&[Value]> {
        self.label_domain(domain).and_then(|info| info.defaults.as_deref())
    }

    /// The `label_prefix` of a label domain (the default domain when `None`)
    pub fn default_label_prefix_for(&self, domain: Option<&str>) -> Option<&str> {
        self.label_domain(domain).and_then(|info| info.label_prefix.as_deref())
    }
}

fn parse_field<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| IrError::validation_field(format!("invalid {}: {}", key, e), key))
}
