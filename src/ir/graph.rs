//! The compilation graph
//!
//! Holds everything resolved so far in a pass: the legacy TLS module slot,
//! TLS contexts by name, first-class TLSContext resources, the filter chain,
//! the ordered mapping collection and provenance edges.
//!
//! Whether a TLS context registration is accepted is decided by the graph's
//! [`TlsContextPolicy`]; callers only see the boolean outcome.

use crate::config::TlsPolicyKind;
use crate::domain::TlsContextResource;
use crate::ir::buffer::BufferFilter;
use crate::ir::mapping::Mapping;
use crate::ir::provenance::{EntityRef, ProvenanceGraph, Relation};
use crate::ir::tls::{LegacyTlsModule, ResolvedTlsContext};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Decides whether a TLS context may take a name in the graph
pub trait TlsContextPolicy: fmt::Debug + Send + Sync {
    fn accept(&self, existing: Option<&ResolvedTlsContext>, candidate: &ResolvedTlsContext) -> bool;
}

/// The first context registered under a name keeps it
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstWins;

impl TlsContextPolicy for FirstWins {
    fn accept(&self, existing: Option<&ResolvedTlsContext>, _candidate: &ResolvedTlsContext) -> bool {
        existing.is_none()
    }
}

/// Every registration replaces the previous context
#[derive(Debug, Clone, Copy, Default)]
pub struct Replace;

impl TlsContextPolicy for Replace {
    fn accept(&self, _existing: Option<&ResolvedTlsContext>, _candidate: &ResolvedTlsContext) -> bool {
        true
    }
}

pub fn policy_for(kind: TlsPolicyKind) -> Arc<dyn TlsContextPolicy> {
    match kind {
        TlsPolicyKind::FirstWins => Arc::new(FirstWins),
        TlsPolicyKind::Replace => Arc::new(Replace),
    }
}

/// Single owned slot for the legacy TLS module.
///
/// [`TlsModuleSlot::set`] replaces the occupant outright; fields of the old
/// module never carry over.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct TlsModuleSlot {
    module: Option<LegacyTlsModule>,
}

impl TlsModuleSlot {
    /// Install a module, returning the one it displaced
    pub fn set(&mut self, module: LegacyTlsModule) -> Option<LegacyTlsModule> {
        self.module.replace(module)
    }

    pub fn get(&self) -> Option<&LegacyTlsModule> {
        self.module.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.module.is_some()
    }
}

/// Entry in the filter chain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IrFilter {
    Buffer(Arc<BufferFilter>),
}

#[derive(Debug, Clone, Serialize)]
pub struct IrGraph {
    #[serde(skip)]
    tls_policy: Arc<dyn TlsContextPolicy>,
    tls_module: TlsModuleSlot,
    tls_contexts: BTreeMap<String, ResolvedTlsContext>,
    tls_context_resources: Vec<TlsContextResource>,
    filters: Vec<IrFilter>,
    mappings: Vec<Mapping>,
    provenance: ProvenanceGraph,
}

impl Default for IrGraph {
    fn default() -> Self {
        Self::with_policy(Arc::new(FirstWins))
    }
}

impl IrGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(tls_policy: Arc<dyn TlsContextPolicy>) -> Self {
        Self {
            tls_policy,
            tls_module: TlsModuleSlot::default(),
            tls_contexts: BTreeMap::new(),
            tls_context_resources: Vec::new(),
            filters: Vec::new(),
            mappings: Vec::new(),
            provenance: ProvenanceGraph::default(),
        }
    }

    pub fn tls_module(&self) -> &TlsModuleSlot {
        &self.tls_module
    }

    pub fn tls_module_mut(&mut self) -> &mut TlsModuleSlot {
        &mut self.tls_module
    }

    /// Register a TLS context under its name; returns whether the policy accepted it
    pub fn register_tls_context(&mut self, context: ResolvedTlsContext) -> bool {
        let name = context.name.to_string();

        if !self.tls_policy.accept(self.tls_contexts.get(&name), &context) {
            return false;
        }

        self.tls_contexts.insert(name, context);
        true
    }

    pub fn lookup_tls_context(&self, name: &str) -> Option<&ResolvedTlsContext> {
        self.tls_contexts.get(name)
    }

    pub fn tls_contexts(&self) -> impl Iterator<Item = &ResolvedTlsContext> {
        self.tls_contexts.values()
    }

    pub fn add_tls_context_resource(&mut self, resource: TlsContextResource) {
        self.tls_context_resources.push(resource);
    }

    pub fn tls_context_resources(&self) -> &[TlsContextResource] {
        &self.tls_context_resources
    }

    pub fn append_filter(&mut self, filter: IrFilter) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[IrFilter] {
        &self.filters
    }

    pub fn insert_mapping(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn record_edge(&mut self, subject: EntityRef, relation: Relation, target: EntityRef) -> bool {
        self.provenance.record(subject, relation, target)
    }

    pub fn provenance(&self) -> &ProvenanceGraph {
        &self.provenance
    }
}
