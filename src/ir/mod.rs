//! # Intermediate Representation
//!
//! The IR is built per compile pass: ingested modules are read through a
//! [`ModuleStore`], entities are resolved and registered into an [`IrGraph`],
//! and problems are reported to a [`Diagnostics`] sink.
//!
//! ## Module Organization
//!
//! - `module_store`: named module lookup
//! - `graph`: TLS tables, filter chain, mappings, provenance
//! - `gateway`: the gateway descriptor and its resolution
//! - `tls`, `buffer`, `cors`, `mapping`: entities the descriptor builds
//! - `pass`: one full compile pass with staged graph writes

pub mod buffer;
pub mod cors;
pub mod diagnostics;
pub mod gateway;
pub mod graph;
pub mod mapping;
pub mod module_store;
pub mod pass;
pub mod provenance;
pub mod tls;

pub use buffer::BufferFilter;
pub use cors::CorsPolicy;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use gateway::{
    DescriptorState, GatewayDescriptor, LabelDomain, ProbeConfig, ProbeKind, ResolveContext,
    StatsdConfig, TRANSPARENT_KEYS,
};
pub use graph::{policy_for, FirstWins, IrFilter, IrGraph, Replace, TlsContextPolicy, TlsModuleSlot};
pub use mapping::Mapping;
pub use module_store::{InMemoryModuleStore, ModuleStore};
pub use pass::{compile, compile_with_store, CompiledIr};
pub use provenance::{EntityRef, ProvenanceEdge, ProvenanceGraph, Relation};
pub use tls::{LegacyTlsModule, ResolvedTlsContext, TlsContextSpec};
