//! Domain layer
//!
//! Raw, ingested configuration with zero IR logic: module records, first-class
//! TLS context resources, and the identifier newtypes everything is keyed by.
//!
//! ## Module Organization
//!
//! - `id`: Type-safe identifiers with NewType pattern
//! - `resource`: Module and TLSContext records, YAML ingestion

pub mod id;
pub mod resource;

pub use id::{EntityName, Location, ResourceKey};
pub use resource::{
    is_truthy, ModuleRecord, Record, ResourceSet, TlsContextResource, MODULE_KIND,
    TLS_CONTEXT_KIND,
};
