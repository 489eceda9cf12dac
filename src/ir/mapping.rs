//! Route mappings synthesized by the compiler

use crate::domain::{EntityName, Location, ResourceKey};
use crate::ir::provenance::EntityRef;
use serde::Serialize;

pub const MAPPING_KIND: &str = "IRMapping";

/// A prefix route to a `host:port` service, with a path rewrite
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mapping {
    pub rkey: ResourceKey,
    pub kind: String,
    pub name: EntityName,
    pub location: Location,
    pub prefix: String,
    pub rewrite: String,
    pub service: String,
}

impl Mapping {
    pub fn new(
        rkey: ResourceKey,
        name: impl Into<EntityName>,
        location: Location,
        prefix: impl Into<String>,
        rewrite: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            rkey,
            kind: MAPPING_KIND.to_string(),
            name: name.into(),
            location,
            prefix: prefix.into(),
            rewrite: rewrite.into(),
            service: service.into(),
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind.clone(), self.name.clone(), self.rkey.clone())
    }
}
