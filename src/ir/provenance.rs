//! Provenance edges between IR entities
//!
//! Edges are data, not ownership: an edge `(mapping, SourcedBy, descriptor)`
//! says the mapping was derived from the descriptor, nothing more. They feed
//! diagnostics output.

use crate::domain::{EntityName, ResourceKey};
use serde::Serialize;
use std::fmt;

/// Identity of an IR entity for provenance purposes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRef {
    pub kind: String,
    pub name: EntityName,
    pub rkey: ResourceKey,
}

impl EntityRef {
    pub fn new(kind: impl Into<String>, name: impl Into<EntityName>, rkey: impl Into<ResourceKey>) -> Self {
        Self { kind: kind.into(), name: name.into(), rkey: rkey.into() }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.name, self.rkey)
    }
}

/// How the subject of an edge relates to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The subject was derived from the target
    SourcedBy,
    /// The target refers to the subject
    ReferencedBy,
}

/// A directed edge: `subject` is `relation` `target`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProvenanceEdge {
    pub subject: EntityRef,
    pub relation: Relation,
    pub target: EntityRef,
}

/// Insertion-ordered, duplicate-free edge set
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ProvenanceGraph {
    edges: Vec<ProvenanceEdge>,
}

impl ProvenanceGraph {
    /// Record an edge; returns false if it was already present
    pub fn record(&mut self, subject: EntityRef, relation: Relation, target: EntityRef) -> bool {
        let edge = ProvenanceEdge { subject, relation, target };
        if self.edges.contains(&edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn edges(&self) -> &[ProvenanceEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Entities the subject was derived from
    pub fn sources_of<'a>(&'a self, subject: &'a EntityRef) -> impl Iterator<Item = &'a EntityRef> + 'a {
        self.targets(subject, Relation::SourcedBy)
    }

    /// Entities that refer to the subject
    pub fn referencers_of<'a>(&'a self, subject: &'a EntityRef) -> impl Iterator<Item = &'a EntityRef> + 'a {
        self.targets(subject, Relation::ReferencedBy)
    }

    fn targets<'a>(
        &'a self,
        subject: &'a EntityRef,
        relation: Relation,
    ) -> impl Iterator<Item = &'a EntityRef> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.relation == relation && &edge.subject == subject)
            .map(|edge| &edge.target)
    }
}
