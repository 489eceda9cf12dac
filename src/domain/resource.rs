//! Raw resource records as ingested from configuration sources
//!
//! Module records stay string-keyed: the gateway descriptor decides which keys
//! it understands. First-class `TLSContext` resources are typed because the
//! compiler reads their `hosts` binding directly.

use crate::domain::id::{EntityName, Location, ResourceKey};
use crate::errors::{IrError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A string-keyed configuration record
pub type Record = serde_json::Map<String, Value>;

/// Resource kind for configuration modules
pub const MODULE_KIND: &str = "Module";

/// Resource kind for first-class TLS contexts
pub const TLS_CONTEXT_KIND: &str = "TLSContext";

/// Truthiness of a loosely-typed configuration value.
///
/// Null, `false`, zero, and empty strings, lists and records are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// A named configuration module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub rkey: ResourceKey,
    pub name: EntityName,
    pub location: Location,
    #[serde(default)]
    pub config: Record,
}

impl ModuleRecord {
    pub fn new(
        name: impl Into<EntityName>,
        rkey: impl Into<ResourceKey>,
        location: impl Into<Location>,
        config: Record,
    ) -> Self {
        Self { rkey: rkey.into(), name: name.into(), location: location.into(), config }
    }

    /// Look up a key in the module's configuration
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }
}

/// An independently declared TLS context resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlsContextResource {
    pub rkey: ResourceKey,
    pub name: EntityName,
    pub location: Location,
    /// Hostnames this context terminates TLS for; `hosts:` with no value is none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(flatten)]
    pub extra: Record,
}

impl TlsContextResource {
    /// A context bound to at least one host terminates TLS
    pub fn is_termination_context(&self) -> bool {
        self.hosts.as_deref().is_some_and(|hosts| !hosts.is_empty())
    }
}

/// The ingested resources a compile pass works from
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceSet {
    modules: Vec<ModuleRecord>,
    tls_contexts: Vec<TlsContextResource>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, module: ModuleRecord) {
        self.modules.push(module);
    }

    pub fn add_tls_context(&mut self, context: TlsContextResource) {
        self.tls_contexts.push(context);
    }

    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    pub fn tls_contexts(&self) -> &[TlsContextResource] {
        &self.tls_contexts
    }

    /// Parse a multi-document YAML stream.
    ///
    /// `source` names the stream (usually the file name); documents without an
    /// explicit `rkey` or `location` get `<source>.<n>`, counting from 1.
    /// Kinds other than `Module` and `TLSContext` are skipped.
    pub fn from_yaml_str(source: &str, yaml: &str) -> Result<Self> {
        let mut set = Self::new();

        for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
            let value = Value::deserialize(document)
                .map_err(|e| IrError::from(e).context(format!("{}.{}", source, index + 1)))?;

            let mut fields = match value {
                Value::Null => continue,
                Value::Object(fields) => fields,
                _ => {
                    return Err(IrError::validation(format!(
                        "{}.{}: resource must be a mapping",
                        source,
                        index + 1
                    )))
                }
            };

            let default_id = format!("{}.{}", source, index + 1);
            let kind = fields.get("kind").and_then(Value::as_str).unwrap_or_default().to_string();

            match kind.as_str() {
                MODULE_KIND => set.add_module(module_from_fields(&mut fields, &default_id)?),
                TLS_CONTEXT_KIND => {
                    fields.remove("kind");
                    fields.remove("apiVersion");
                    fields.entry("rkey").or_insert_with(|| Value::String(default_id.clone()));
                    fields.entry("location").or_insert_with(|| Value::String(default_id.clone()));

                    let context: TlsContextResource = serde_json::from_value(Value::Object(fields))
                        .map_err(|e| IrError::from(e).context(default_id.clone()))?;
                    set.add_tls_context(context);
                }
                other => {
                    tracing::debug!(location = %default_id, kind = %other, "Skipping resource");
                }
            }
        }

        tracing::debug!(
            source = %source,
            modules = set.modules.len(),
            tls_contexts = set.tls_contexts.len(),
            "Resources ingested"
        );

        Ok(set)
    }
}

fn module_from_fields(fields: &mut Record, default_id: &str) -> Result<ModuleRecord> {
    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| IrError::validation_field(format!("{}: Module requires a name", default_id), "name"))?
        .to_string();

    let rkey = fields.get("rkey").and_then(Value::as_str).unwrap_or(default_id).to_string();
    let location = fields.get("location").and_then(Value::as_str).unwrap_or(default_id).to_string();

    let config = match fields.remove("config") {
        None | Some(Value::Null) => Record::new(),
        Some(Value::Object(config)) => config,
        Some(_) => {
            return Err(IrError::validation_field(
                format!("{}: Module '{}' config must be a mapping", default_id, name),
                "config",
            ))
        }
    };

    Ok(ModuleRecord::new(name, rkey, location, config))
}
