//! TLS entities: the legacy TLS module and resolved TLS contexts
//!
//! The legacy module is the older nested style, where a `tls` record holds
//! one sub-record per context (`server`, `client`, ...). Each sub-record becomes
//! a [`ResolvedTlsContext`] registered into the graph by name.

use crate::domain::{EntityName, Location, ModuleRecord, Record, ResourceKey, MODULE_KIND};
use crate::errors::{IrError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entries whose name starts with this character are not contexts
pub const RESERVED_ENTRY_PREFIX: char = '_';

/// Name given to a legacy module lifted out of the gateway module's `tls` record
pub const TLS_FROM_MODULE_NAME: &str = "tls-from-ambassador-module";

/// Kind reported by resolved TLS contexts
pub const TLS_CONTEXT_ENTITY_KIND: &str = "IREnvoyTLS";

/// TLS settings in the older single-module style
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyTlsModule {
    pub rkey: ResourceKey,
    pub kind: String,
    pub name: EntityName,
    pub location: Location,
    /// Everything except the reserved identity fields
    pub entries: Record,
}

impl LegacyTlsModule {
    /// Lift a nested `tls` record out of its owning module.
    ///
    /// `rkey`, `kind`, `name` and `location` are taken from the record when
    /// present (and removed from the entries), else inherited from the owner.
    pub fn from_nested(owner: &ModuleRecord, tls: &Record) -> Self {
        let mut entries = tls.clone();

        let rkey = pop_string(&mut entries, "rkey").unwrap_or_else(|| owner.rkey.to_string());
        let kind = pop_string(&mut entries, "kind").unwrap_or_else(|| MODULE_KIND.to_string());
        let name = pop_string(&mut entries, "name").unwrap_or_else(|| TLS_FROM_MODULE_NAME.to_string());
        let location =
            pop_string(&mut entries, "location").unwrap_or_else(|| owner.location.to_string());

        Self {
            rkey: rkey.into(),
            kind,
            name: name.into(),
            location: location.into(),
            entries,
        }
    }

    /// A standalone `tls` module: its whole config is the entry table.
    pub fn from_module(module: &ModuleRecord) -> Self {
        Self {
            rkey: module.rkey.clone(),
            kind: MODULE_KIND.to_string(),
            name: module.name.clone(),
            location: module.location.clone(),
            entries: module.config.clone(),
        }
    }

    /// Context entries: non-reserved names whose value is a record
    pub fn contexts(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.entries.iter().filter_map(|(name, value)| {
            if name.starts_with(RESERVED_ENTRY_PREFIX) {
                return None;
            }
            value.as_object().map(|record| (name.as_str(), record))
        })
    }
}

fn pop_string(record: &mut Record, key: &str) -> Option<String> {
    match record.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Fields of one TLS context as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsContextSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_chain_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cacert_chain_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpn_protocols: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_cleartext_from: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Record,
}

/// A named TLS context materialized into the graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTlsContext {
    pub name: EntityName,
    pub location: Location,
    #[serde(flatten)]
    pub spec: TlsContextSpec,
    /// Whether the context carries enough material to terminate TLS
    pub valid_tls: bool,
}

impl ResolvedTlsContext {
    /// Build a context from its configuration record.
    ///
    /// A `location` key inside the record overrides the supplied fallback.
    pub fn build(name: &str, fallback_location: &Location, fields: &Record) -> Result<Self> {
        let mut fields = fields.clone();
        let location = pop_string(&mut fields, "location")
            .map(Location::from)
            .unwrap_or_else(|| fallback_location.clone());

        let spec: TlsContextSpec = serde_json::from_value(Value::Object(fields))
            .map_err(|e| IrError::resource(TLS_CONTEXT_ENTITY_KIND, name, e.to_string()))?;

        let valid_tls = Self::terminates(&spec);

        Ok(Self { name: name.into(), location, spec, valid_tls })
    }

    fn terminates(spec: &TlsContextSpec) -> bool {
        if spec.enabled == Some(false) {
            return false;
        }

        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

        present(&spec.secret) || (present(&spec.cert_chain_file) && present(&spec.private_key_file))
    }
}
