//! Request buffering filter

use crate::domain::{is_truthy, EntityName, Location, ResourceKey};
use crate::errors::{IrError, Result};
use crate::ir::provenance::EntityRef;
use serde::Serialize;
use serde_json::Value;

pub const BUFFER_KIND: &str = "ir.buffer";
pub const BUFFER_NAME: &str = "ir.buffer";

/// Buffers whole requests up to `max_request_bytes` before proxying
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BufferFilter {
    pub rkey: ResourceKey,
    pub kind: String,
    pub name: EntityName,
    pub location: Location,
    pub max_request_bytes: u32,
}

impl BufferFilter {
    /// Build the filter from the module's `buffer` record.
    ///
    /// `max_request_bytes` is required and must be a positive integer.
    /// `max_request_time` is no longer supported and is dropped with a warning.
    pub fn build(raw: &Value, location: &Location) -> Result<Self> {
        let fields = raw
            .as_object()
            .ok_or_else(|| IrError::resource(BUFFER_KIND, BUFFER_NAME, "buffer must be a mapping"))?;

        let max_request_bytes = match fields.get("max_request_bytes") {
            None | Some(Value::Null) => {
                return Err(IrError::resource(
                    BUFFER_KIND,
                    BUFFER_NAME,
                    "missing required field: max_request_bytes",
                ))
            }
            Some(value) => value
                .as_u64()
                .and_then(|bytes| u32::try_from(bytes).ok())
                .filter(|bytes| *bytes > 0)
                .ok_or_else(|| {
                    IrError::resource(
                        BUFFER_KIND,
                        BUFFER_NAME,
                        format!("max_request_bytes must be a positive 32-bit integer, got {}", value),
                    )
                })?,
        };

        if fields.get("max_request_time").is_some_and(is_truthy) {
            tracing::warn!(
                location = %location,
                "buffer.max_request_time is no longer supported and will be ignored"
            );
        }

        Ok(Self {
            rkey: BUFFER_NAME.into(),
            kind: BUFFER_KIND.to_string(),
            name: BUFFER_NAME.into(),
            location: location.clone(),
            max_request_bytes,
        })
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind.clone(), self.name.clone(), self.rkey.clone())
    }
}
