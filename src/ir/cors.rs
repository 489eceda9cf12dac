//! Gateway-wide CORS policy
//!
//! List-valued settings accept either a YAML list or a comma-separated string.
//! The policy keeps them as lists; [`CorsPolicy::joined`] renders the
//! comma-separated form the proxy expects.

use crate::domain::{EntityName, Location, ResourceKey};
use crate::errors::{IrError, Result};
use crate::ir::provenance::EntityRef;
use http::{header::HeaderName, Method};
use serde::Serialize;
use serde_json::Value;

pub const CORS_KIND: &str = "IRCORS";
pub const CORS_NAME: &str = "ir.cors";
const MAX_AGE_LIMIT_SECONDS: u64 = 315_576_000_000; // 10,000 years

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorsPolicy {
    pub rkey: ResourceKey,
    pub kind: String,
    pub name: EntityName,
    pub location: Location,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub origins: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_methods: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_headers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expose_headers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
}

impl CorsPolicy {
    /// Build the policy from the module's `cors` record
    pub fn build(raw: &Value, location: &Location) -> Result<Self> {
        let fields = raw.as_object().ok_or_else(|| invalid("cors must be a mapping"))?;

        let origins = string_list(fields.get("origins"), "origins")?;

        let allow_methods = string_list(fields.get("methods"), "methods")?
            .into_iter()
            .map(|method| {
                let method = method.to_ascii_uppercase();
                Method::from_bytes(method.as_bytes())
                    .map(|m| m.as_str().to_string())
                    .map_err(|_| invalid(format!("invalid HTTP method '{}'", method)))
            })
            .collect::<Result<Vec<_>>>()?;

        let allow_headers = header_list(fields.get("headers"), "headers")?;
        let expose_headers = header_list(fields.get("exposed_headers"), "exposed_headers")?;

        let allow_credentials = match fields.get("credentials") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => return Err(invalid(format!("credentials must be a boolean, got {}", other))),
        };

        let max_age = match fields.get("max_age") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let seconds = match value {
                    Value::Number(n) => n.as_u64(),
                    Value::String(s) => s.trim().parse::<u64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| invalid(format!("max_age must be a non-negative integer, got {}", value)))?;

                if seconds > MAX_AGE_LIMIT_SECONDS {
                    return Err(invalid(format!(
                        "max_age cannot exceed {} seconds",
                        MAX_AGE_LIMIT_SECONDS
                    )));
                }
                Some(seconds)
            }
        };

        Ok(Self {
            rkey: CORS_NAME.into(),
            kind: CORS_KIND.to_string(),
            name: CORS_NAME.into(),
            location: location.clone(),
            origins,
            allow_methods,
            allow_headers,
            expose_headers,
            allow_credentials,
            max_age,
        })
    }

    /// Render a list setting in comma-separated form
    pub fn joined(values: &[String]) -> String {
        values.join(", ")
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind.clone(), self.name.clone(), self.rkey.clone())
    }
}

fn invalid(message: impl Into<String>) -> IrError {
    IrError::resource(CORS_KIND, CORS_NAME, message)
}

fn string_list(value: Option<&Value>, field: &str) -> Result<Vec<String>> {
    let items: Vec<String> = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(invalid(format!("{} entries must be strings, got {}", field, other))),
            })
            .collect::<Result<_>>()?,
        Some(other) => {
            return Err(invalid(format!("{} must be a string or a list, got {}", field, other)))
        }
    };

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

fn header_list(value: Option<&Value>, field: &str) -> Result<Vec<String>> {
    let headers = string_list(value, field)?;
    for header in &headers {
        HeaderName::from_bytes(header.as_bytes())
            .map_err(|_| invalid(format!("invalid header name '{}' in {}", header, field)))?;
    }
    Ok(headers)
}
