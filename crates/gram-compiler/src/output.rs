//! Output shaping
//!
//! The compiled model serializes with every optional field present. Before
//! it leaves the compiler, `null` values and empty lists are pruned at every
//! depth so consumers only see what the recipe actually says.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::model::Compilation;

/// Drop `null` values and empty arrays recursively.
///
/// Returns `None` when the value itself should disappear. Empty objects are
/// kept.
pub fn sanitize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => {
            let items: Vec<Value> = items.into_iter().filter_map(sanitize).collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        Value::Object(map) => Some(Value::Object(
            map.into_iter()
                .filter_map(|(key, value)| sanitize(value).map(|value| (key, value)))
                .collect(),
        )),
        other => Some(other),
    }
}

impl Compilation {
    /// Sanitized JSON value
    pub fn to_value(&self) -> Result<Value> {
        let value = serde_json::to_value(self)?;
        Ok(sanitize(value).unwrap_or_else(|| Value::Object(Default::default())))
    }

    /// Sanitized JSON text
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let value = self.to_value()?;
        let json = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(json)
    }

    /// SHA-256 of the compact sanitized JSON, hex encoded
    pub fn fingerprint(&self) -> Result<String> {
        let json = self.to_json(false)?;
        Ok(hex::encode(Sha256::digest(json.as_bytes())))
    }
}
