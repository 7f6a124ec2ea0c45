//! ABI handling
//!
//! Provides the [`Abi`] struct: an ordered list of raw ABI entries validated
//! at the parse boundary, with facet merging and order-independent content
//! hashing.

use std::collections::HashSet;

use alloy::primitives::keccak256;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};

// =============================================================================
// Abi Struct
// =============================================================================

/// A contract ABI as a list of JSON entry objects.
///
/// Entries are kept verbatim so that merging and hashing see exactly what the
/// compiler emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Abi(Vec<Value>);

impl Abi {
    /// Parse a JSON ABI string
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::InvalidAbi(format!("Failed to parse ABI: {}", e)))?;
        Self::from_value(&value)
    }

    /// Build from a JSON value, which must be an array of objects
    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = value
            .as_array()
            .ok_or_else(|| Error::InvalidAbi("expected an array of entries".to_string()))?;

        for (index, entry) in entries.iter().enumerate() {
            if !entry.is_object() {
                return Err(Error::InvalidAbi(format!(
                    "entry {} is not an object",
                    index
                )));
            }
        }

        Ok(Self(entries.clone()))
    }

    /// Get the raw entries
    pub fn entries(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // -------------------------------------------------------------------------
    // Facet Merge
    // -------------------------------------------------------------------------

    /// Merge facet ABIs into this one.
    ///
    /// Entries of `self` are kept as-is. Facet entries are appended in order,
    /// dropping any entry whose `(type, name)` is already present. Parameter
    /// types are not part of the identity, so overloads sharing a name
    /// collapse to the first one seen.
    pub fn merge<'a, I>(&self, facets: I) -> Abi
    where
        I: IntoIterator<Item = &'a Abi>,
    {
        let mut merged = self.0.clone();
        let mut seen: HashSet<(String, String)> = merged.iter().map(entry_identity).collect();

        for facet in facets {
            for entry in &facet.0 {
                let identity = entry_identity(entry);
                if seen.contains(&identity) {
                    let collapsed = merged
                        .iter()
                        .find(|kept| entry_identity(kept) == identity)
                        .is_some_and(|kept| kept != entry);
                    if collapsed {
                        warn!(
                            entry_type = %identity.0,
                            name = %identity.1,
                            "dropping facet entry that differs from an existing entry with the same name"
                        );
                    }
                    continue;
                }
                seen.insert(identity);
                merged.push(entry.clone());
            }
        }

        Abi(merged)
    }

    // -------------------------------------------------------------------------
    // Content Hash
    // -------------------------------------------------------------------------

    /// Canonical serialization: entries sorted by `(type, name, body)` and
    /// object keys sorted recursively.
    pub fn canonical_json(&self) -> String {
        let mut keyed: Vec<(String, String, String)> = self
            .0
            .iter()
            .map(|entry| {
                let (entry_type, name) = entry_identity(entry);
                let mut body = String::new();
                write_canonical(entry, &mut body);
                (entry_type, name, body)
            })
            .collect();

        keyed.sort();

        let mut out = String::from("[");
        for (index, (_, _, body)) in keyed.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            out.push_str(body);
        }
        out.push(']');
        out
    }

    /// Deterministic fingerprint of this ABI: `0x` + keccak-256 of the
    /// canonical serialization.
    pub fn content_hash(&self) -> String {
        format!("0x{:x}", keccak256(self.canonical_json().as_bytes()))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn entry_type_of(entry: &Value) -> &str {
    // Entries without a type are functions per the ABI JSON format
    entry.get("type").and_then(Value::as_str).unwrap_or("function")
}

fn entry_identity(entry: &Value) -> (String, String) {
    let name = entry.get("name").and_then(Value::as_str).unwrap_or("");
    (entry_type_of(entry).to_string(), name.to_string())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_canonical_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars serialize identically regardless of map ordering features
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_canonical_object(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    out.push('{');
    for (index, key) in keys.into_iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(&map[key], out);
    }
    out.push('}');
}
