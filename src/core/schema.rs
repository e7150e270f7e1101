//! Attribute schema derivation
//!
//! Converts a merged [`BlockDefinition`] into the renderer-facing attribute
//! schema the host registers alongside each block.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::definition::{BlockDefinition, FieldSpec};

/// Attribute injected into every schema, carrying the owning definition key
pub const BLOCK_NAME_ATTRIBUTE: &str = "acb_block_name";

/// Type used when a field does not declare one
pub const DEFAULT_ATTRIBUTE_TYPE: &str = "string";

/// One attribute of a derived schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeEntry {
    #[serde(rename = "type")]
    pub attr_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<IndexMap<String, AttributeEntry>>,
}

impl AttributeEntry {
    /// Derive an entry from a field; absent facets stay absent.
    pub fn from_field(field: &FieldSpec) -> Self {
        Self {
            attr_type: field
                .field_type
                .clone()
                .unwrap_or_else(|| DEFAULT_ATTRIBUTE_TYPE.to_string()),
            source: field.source.clone(),
            meta: field.meta.clone(),
            default: field.default.clone(),
            selector: field.selector.clone(),
            query: field.query.as_ref().map(|nested| {
                nested
                    .iter()
                    .map(|(name, sub)| (name.clone(), AttributeEntry::from_field(sub)))
                    .collect()
            }),
        }
    }

    fn block_name(key: &str) -> Self {
        Self {
            attr_type: DEFAULT_ATTRIBUTE_TYPE.to_string(),
            source: None,
            meta: None,
            default: Some(Value::String(key.to_string())),
            selector: None,
            query: None,
        }
    }
}

/// Read-only attribute schema of one registered block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeSchema {
    entries: IndexMap<String, AttributeEntry>,
}

impl AttributeSchema {
    pub fn get(&self, name: &str) -> Option<&AttributeEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// The definition key recorded in the synthetic block-name entry
    pub fn block_name(&self) -> Option<&str> {
        self.entries
            .get(BLOCK_NAME_ATTRIBUTE)
            .and_then(|entry| entry.default.as_ref())
            .and_then(Value::as_str)
    }

    /// Host-facing JSON shape of the schema
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Build the attribute schema for a definition.
///
/// The synthetic [`BLOCK_NAME_ATTRIBUTE`] entry is inserted last and wins
/// over a field of the same name.
pub fn build_schema(definition: &BlockDefinition) -> AttributeSchema {
    let mut entries: IndexMap<String, AttributeEntry> = definition
        .fields
        .iter()
        .map(|(name, field)| (name.clone(), AttributeEntry::from_field(field)))
        .collect();

    entries.insert(
        BLOCK_NAME_ATTRIBUTE.to_string(),
        AttributeEntry::block_name(&definition.name),
    );

    AttributeSchema { entries }
}
