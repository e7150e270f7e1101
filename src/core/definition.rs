//! Block and field definitions
//!
//! Typed counterparts of the JSON documents supplied by definition sources.
//! Parsing is tolerant: a malformed entry degrades to the nearest sensible
//! definition instead of failing, so one bad block never poisons a batch.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Invocation-time attribute values, keyed by attribute name.
pub type Attributes = Map<String, Value>;

/// Facets understood on a field record. Everything else lands in `extras`.
const FIELD_FACETS: [&str; 6] = ["type", "source", "meta", "default", "selector", "query"];

/// One named attribute of a block definition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSpec {
    /// Field name, unique within its definition
    pub name: String,
    /// Declared attribute type; `None` means the builder falls back to `"string"`
    pub field_type: Option<String>,
    /// Where the editor reads the value from (e.g. `"attribute"`, `"html"`)
    pub source: Option<String>,
    /// Meta key backing the value
    pub meta: Option<String>,
    /// Default value; `Some` even for `""`, `0` or `false`
    pub default: Option<Value>,
    /// DOM selector used together with `source`
    pub selector: Option<String>,
    /// Nested sub-fields for repeatable groups
    pub query: Option<IndexMap<String, FieldSpec>>,
    /// Editor-only facets (label, control, help, ...) kept verbatim
    pub extras: Map<String, Value>,
}

impl FieldSpec {
    /// Create a field with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the declared type
    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    /// Set the source facet
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the meta facet
    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the selector facet
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Add a nested sub-field to the query facet
    pub fn with_query_field(mut self, field: FieldSpec) -> Self {
        self.query
            .get_or_insert_with(IndexMap::new)
            .insert(field.name.clone(), field);
        self
    }

    /// Parse a field record.
    ///
    /// Empty strings count as absent for the textual facets. `default` is
    /// present whenever the key holds a non-null value. A non-object record
    /// yields a bare field.
    pub fn from_value(name: &str, payload: &Value) -> Self {
        let mut field = Self::new(name);
        let Some(object) = payload.as_object() else {
            return field;
        };

        field.field_type = text_facet(object, "type");
        field.source = text_facet(object, "source");
        field.meta = text_facet(object, "meta");
        field.selector = text_facet(object, "selector");
        field.default = object.get("default").filter(|v| !v.is_null()).cloned();
        field.query = object
            .get("query")
            .and_then(Value::as_object)
            .filter(|nested| !nested.is_empty())
            .map(parse_fields);
        field.extras = object
            .iter()
            .filter(|(key, _)| !FIELD_FACETS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        field
    }

    /// Serialize back into a field record
    pub fn to_value(&self) -> Value {
        let mut object = self.extras.clone();
        if let Some(field_type) = &self.field_type {
            object.insert("type".into(), field_type.clone().into());
        }
        if let Some(source) = &self.source {
            object.insert("source".into(), source.clone().into());
        }
        if let Some(meta) = &self.meta {
            object.insert("meta".into(), meta.clone().into());
        }
        if let Some(default) = &self.default {
            object.insert("default".into(), default.clone());
        }
        if let Some(selector) = &self.selector {
            object.insert("selector".into(), selector.clone().into());
        }
        if let Some(query) = &self.query {
            object.insert("query".into(), fields_to_value(query));
        }
        Value::Object(object)
    }
}

/// A named block definition produced by the merger
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockDefinition {
    /// Table key the definition was merged under
    pub name: String,
    /// Fields in document order
    pub fields: IndexMap<String, FieldSpec>,
    /// Top-level facets other than `fields` (title, icon, category, ...)
    pub extras: Map<String, Value>,
}

impl BlockDefinition {
    /// Create an empty definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a field, replacing any field with the same name
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Parse a definition payload stored under `name`.
    ///
    /// A payload that is not an object, or whose `fields` facet is not an
    /// object, produces a definition without fields.
    pub fn from_value(name: &str, payload: &Value) -> Self {
        let mut definition = Self::new(name);
        let Some(object) = payload.as_object() else {
            tracing::debug!(block = name, "block payload is not an object; no fields");
            return definition;
        };

        match object.get("fields") {
            Some(Value::Object(fields)) => definition.fields = parse_fields(fields),
            Some(Value::Null) | None => {}
            Some(_) => {
                tracing::debug!(block = name, "`fields` facet is not an object; ignored");
            }
        }
        definition.extras = object
            .iter()
            .filter(|(key, _)| key.as_str() != "fields")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        definition
    }

    /// Serialize back into a definition payload
    pub fn to_value(&self) -> Value {
        let mut object = self.extras.clone();
        if !self.fields.is_empty() {
            object.insert("fields".into(), fields_to_value(&self.fields));
        }
        Value::Object(object)
    }
}

/// The merged definition table, keyed by raw definition key.
///
/// Insertion replaces in place, so a key overridden by a later source keeps
/// the position it was first seen at.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefinitionTable {
    entries: IndexMap<String, BlockDefinition>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition under its own name, returning the one it replaced
    pub fn insert(&mut self, definition: BlockDefinition) -> Option<BlockDefinition> {
        self.entries.insert(definition.name.clone(), definition)
    }

    pub fn get(&self, key: &str) -> Option<&BlockDefinition> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BlockDefinition)> {
        self.entries.iter().map(|(key, def)| (key.as_str(), def))
    }

    /// The merged table as one JSON document keyed by block name.
    ///
    /// This is the payload handed to the editor so it sees exactly the
    /// definitions the registry was built from.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, def)| (key.clone(), def.to_value()))
                .collect(),
        )
    }
}

impl FromIterator<BlockDefinition> for DefinitionTable {
    fn from_iter<I: IntoIterator<Item = BlockDefinition>>(iter: I) -> Self {
        let mut table = Self::new();
        for definition in iter {
            table.insert(definition);
        }
        table
    }
}

fn text_facet(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn parse_fields(fields: &Map<String, Value>) -> IndexMap<String, FieldSpec> {
    fields
        .iter()
        .map(|(name, payload)| (name.clone(), FieldSpec::from_value(name, payload)))
        .collect()
}

fn fields_to_value(fields: &IndexMap<String, FieldSpec>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, field)| (name.clone(), field.to_value()))
            .collect(),
    )
}
