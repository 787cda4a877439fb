//! Document export
//!
//! Renders a resolved document: every hoisted node is written once under
//! `components.schemas` and referenced by `$ref` everywhere it occurs;
//! every other node is inlined verbatim.

use std::path::Path;

use serde_json::{json, Map, Value};

use crate::config::{ExportConfig, OutputFormat};
use crate::error::Result;
use crate::resolver::ReferenceTable;
use crate::schema::{NodeId, SchemaArena, SCHEMA_ID_ANNOTATION};

/// Renders nodes against a reference table
pub struct DocumentWriter<'a> {
    arena: &'a SchemaArena,
    table: &'a ReferenceTable,
    reference_prefix: &'a str,
}

impl<'a> DocumentWriter<'a> {
    pub fn new(arena: &'a SchemaArena, table: &'a ReferenceTable, config: &'a ExportConfig) -> Self {
        Self {
            arena,
            table,
            reference_prefix: &config.reference_prefix,
        }
    }

    /// Build `{ "roots": {...}, "components": { "schemas": {...} } }`
    pub fn document(&self, roots: &[(String, NodeId)]) -> Value {
        let mut rendered_roots = Map::new();
        for (name, id) in roots {
            rendered_roots.insert(name.clone(), self.reference_or_inline(*id));
        }

        let mut schemas = Map::new();
        for (id, name) in self.table.named() {
            schemas.insert(name.to_string(), self.body(id));
        }

        json!({
            "roots": rendered_roots,
            "components": { "schemas": schemas },
        })
    }

    /// `$ref` for a hoisted node, the full body otherwise
    pub fn reference_or_inline(&self, id: NodeId) -> Value {
        match self.table.name(id) {
            Some(name) => json!({ "$ref": format!("{}{}", self.reference_prefix, name) }),
            None => self.body(id),
        }
    }

    /// The node's own schema object, with children rendered by reference
    pub fn body(&self, id: NodeId) -> Value {
        let node = self.arena.get(id);
        let mut out = Map::new();

        if let Some(tag) = node.type_tag {
            out.insert("type".to_string(), json!(tag.as_str()));
        }
        if let Some(format) = &node.format {
            out.insert("format".to_string(), json!(format));
        }
        for (keyword, value) in &node.keywords {
            out.insert(keyword.clone(), value.clone());
        }
        if !node.all_of.is_empty() {
            out.insert("allOf".to_string(), self.list(&node.all_of));
        }
        if !node.any_of.is_empty() {
            out.insert("anyOf".to_string(), self.list(&node.any_of));
        }
        if let Some(values) = node.additional_properties {
            out.insert("additionalProperties".to_string(), self.reference_or_inline(values));
        }
        if let Some(items) = node.items {
            out.insert("items".to_string(), self.reference_or_inline(items));
        }
        if !node.properties.is_empty() {
            let properties: Map<String, Value> = node
                .properties
                .iter()
                .map(|(name, child)| (name.clone(), self.reference_or_inline(*child)))
                .collect();
            out.insert("properties".to_string(), Value::Object(properties));
        }
        // The schema id is a naming hint for the resolver, not document content.
        for (annotation, value) in &node.annotations {
            if annotation != SCHEMA_ID_ANNOTATION {
                out.insert(annotation.clone(), value.clone());
            }
        }

        Value::Object(out)
    }

    fn list(&self, ids: &[NodeId]) -> Value {
        Value::Array(ids.iter().map(|id| self.reference_or_inline(*id)).collect())
    }
}

/// Serialize a rendered document per the configured output format
pub fn to_string(document: &Value, config: &ExportConfig) -> Result<String> {
    let content = match config.output_format {
        OutputFormat::Pretty => serde_json::to_string_pretty(document)?,
        OutputFormat::Compact => serde_json::to_string(document)?,
    };
    Ok(content)
}

/// Write a rendered document to disk
pub fn write_document(document: &Value, config: &ExportConfig, path: impl AsRef<Path>) -> Result<()> {
    let content = to_string(document, config)?;
    std::fs::write(path, content)?;
    Ok(())
}
