//! Schema fragments and the arena that owns them
//!
//! Fragments are addressed by [`NodeId`], a stable index into a
//! [`SchemaArena`]. Identity is the index, not the content: two separately
//! allocated nodes with identical fields are distinct, and sharing a fragment
//! means reusing its id.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Annotation carrying the human-assigned schema identifier (a name hint)
pub const SCHEMA_ID_ANNOTATION: &str = "x-schema-id";

// =============================================================================
// Node identity
// =============================================================================

/// Stable identity of a fragment inside one arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Primitive type tag
// =============================================================================

/// JSON primitive type of a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Array,
    Object,
}

impl JsonType {
    pub fn from_json_type(type_str: &str) -> Option<Self> {
        match type_str {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

// =============================================================================
// Schema node
// =============================================================================

/// One generated schema fragment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    /// Primitive type tag, absent for pure compositions
    pub type_tag: Option<JsonType>,
    pub format: Option<String>,
    /// Array element type
    pub items: Option<NodeId>,
    /// Open-ended map value type
    pub additional_properties: Option<NodeId>,
    /// Object members in declaration order
    pub properties: Vec<(String, NodeId)>,
    /// Structural conjunction
    pub all_of: Vec<NodeId>,
    /// Polymorphic alternatives
    pub any_of: Vec<NodeId>,
    /// Remaining JSON Schema keywords (constraints, descriptions, ...)
    pub keywords: BTreeMap<String, serde_json::Value>,
    /// Side-table of `x-` annotations
    pub annotations: BTreeMap<String, serde_json::Value>,
}

impl SchemaNode {
    pub fn new(type_tag: JsonType) -> Self {
        Self {
            type_tag: Some(type_tag),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_schema_id(mut self, id: impl Into<String>) -> Self {
        self.set_schema_id(id);
        self
    }

    pub fn with_items(mut self, items: NodeId) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_additional_properties(mut self, values: NodeId) -> Self {
        self.additional_properties = Some(values);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, node: NodeId) -> Self {
        self.properties.push((name.into(), node));
        self
    }

    pub fn with_all_of(mut self, node: NodeId) -> Self {
        self.all_of.push(node);
        self
    }

    pub fn with_any_of(mut self, node: NodeId) -> Self {
        self.any_of.push(node);
        self
    }

    pub fn with_keyword(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.keywords.insert(name.into(), value);
        self
    }

    /// The identifier annotation, if the mapper assigned one
    pub fn schema_id(&self) -> Option<&str> {
        self.annotations
            .get(SCHEMA_ID_ANNOTATION)
            .and_then(|v| v.as_str())
    }

    pub fn set_schema_id(&mut self, id: impl Into<String>) {
        self.annotations.insert(
            SCHEMA_ID_ANNOTATION.to_string(),
            serde_json::Value::String(id.into()),
        );
    }

    /// Direct children in traversal order: allOf, anyOf, additionalProperties,
    /// items, properties
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.all_of
            .iter()
            .copied()
            .chain(self.any_of.iter().copied())
            .chain(self.additional_properties)
            .chain(self.items)
            .chain(self.properties.iter().map(|(_, id)| *id))
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Owner of every fragment produced during one generation pass
#[derive(Debug, Default)]
pub struct SchemaArena {
    nodes: Vec<SchemaNode>,
}

impl SchemaArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and hand back its identity
    pub fn alloc(&mut self, node: SchemaNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Look up a node.
    ///
    /// Ids are only minted by `alloc`, so an out-of-range id means it came
    /// from a different arena; that is a caller bug and panics.
    pub fn get(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SchemaNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Every node reachable from `root` (including it), each listed once, in
    /// depth-first traversal order
    pub fn reachable(&self, root: NodeId) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            out.push(id);
            let children: Vec<NodeId> = self.get(id).children().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_not_structural() {
        let mut arena = SchemaArena::new();
        let a = arena.alloc(SchemaNode::new(JsonType::String));
        let b = arena.alloc(SchemaNode::new(JsonType::String));
        assert_ne!(a, b);
        assert_eq!(arena.get(a), arena.get(b));
    }

    #[test]
    fn test_schema_id_annotation() {
        let node = SchemaNode::new(JsonType::Object).with_schema_id("Pet");
        assert_eq!(node.schema_id(), Some("Pet"));
        assert_eq!(SchemaNode::new(JsonType::Object).schema_id(), None);
    }

    #[test]
    fn test_children_order() {
        let mut arena = SchemaArena::new();
        let prop = arena.alloc(SchemaNode::new(JsonType::String));
        let item = arena.alloc(SchemaNode::new(JsonType::Integer));
        let value = arena.alloc(SchemaNode::new(JsonType::Boolean));
        let alt = arena.alloc(SchemaNode::new(JsonType::Object));
        let base = arena.alloc(SchemaNode::new(JsonType::Object));

        let node = SchemaNode::default()
            .with_property("name", prop)
            .with_items(item)
            .with_additional_properties(value)
            .with_any_of(alt)
            .with_all_of(base);

        let order: Vec<NodeId> = node.children().collect();
        assert_eq!(order, vec![base, alt, value, item, prop]);
    }

    #[test]
    fn test_reachable_lists_shared_nodes_once() {
        let mut arena = SchemaArena::new();
        let shared = arena.alloc(SchemaNode::new(JsonType::Integer));
        let list = arena.alloc(SchemaNode::new(JsonType::Array).with_items(shared));
        let root = arena.alloc(
            SchemaNode::new(JsonType::Object)
                .with_property("x", shared)
                .with_property("xs", list),
        );
        assert_eq!(arena.reachable(root), vec![root, shared, list]);
    }
}
