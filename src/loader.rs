//! Fragment set loading
//!
//! Maps a JSON "fragment set" onto arena nodes through the
//! [`GenerationCache`]. This stands in for the type mapper: named types are
//! built on first request and reused by identity afterwards.
//!
//! ```json
//! {
//!   "types": {
//!     "Pet":  { "anyOf": [{ "$type": "Dog" }, { "$type": "Cat" }] },
//!     "Dog":  { "type": "object", "properties": { "name": { "$type": "string" } } }
//!   },
//!   "roots": [
//!     { "name": "listPets", "schema": { "type": "array", "items": { "$type": "Pet" } } }
//!   ]
//! }
//! ```
//!
//! A `{"$type": ..., "$context": {...}}` request folds the context keywords
//! into its own copy of the type's fragment.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cache::GenerationCache;
use crate::config::LoaderConfig;
use crate::error::{RefsError, Result};
use crate::key::SchemaKey;
use crate::resolver::{ReferenceResolver, ReferenceTable};
use crate::schema::{JsonType, NodeId, SchemaNode};

const TYPE_REQUEST: &str = "$type";
const TYPE_CONTEXT: &str = "$context";

/// Raw fragment set as read from disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FragmentSet {
    /// Named type definitions, requested with `$type`
    #[serde(default)]
    pub types: BTreeMap<String, Value>,
    /// Top-level fragments, populated in order
    #[serde(default)]
    pub roots: Vec<RootFragment>,
}

/// One top-level fragment (a request body, a response, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootFragment {
    pub name: String,
    pub schema: Value,
}

impl FragmentSet {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// A fragment set after mapping: the cache that owns every node, plus the
/// root node of each top-level fragment
#[derive(Debug)]
pub struct LoadedDocument {
    pub cache: GenerationCache,
    pub roots: Vec<(String, NodeId)>,
}

impl LoadedDocument {
    /// Run the reference pass over every root, in document order
    pub fn resolve(&self, capture_roots_by_ref: bool) -> ReferenceTable {
        let mut resolver = ReferenceResolver::new();
        for (_, root) in &self.roots {
            resolver.populate(self.cache.arena(), *root, capture_roots_by_ref);
        }
        resolver.into_table()
    }
}

/// Load every root of `set` into a fresh cache
pub fn load_document(set: &FragmentSet, config: &LoaderConfig) -> Result<LoadedDocument> {
    let loader = FragmentLoader::new(&set.types, config);
    let mut cache = GenerationCache::new();
    let mut roots = Vec::with_capacity(set.roots.len());

    for root in &set.roots {
        let id = loader.load(&mut cache, &root.schema, &root.name)?;
        roots.push((root.name.clone(), id));
    }

    debug!(roots = roots.len(), nodes = cache.arena().len(), "fragment set loaded");
    Ok(LoadedDocument { cache, roots })
}

/// Maps JSON schema objects onto cache-owned nodes
pub struct FragmentLoader<'a> {
    types: &'a BTreeMap<String, Value>,
    max_depth: usize,
}

impl<'a> FragmentLoader<'a> {
    pub fn new(types: &'a BTreeMap<String, Value>, config: &LoaderConfig) -> Self {
        Self {
            types,
            max_depth: config.max_depth,
        }
    }

    /// Map one fragment; `label` prefixes paths in error messages
    pub fn load(&self, cache: &mut GenerationCache, schema: &Value, label: &str) -> Result<NodeId> {
        self.map(cache, schema, label, 0)
    }

    fn map(&self, cache: &mut GenerationCache, value: &Value, path: &str, depth: usize) -> Result<NodeId> {
        let object = value.as_object().ok_or_else(|| invalid(path, "expected a schema object"))?;

        if let Some(type_name) = object.get(TYPE_REQUEST) {
            let type_name = type_name
                .as_str()
                .ok_or_else(|| invalid(path, "`$type` must be a string"))?;
            if let Some(extra) = object.keys().find(|k| *k != TYPE_REQUEST && *k != TYPE_CONTEXT) {
                return Err(invalid(path, &format!("unexpected `{}` next to `$type`", extra)));
            }
            return self.request(cache, type_name, object.get(TYPE_CONTEXT), path, depth);
        }

        let mut node = SchemaNode::default();
        for (keyword, value) in object {
            let child_path = format!("{}/{}", path, keyword);
            match keyword.as_str() {
                "type" => {
                    let tag = value
                        .as_str()
                        .and_then(JsonType::from_json_type)
                        .ok_or_else(|| invalid(&child_path, "unsupported type"))?;
                    node.type_tag = Some(tag);
                }
                "format" => {
                    let format = value
                        .as_str()
                        .ok_or_else(|| invalid(&child_path, "`format` must be a string"))?;
                    node.format = Some(format.to_string());
                }
                "items" => {
                    node.items = Some(self.map(cache, value, &child_path, depth)?);
                }
                "additionalProperties" if value.is_object() => {
                    node.additional_properties = Some(self.map(cache, value, &child_path, depth)?);
                }
                "properties" => {
                    let properties = value
                        .as_object()
                        .ok_or_else(|| invalid(&child_path, "`properties` must be an object"))?;
                    for (name, property) in properties {
                        let id = self.map(cache, property, &format!("{}/{}", child_path, name), depth)?;
                        node.properties.push((name.clone(), id));
                    }
                }
                "allOf" => node.all_of = self.map_list(cache, value, &child_path, depth)?,
                "anyOf" => node.any_of = self.map_list(cache, value, &child_path, depth)?,
                k if k.starts_with("x-") => {
                    node.annotations.insert(k.to_string(), value.clone());
                }
                k if k.starts_with('$') => {
                    return Err(invalid(&child_path, "unsupported `$` keyword"));
                }
                _ => {
                    node.keywords.insert(keyword.clone(), value.clone());
                }
            }
        }

        Ok(cache.arena_mut().alloc(node))
    }

    fn map_list(&self, cache: &mut GenerationCache, value: &Value, path: &str, depth: usize) -> Result<Vec<NodeId>> {
        let list = value
            .as_array()
            .ok_or_else(|| invalid(path, "expected an array of schemas"))?;
        list.iter()
            .enumerate()
            .map(|(i, item)| self.map(cache, item, &format!("{}/{}", path, i), depth))
            .collect()
    }

    /// Request a named type through the cache
    fn request(
        &self,
        cache: &mut GenerationCache,
        type_name: &str,
        context: Option<&Value>,
        path: &str,
        depth: usize,
    ) -> Result<NodeId> {
        let key = match context {
            Some(context) => SchemaKey::with_context(type_name, context),
            None => SchemaKey::new(type_name),
        };

        cache.try_get_or_add(key, |cache, key| {
            if depth >= self.max_depth {
                return Err(RefsError::DepthExceeded {
                    type_name: key.type_name.clone(),
                    limit: self.max_depth,
                });
            }

            // A contextual request starts from the plain type's fragment.
            if key.context.is_some() {
                let base = self.request(cache, type_name, None, path, depth + 1)?;
                let mut node = cache.arena().get(base).clone();
                if let Some(Value::Object(keywords)) = context {
                    for (keyword, value) in keywords {
                        node.keywords.insert(keyword.clone(), value.clone());
                    }
                }
                return Ok(cache.arena_mut().alloc(node));
            }

            let definition = self
                .types
                .get(type_name)
                .ok_or_else(|| RefsError::UnknownType(type_name.to_string()))?;
            let id = self.map(cache, definition, &format!("types/{}", type_name), depth + 1)?;

            let node = cache.arena_mut().get_mut(id);
            if node.schema_id().is_none() {
                node.set_schema_id(type_name);
            }
            Ok(id)
        })
    }
}

fn invalid(path: &str, reason: &str) -> RefsError {
    RefsError::InvalidFragment {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
