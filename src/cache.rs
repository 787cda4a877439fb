//! Generation Cache
//!
//! Memoizes "schema fragment for key K" for one document-generation pass, so
//! each (type, context) pair is built once and reused by identity everywhere
//! it is requested. Identity reuse is what lets the resolver detect sharing.

use std::collections::HashMap;

use tracing::trace;

use crate::key::SchemaKey;
use crate::schema::{JsonType, NodeId, SchemaArena, SchemaNode};

// =============================================================================
// Well-known binary payloads
// =============================================================================

/// Binary-stream-like value types present in every cache before any lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownType {
    /// A single uploaded file
    FormFile,
    /// A collection of uploaded files
    FormFileCollection,
    /// A generic byte stream
    Stream,
    /// A piped byte reader
    PipeReader,
}

impl WellKnownType {
    pub const ALL: [WellKnownType; 4] = [
        WellKnownType::FormFile,
        WellKnownType::FormFileCollection,
        WellKnownType::Stream,
        WellKnownType::PipeReader,
    ];

    /// Short type name, used both as the type identity and the schema id
    pub fn short_name(&self) -> &'static str {
        match self {
            WellKnownType::FormFile => "FormFile",
            WellKnownType::FormFileCollection => "FormFileCollection",
            WellKnownType::Stream => "Stream",
            WellKnownType::PipeReader => "PipeReader",
        }
    }

    pub fn key(&self) -> SchemaKey {
        SchemaKey::new(self.short_name())
    }

    fn build(&self, arena: &mut SchemaArena) -> NodeId {
        let node = match self {
            WellKnownType::FormFileCollection => {
                let file = arena.alloc(binary_string());
                SchemaNode::new(JsonType::Array).with_items(file)
            }
            _ => binary_string(),
        };
        arena.alloc(node.with_schema_id(self.short_name()))
    }
}

fn binary_string() -> SchemaNode {
    SchemaNode::new(JsonType::String).with_format("binary")
}

// =============================================================================
// Cache
// =============================================================================

/// Key → fragment memo table plus the arena that owns the fragments
#[derive(Debug)]
pub struct GenerationCache {
    arena: SchemaArena,
    entries: HashMap<SchemaKey, NodeId>,
}

impl Default for GenerationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationCache {
    /// Create a cache pre-seeded with the well-known binary payload shapes
    pub fn new() -> Self {
        let mut cache = Self {
            arena: SchemaArena::new(),
            entries: HashMap::new(),
        };
        for well_known in WellKnownType::ALL {
            let id = well_known.build(&mut cache.arena);
            cache.entries.insert(well_known.key(), id);
        }
        cache
    }

    /// Return the fragment stored under `key`, building it on a miss.
    ///
    /// `build` receives the cache itself so nested types can be requested
    /// recursively; it is invoked at most once per key.
    pub fn get_or_add<F>(&mut self, key: SchemaKey, build: F) -> NodeId
    where
        F: FnOnce(&mut Self, &SchemaKey) -> NodeId,
    {
        if let Some(&id) = self.entries.get(&key) {
            trace!(%key, node = %id, "schema cache hit");
            return id;
        }
        let id = build(self, &key);
        trace!(%key, node = %id, "schema cache miss, stored");
        self.entries.insert(key, id);
        id
    }

    /// Fallible form of [`get_or_add`](Self::get_or_add); nothing is stored
    /// when `build` fails.
    pub fn try_get_or_add<F, E>(&mut self, key: SchemaKey, build: F) -> Result<NodeId, E>
    where
        F: FnOnce(&mut Self, &SchemaKey) -> Result<NodeId, E>,
    {
        if let Some(&id) = self.entries.get(&key) {
            trace!(%key, node = %id, "schema cache hit");
            return Ok(id);
        }
        let id = build(self, &key)?;
        trace!(%key, node = %id, "schema cache miss, stored");
        self.entries.insert(key, id);
        Ok(id)
    }

    pub fn get(&self, key: &SchemaKey) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &SchemaKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Fragment of a pre-seeded well-known type
    pub fn well_known(&self, well_known: WellKnownType) -> Option<NodeId> {
        self.get(&well_known.key())
    }

    /// Every key → fragment mapping, sorted by key
    pub fn entries(&self) -> Vec<(&SchemaKey, NodeId)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, &id)| (k, id)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn arena(&self) -> &SchemaArena {
        &self.arena
    }

    /// Mutable arena access for builders allocating nested fragments
    pub fn arena_mut(&mut self) -> &mut SchemaArena {
        &mut self.arena
    }
}
