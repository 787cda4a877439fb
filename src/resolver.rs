//! Reference Resolution Pass
//!
//! Decides, for every fragment reachable from the populated roots, whether it
//! is inlined at its point of use or hoisted into the shared registry under a
//! name. Handles:
//! - Sharing promotion (a fragment reached twice gets a name)
//! - Polymorphic disambiguation (anyOf alternatives are prefixed by the base)
//! - Name collision resolution (numeric suffixes per candidate name)
//!
//! Naming depends on visit order. The traversal order (allOf, anyOf,
//! additionalProperties, items, properties) is part of the output contract:
//! changing it changes the names users see.
//!
//! No visited set is kept: a fragment shared N ways is walked N times, so a
//! deep diamond-shaped DAG costs time exponential in its depth. The mapper's
//! depth bound is what keeps this finite.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::schema::{NodeId, SchemaArena};

// =============================================================================
// Reference Table
// =============================================================================

/// Node identity → disposition.
///
/// `Some(None)` from [`entry`](Self::entry) means "seen, inline";
/// `Some(Some(name))` means "hoist under `name`"; `None` means never reached.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: HashMap<NodeId, Option<String>>,
}

impl ReferenceTable {
    pub fn entry(&self, node: NodeId) -> Option<Option<&str>> {
        self.entries.get(&node).map(|name| name.as_deref())
    }

    /// Assigned reference name, if the node is hoisted
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.entries.get(&node).and_then(|name| name.as_deref())
    }

    /// True if the node has been seen and stays inlined
    pub fn is_inline(&self, node: NodeId) -> bool {
        matches!(self.entries.get(&node), Some(None))
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hoisted nodes with their names, ordered by node id
    pub fn named(&self) -> BTreeMap<NodeId, &str> {
        self.entries
            .iter()
            .filter_map(|(&id, name)| name.as_deref().map(|name| (id, name)))
            .collect()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Populates a [`ReferenceTable`] from fragment graphs, one root at a time.
///
/// Holds no arena of its own: every call borrows the arena the fragments live
/// in, which must be the same across calls for one document.
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    table: ReferenceTable,

    /// Candidate name → number of identities that have claimed it
    claims: HashMap<String, usize>,

    /// Every name handed out so far
    assigned: HashSet<String>,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn into_table(self) -> ReferenceTable {
        self.table
    }

    /// Register `node` and everything beneath it.
    ///
    /// `force` demands a name for every fragment visited by this call that
    /// carries an identifier, whether or not it is shared.
    pub fn populate(&mut self, arena: &SchemaArena, node: NodeId, force: bool) {
        // anyOf alternatives must pick up the base prefix before anything
        // else gets to register them without it.
        self.disambiguate(arena, node);
        self.register(arena, node, None, force);

        let schema = arena.get(node);
        for child in schema.children() {
            self.populate(arena, child, force);
        }
    }

    /// Pre-pass: register anyOf alternatives under their parent's identifier,
    /// walking the structure in the same order as the main pass.
    ///
    /// Alternatives of a parent without an identifier are left to the main
    /// pass; registering them here too would count as a second visit.
    fn disambiguate(&mut self, arena: &SchemaArena, node: NodeId) {
        let schema = arena.get(node);

        for &part in &schema.all_of {
            self.disambiguate(arena, part);
        }
        let base = schema.schema_id();
        for &alternative in &schema.any_of {
            if base.is_some() {
                self.register(arena, alternative, base, false);
            }
            self.disambiguate(arena, alternative);
        }
        if let Some(values) = schema.additional_properties {
            self.disambiguate(arena, values);
        }
        if let Some(items) = schema.items {
            self.disambiguate(arena, items);
        }
        for (_, property) in &schema.properties {
            self.disambiguate(arena, *property);
        }
    }

    fn register(&mut self, arena: &SchemaArena, node: NodeId, base: Option<&str>, force: bool) {
        let candidate = arena.get(node).schema_id().map(|local| match base {
            Some(base) => format!("{}{}", base, local),
            None => local.to_string(),
        });

        let existing = self.table.entries.get(&node).map(Option::is_some);
        match existing {
            Some(true) => {
                // First name wins.
            }
            Some(false) => {
                if let Some(candidate) = candidate {
                    let name = self.claim(&candidate);
                    debug!(node = %node, %name, "promoting shared schema to reference");
                    self.table.entries.insert(node, Some(name));
                }
            }
            None if force => {
                let name = candidate.map(|candidate| self.claim(&candidate));
                if let Some(name) = &name {
                    debug!(node = %node, %name, "capturing schema by reference");
                }
                self.table.entries.insert(node, name);
            }
            None => {
                // Alternatives of a named base are always named; anything
                // else stays inline until it is reached a second time.
                let name = match (base, candidate) {
                    (Some(_), Some(candidate)) => Some(self.claim(&candidate)),
                    _ => None,
                };
                self.table.entries.insert(node, name);
            }
        }
    }

    /// Claim `candidate` for a new identity: the first claim gets it bare,
    /// later claims get `candidate2`, `candidate3`, ...
    ///
    /// A suffixed name that some other identifier already produced verbatim
    /// is skipped, so two identities never share a name.
    fn claim(&mut self, candidate: &str) -> String {
        loop {
            let count = self.claims.entry(candidate.to_string()).or_insert(0);
            *count += 1;
            let name = if *count == 1 {
                candidate.to_string()
            } else {
                format!("{}{}", candidate, count)
            };
            if self.assigned.insert(name.clone()) {
                if *count > 1 {
                    debug!(%candidate, %name, "reference name collision resolved");
                }
                return name;
            }
        }
    }
}
