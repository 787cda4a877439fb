//! Cache keys: source type identity plus optional context discriminator

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;

/// Composite identity of one requested schema.
///
/// The same type requested under an equal annotation set maps to the same
/// key; a different constraint set yields a distinct key (and so a distinct
/// fragment).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaKey {
    /// Source type identity (e.g. "Pet", "String")
    pub type_name: String,
    /// Fingerprint of the parameter-site annotation set, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Checksum>,
}

impl SchemaKey {
    /// Key for a type with no contextual annotations
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            context: None,
        }
    }

    /// Key for a type used under an annotation set.
    ///
    /// An empty object or `null` is treated as "no context" so that it does
    /// not split the cache entry for the plain type.
    pub fn with_context(type_name: impl Into<String>, context: &serde_json::Value) -> Self {
        let empty = match context {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        };
        Self {
            type_name: type_name.into(),
            context: (!empty).then(|| Checksum::from_json(context)),
        }
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{}@{}", self.type_name, context.short()),
            None => write!(f, "{}", self.type_name),
        }
    }
}
