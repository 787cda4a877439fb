//! Familiar Schema References
//!
//! Generation cache and reference resolution for generated JSON-schema
//! fragments. One pass over a document:
//!
//! 1. The mapper requests fragments from the [`GenerationCache`], which builds
//!    each (type, context) pair once and hands back the same [`NodeId`] to
//!    every later request.
//! 2. The [`ReferenceResolver`] is populated once per top-level fragment and
//!    decides, per node identity, whether to inline it or hoist it under a
//!    unique name.
//! 3. A serializer reads the [`ReferenceTable`] to emit the document.
//!
//! ## Naming
//!
//! ```text
//! Pet { anyOf: [Dog, Cat] }     ->  Dog => "PetDog", Cat => "PetCat"
//! string, string{minLength: 5}  ->  "string", "string2"
//! Address used twice            ->  "Address" (inlined if used once)
//! ```
//!
//! Both the cache and the resolver are per-pass, single-threaded state:
//! generate documents concurrently with one instance of each per document.

pub mod cache;
pub mod checksum;
pub mod config;
pub mod error;
pub mod export;
pub mod key;
pub mod loader;
pub mod resolver;
pub mod schema;

pub use cache::{GenerationCache, WellKnownType};
pub use checksum::Checksum;
pub use config::RefsConfig;
pub use error::{RefsError, Result};
pub use export::DocumentWriter;
pub use key::SchemaKey;
pub use loader::{load_document, FragmentSet, LoadedDocument};
pub use resolver::{ReferenceResolver, ReferenceTable};
pub use schema::{JsonType, NodeId, SchemaArena, SchemaNode, SCHEMA_ID_ANNOTATION};
