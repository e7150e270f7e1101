//! Block Registry - Generational table of registered blocks
//!
//! This module binds canonical identifiers to their attribute schema and
//! definition. It supports:
//! - Full registration passes that replace the table wholesale
//! - Lookup by canonical identifier
//! - Snapshots that stay valid while a newer generation is published
//!
//! A pass builds the next [`Generation`] off to the side and publishes it with
//! a single pointer swap, so readers observe either the old table or the new
//! one and never a mix of both.

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use super::definition::{BlockDefinition, DefinitionTable};
use super::name::NameNormalizer;
use super::schema::{build_schema, AttributeSchema};

/// A block bound to its canonical identifier
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredBlock {
    pub canonical_id: String,
    pub schema: AttributeSchema,
    pub definition: BlockDefinition,
}

/// Immutable table published by one registration pass
#[derive(Debug, Default)]
pub struct Generation {
    number: u64,
    blocks: IndexMap<String, Arc<RegisteredBlock>>,
    definitions: DefinitionTable,
}

impl Generation {
    /// Monotonic pass number; `0` is the empty table a registry starts with
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn get(&self, canonical_id: &str) -> Option<&Arc<RegisteredBlock>> {
        self.blocks.get(canonical_id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RegisteredBlock>> {
        self.blocks.values()
    }

    pub fn canonical_ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    /// Registered blocks keyed by canonical identifier
    pub fn blocks(&self) -> &IndexMap<String, Arc<RegisteredBlock>> {
        &self.blocks
    }

    /// The merged table this generation was built from, including
    /// definitions that were rejected or shadowed during registration
    pub fn definitions(&self) -> &DefinitionTable {
        &self.definitions
    }
}

/// Outcome of a registration pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationReport {
    /// Number of the generation the pass published
    pub generation: u64,
    /// Canonical identifiers in the published table
    pub registered: Vec<String>,
    /// Canonical identifiers bound more than once; the later definition won
    pub overwritten: Vec<String>,
    /// Definition keys that could not be registered
    pub rejected: Vec<(String, RegistryError)>,
}

/// Block registry shared between the registration pass and dispatchers
///
/// Clones share the same table. Reads take a short read lock to pin the
/// current generation; passes are serialized by a separate writer lock so a
/// slow pass never blocks readers.
#[derive(Clone)]
pub struct BlockRegistry {
    current: Arc<RwLock<Arc<Generation>>>,
    writer: Arc<Mutex<()>>,
    normalizer: NameNormalizer,
}

impl BlockRegistry {
    /// Create a new empty block registry
    ///
    /// # Example
    /// ```
    /// use block_registry::core::registry::BlockRegistry;
    ///
    /// let registry = BlockRegistry::new();
    /// assert!(registry.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_normalizer(NameNormalizer::default())
    }

    /// Create an empty registry that derives identifiers with `normalizer`
    pub fn with_normalizer(normalizer: NameNormalizer) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(Generation::default()))),
            writer: Arc::new(Mutex::new(())),
            normalizer,
        }
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    /// Replace the whole table with one built from `definitions`
    ///
    /// Each definition key is normalized and its schema derived. Keys that
    /// fail normalization are skipped and reported. When two keys normalize
    /// to the same identifier the later one in table order replaces the
    /// earlier one.
    ///
    /// # Arguments
    /// * `definitions` - The merged definition table
    ///
    /// # Returns
    /// A [`RegistrationReport`] describing the published generation
    pub fn register_all(&self, definitions: &DefinitionTable) -> RegistrationReport {
        let _pass = self.writer.lock();

        let mut report = RegistrationReport::default();
        let mut blocks: IndexMap<String, Arc<RegisteredBlock>> =
            IndexMap::with_capacity(definitions.len());

        for (key, definition) in definitions.iter() {
            let canonical_id = match self.normalizer.normalize(key) {
                Ok(id) => id,
                Err(err) => {
                    tracing::warn!(key, error = %err, "skipping block definition");
                    report.rejected.push((key.to_string(), err));
                    continue;
                }
            };

            let block = RegisteredBlock {
                canonical_id: canonical_id.clone(),
                schema: build_schema(definition),
                definition: definition.clone(),
            };

            if let Some(previous) = blocks.insert(canonical_id.clone(), Arc::new(block)) {
                tracing::debug!(
                    canonical_id = %canonical_id,
                    replaced = %previous.definition.name,
                    by = key,
                    "canonical id collision; later definition wins",
                );
                report.overwritten.push(canonical_id);
            }
        }

        report.registered = blocks.keys().cloned().collect();

        let number = self.current.read().number + 1;
        let generation = Arc::new(Generation {
            number,
            blocks,
            definitions: definitions.clone(),
        });
        *self.current.write() = generation;

        report.generation = number;
        tracing::info!(
            generation = number,
            blocks = report.registered.len(),
            rejected = report.rejected.len(),
            "published block registry generation",
        );

        report
    }

    /// Get a registered block by its canonical identifier
    ///
    /// # Returns
    /// * `Ok(Arc<RegisteredBlock>)` if the block is registered
    /// * `Err(RegistryError::UnknownBlock)` otherwise
    pub fn lookup(&self, canonical_id: &str) -> Result<Arc<RegisteredBlock>, RegistryError> {
        self.snapshot()
            .get(canonical_id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownBlock(canonical_id.to_string()))
    }

    /// Pin the current generation
    pub fn snapshot(&self) -> Arc<Generation> {
        self.current.read().clone()
    }

    /// Number of the current generation
    pub fn generation(&self) -> u64 {
        self.current.read().number
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    pub fn contains(&self, canonical_id: &str) -> bool {
        self.current.read().blocks.contains_key(canonical_id)
    }

    /// Canonical identifiers of the current generation, in table order
    pub fn canonical_ids(&self) -> Vec<String> {
        self.snapshot().canonical_ids().map(str::to_owned).collect()
    }

    /// Publish an empty generation
    pub fn clear(&self) {
        let _pass = self.writer.lock();
        let number = self.current.read().number + 1;
        *self.current.write() = Arc::new(Generation {
            number,
            ..Generation::default()
        });
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Definition key cannot be turned into an identifier
    #[error("Invalid block key: {0:?}")]
    InvalidKey(String),

    /// No block is registered under the identifier
    #[error("Unknown block: {0}")]
    UnknownBlock(String),
}
