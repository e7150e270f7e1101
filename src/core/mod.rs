//! Core block abstractions and types
//!
//! This module defines the block and field definitions, the attribute schema
//! derived from them, identifier normalization, and the generational registry
//! that binds identifiers to blocks.

pub mod config;
pub mod definition;
pub mod name;
pub mod registry;
pub mod schema;

pub use config::{ConfigError, LoaderConfig};
pub use definition::{Attributes, BlockDefinition, DefinitionTable, FieldSpec};
pub use name::{normalize, NameNormalizer, PrefixPolicy};
pub use registry::{BlockRegistry, Generation, RegisteredBlock, RegistrationReport, RegistryError};
pub use schema::{build_schema, AttributeEntry, AttributeSchema, BLOCK_NAME_ATTRIBUTE};
