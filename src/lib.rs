//! Block Registry - Dynamic block definitions for a content host
//!
//! This crate discovers block definitions from definitions files and persisted
//! records, merges them under a fixed precedence, derives an attribute schema
//! for each block, registers it under a canonical identifier, and dispatches
//! rendering to a template renderer.

pub mod core;
pub mod runtime;
mod tests;

#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

// Re-export commonly used types
pub use core::{
    Attributes, BlockDefinition, BlockRegistry, DefinitionTable, FieldSpec, LoaderConfig,
    RegistryError,
};
pub use runtime::{BlockLoader, Dispatcher, DocumentBatch, TemplateRenderer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
