//! Block loading and render dispatch
//!
//! This module provides the pipeline that turns raw definition sources into a
//! registry generation, and the dispatcher that renders registered blocks.

pub mod dispatch;
pub mod loader;
pub mod merge;
pub mod source;
pub mod template;

pub use dispatch::{Dispatcher, Registration, RenderHandler, RenderRequest, TemplateRenderer};
pub use loader::{BlockLoader, LoadReport};
pub use merge::{merge, merge_with_report, MergeReport};
pub use source::{
    DefinitionSource, DocumentBatch, FileSource, PersistedRecord, RecordSource, RecordStatus,
    SourceError, SourceKind,
};
pub use template::TemplatePartRenderer;
