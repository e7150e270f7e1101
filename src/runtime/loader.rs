//! Block loader
//!
//! Runs a full pass: collect batches from every source, merge them, and
//! publish the result as a new registry generation. Intended to run once per
//! host invocation cycle; concurrent passes are serialized by the registry.

use std::sync::Arc;

use serde_json::Value;

use super::dispatch::{Dispatcher, TemplateRenderer};
use super::merge::{merge_with_report, MergeReport};
use super::source::{DefinitionSource, DocumentBatch, FileSource, RecordSource};
use super::template::TemplatePartRenderer;
use crate::core::config::LoaderConfig;
use crate::core::registry::{BlockRegistry, RegistrationReport};

/// Outcome of one load pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub generation: u64,
    pub merge: MergeReport,
    pub registration: RegistrationReport,
}

pub struct BlockLoader {
    config: LoaderConfig,
    sources: Vec<Box<dyn DefinitionSource>>,
    registry: BlockRegistry,
}

impl BlockLoader {
    /// Loader with no sources, registering with the configured normalizer
    pub fn new(config: LoaderConfig) -> Self {
        let registry = BlockRegistry::with_normalizer(config.normalizer());
        Self {
            config,
            sources: Vec::new(),
            registry,
        }
    }

    /// Loader reading definitions files from the configured search roots and
    /// the given persisted records
    pub fn from_config(config: LoaderConfig, records: RecordSource) -> Self {
        let files = FileSource::from_config(&config);
        Self::new(config).with_source(files).with_source(records)
    }

    pub fn with_source(mut self, source: impl DefinitionSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Batches from every source, in source order
    pub fn collect_batches(&self) -> Vec<DocumentBatch> {
        self.sources.iter().flat_map(|source| source.batches()).collect()
    }

    /// Run a full load → merge → register pass
    pub fn load(&self) -> LoadReport {
        let batches = self.collect_batches();
        let (table, merge) = merge_with_report(&batches);
        let registration = self.registry.register_all(&table);

        tracing::debug!(
            batches = batches.len(),
            skipped = merge.skipped.len(),
            definitions = table.len(),
            "block definitions loaded",
        );

        LoadReport {
            generation: registration.generation,
            merge,
            registration,
        }
    }

    /// Dispatcher over this loader's registry using the configured template kind
    pub fn dispatcher(&self, renderer: impl TemplateRenderer + 'static) -> Dispatcher {
        Dispatcher::with_shared_renderer(self.registry.clone(), Arc::new(renderer))
            .with_template_kind(self.config.template_kind.clone())
    }

    /// Dispatcher rendering template parts from the configured search roots
    pub fn template_dispatcher(&self) -> Dispatcher {
        self.dispatcher(TemplatePartRenderer::from_config(&self.config))
    }

    /// JSON document of the definitions behind the current generation
    pub fn editor_payload(&self) -> Value {
        self.registry.snapshot().definitions().to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::name::PrefixPolicy;
    use crate::runtime::source::{PersistedRecord, RecordStatus};
    use serde_json::json;

    fn published(id: u64, content: &str) -> PersistedRecord {
        PersistedRecord {
            id,
            classification: "acb_block".into(),
            status: RecordStatus::Published,
            content: content.into(),
        }
    }

    #[test]
    fn test_load_from_records() {
        let records = RecordSource::new("acb_block").with_records(vec![
            published(1, r#"{"hero": {"fields": {"title": {}}}}"#),
            published(2, r#"{"quote_box": {}}"#),
        ]);
        let loader = BlockLoader::from_config(LoaderConfig::default(), records);

        let report = loader.load();
        assert_eq!(report.generation, 1);
        assert_eq!(report.merge.merged, vec!["record:1", "record:2"]);
        assert_eq!(
            report.registration.registered,
            vec!["acb-hero", "acb-quote-box"]
        );
    }

    #[test]
    fn test_config_policy_reaches_registry() {
        let config = LoaderConfig {
            prefix_policy: PrefixPolicy::NumericLeading,
            ..LoaderConfig::default()
        };
        let loader = BlockLoader::new(config)
            .with_source(RecordSource::new("acb_block").with_records(vec![published(1, r#"{"hero": {}}"#)]));

        loader.load();
        assert!(loader.registry().contains("hero"));
    }

    #[test]
    fn test_editor_payload_reflects_merged_table() {
        let loader = BlockLoader::new(LoaderConfig::default()).with_source(
            RecordSource::new("acb_block")
                .with_records(vec![published(1, r#"{"hero": {"title": "Hero", "fields": {"t": {}}}}"#)]),
        );
        assert_eq!(loader.editor_payload(), json!({}));

        loader.load();
        assert_eq!(
            loader.editor_payload(),
            json!({"hero": {"title": "Hero", "fields": {"t": {}}}})
        );
    }

    #[test]
    fn test_dispatcher_uses_configured_kind() {
        let config = LoaderConfig {
            template_kind: "preview".into(),
            ..LoaderConfig::default()
        };
        let loader = BlockLoader::new(config)
            .with_source(RecordSource::new("acb_block").with_records(vec![published(1, r#"{"hero": {}}"#)]));
        loader.load();

        let dispatcher = loader.dispatcher(|r: &crate::runtime::dispatch::RenderRequest<'_>| {
            format!("{}:{}", r.template_kind, r.name)
        });
        let output = dispatcher
            .dispatch("acb-hero", &crate::core::definition::Attributes::new())
            .unwrap();
        assert_eq!(output, "preview:hero");
    }
}
