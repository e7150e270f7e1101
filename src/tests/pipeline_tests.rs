//! Pipeline scenarios: definitions files + persisted records → registry → dispatch
//!
//! These tests drive the whole pass the way a host does on each request:
//!   definitions files (child theme, parent theme, plugin)
//!   + published records → merge → register → dispatch

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::core::config::LoaderConfig;
    use crate::core::definition::Attributes;
    use crate::core::registry::RegistryError;
    use crate::runtime::dispatch::RenderRequest;
    use crate::runtime::loader::BlockLoader;
    use crate::runtime::source::{PersistedRecord, RecordSource, RecordStatus};

    /// Helper: write `blocks/blocks.json` under a search root.
    fn write_definitions(root: &Path, body: &str) {
        let dir = root.join("blocks");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("blocks.json"), body).unwrap();
    }

    fn record(id: u64, content: serde_json::Value) -> PersistedRecord {
        PersistedRecord {
            id,
            classification: "acb_block".into(),
            status: RecordStatus::Published,
            content: content.to_string(),
        }
    }

    fn attrs(value: serde_json::Value) -> Attributes {
        value.as_object().cloned().unwrap_or_default()
    }

    fn loader(roots: &[&Path], records: Vec<PersistedRecord>) -> BlockLoader {
        let config = roots
            .iter()
            .fold(LoaderConfig::default(), |config, root| config.with_search_root(*root));
        BlockLoader::from_config(config, RecordSource::new("acb_block").with_records(records))
    }

    fn field_type(loader: &BlockLoader, id: &str, field: &str) -> Option<String> {
        loader
            .registry()
            .lookup(id)
            .ok()
            .and_then(|block| block.schema.get(field).map(|entry| entry.attr_type.clone()))
    }

    // ====================================================================
    // Scenario 1: the hero block, end to end
    // ====================================================================

    #[test]
    fn test_hero_end_to_end() {
        let plugin = TempDir::new().unwrap();
        write_definitions(
            plugin.path(),
            r#"{ "hero": {"fields": {"title": {"type": "string"}}} }"#,
        );
        let loader = loader(&[plugin.path()], vec![]);
        loader.load();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let dispatcher = loader.dispatcher(move |r: &RenderRequest<'_>| {
            recorded.lock().push((
                r.name.to_string(),
                r.attributes.clone(),
                r.template_kind.to_string(),
            ));
            "<section>rendered</section>".to_string()
        });

        let output = dispatcher.dispatch("acb-hero", &attrs(json!({"title": "Hi"}))).unwrap();

        assert_eq!(output, "<section>rendered</section>");
        assert_eq!(
            *calls.lock(),
            vec![(
                "hero".to_string(),
                attrs(json!({"title": "Hi"})),
                "block".to_string()
            )]
        );
    }

    #[test]
    fn test_unknown_dispatch() {
        let loader = loader(&[], vec![]);
        loader.load();
        let dispatcher = loader.dispatcher(|_: &RenderRequest<'_>| "never".to_string());

        assert_eq!(
            dispatcher.dispatch("acb-does-not-exist", &Attributes::new()),
            Err(RegistryError::UnknownBlock("acb-does-not-exist".into()))
        );
    }

    // ====================================================================
    // Scenario 2: precedence between sources
    // ====================================================================

    #[test]
    fn test_first_discovered_file_takes_precedence() {
        let child = TempDir::new().unwrap();
        let parent = TempDir::new().unwrap();
        write_definitions(child.path(), r#"{"hero": {"fields": {"t": {"type": "child"}}}}"#);
        write_definitions(
            parent.path(),
            r#"{"hero": {"fields": {"t": {"type": "parent"}}}, "footer": {}}"#,
        );

        let loader = loader(&[child.path(), parent.path()], vec![]);
        loader.load();

        assert_eq!(field_type(&loader, "acb-hero", "t").as_deref(), Some("child"));
        assert!(loader.registry().contains("acb-footer"));
    }

    #[test]
    fn test_record_overrides_file() {
        let child = TempDir::new().unwrap();
        write_definitions(child.path(), r#"{"hero": {"fields": {"t": {"type": "file"}}}}"#);

        let loader = loader(
            &[child.path()],
            vec![record(1, json!({"hero": {"fields": {"t": {"type": "record"}}}}))],
        );
        loader.load();

        assert_eq!(field_type(&loader, "acb-hero", "t").as_deref(), Some("record"));
    }

    #[test]
    fn test_unpublished_records_are_ignored() {
        let child = TempDir::new().unwrap();
        write_definitions(child.path(), r#"{"hero": {"fields": {"t": {"type": "file"}}}}"#);

        let mut draft = record(1, json!({"hero": {"fields": {"t": {"type": "draft"}}}}));
        draft.status = RecordStatus::Draft;
        let loader = loader(&[child.path()], vec![draft]);
        loader.load();

        assert_eq!(field_type(&loader, "acb-hero", "t").as_deref(), Some("file"));
    }

    // ====================================================================
    // Scenario 3: failure isolation
    // ====================================================================

    #[test]
    fn test_malformed_file_does_not_affect_others() {
        let child = TempDir::new().unwrap();
        let parent = TempDir::new().unwrap();
        write_definitions(child.path(), r#"{"hero": {"fields": "#);
        write_definitions(parent.path(), r#"{"hero": {"fields": {"t": {"type": "parent"}}}}"#);

        let loader = loader(
            &[child.path(), parent.path()],
            vec![PersistedRecord {
                content: "<not json>".into(),
                ..record(9, json!({}))
            }],
        );
        let report = loader.load();

        assert_eq!(report.merge.skipped.len(), 2);
        assert_eq!(field_type(&loader, "acb-hero", "t").as_deref(), Some("parent"));
    }

    #[test]
    fn test_empty_key_is_scoped_to_its_definition() {
        let loader = loader(&[], vec![record(1, json!({"": {}, "hero": {}}))]);
        let report = loader.load();

        assert_eq!(report.registration.rejected.len(), 1);
        assert_eq!(loader.registry().canonical_ids(), vec!["acb-hero"]);
    }

    // ====================================================================
    // Scenario 4: repeated passes
    // ====================================================================

    #[test]
    fn test_pass_is_idempotent() {
        let child = TempDir::new().unwrap();
        write_definitions(
            child.path(),
            r#"{"hero": {"fields": {"title": {"default": "Hi"}, "slides": {"type": "array", "query": {"img": {"source": "attribute"}}}}}}"#,
        );
        let loader = loader(&[child.path()], vec![record(1, json!({"quote": {}}))]);

        loader.load();
        let first = loader.registry().snapshot();
        loader.load();
        let second = loader.registry().snapshot();

        assert_eq!(second.number(), first.number() + 1);
        assert_eq!(first.blocks(), second.blocks());
        assert_eq!(first.definitions(), second.definitions());
    }

    #[test]
    fn test_removed_definition_disappears_on_next_pass() {
        let child = TempDir::new().unwrap();
        write_definitions(child.path(), r#"{"hero": {}, "footer": {}}"#);
        let loader = loader(&[child.path()], vec![]);
        loader.load();
        assert!(loader.registry().contains("acb-footer"));

        write_definitions(child.path(), r#"{"hero": {}}"#);
        loader.load();

        assert!(!loader.registry().contains("acb-footer"));
        assert!(loader.registry().contains("acb-hero"));
    }

    // ====================================================================
    // Scenario 5: template parts
    // ====================================================================

    #[test]
    fn test_template_dispatcher_renders_part() {
        let theme = TempDir::new().unwrap();
        write_definitions(theme.path(), r#"{"hero": {"fields": {"title": {}}}}"#);
        fs::write(
            theme.path().join("blocks/block-hero.html"),
            "<h1>{{ title }}</h1>",
        )
        .unwrap();

        let loader = loader(&[theme.path()], vec![]);
        loader.load();

        let registrations = loader.template_dispatcher().registrations();
        assert_eq!(registrations.len(), 1);
        let output = registrations[0]
            .handler
            .call(&attrs(json!({"title": "Hello", "acb_block_name": "hero"})))
            .unwrap();
        assert_eq!(output, "<h1>Hello</h1>");
    }
}
