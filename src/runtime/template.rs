//! Template-part renderer
//!
//! A [`TemplateRenderer`] that looks up `blocks/{kind}-{name}.{ext}` under the
//! configured search roots and renders the first match with MiniJinja, the
//! dispatched attributes bound as template variables.
//!
//! A block without a template renders as an empty string, as does a template
//! that fails to load or render. Both are logged.

use minijinja::Environment;
use std::path::PathBuf;

use super::dispatch::{RenderRequest, TemplateRenderer};
use crate::core::config::LoaderConfig;

/// Directory under each search root that holds template parts
const TEMPLATE_DIR: &str = "blocks";

pub struct TemplatePartRenderer {
    roots: Vec<PathBuf>,
    extension: String,
    env: Environment<'static>,
}

impl TemplatePartRenderer {
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            extension: "html".to_string(),
            env: Environment::new(),
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(config.search_roots.iter().cloned()).with_extension(config.template_extension.clone())
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Underlying environment, for registering filters and globals
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    /// Path of the template part for `name`, first root wins
    pub fn locate(&self, name: &str, template_kind: &str) -> Option<PathBuf> {
        let file_name = format!("{}-{}.{}", template_kind, name, self.extension);
        self.roots
            .iter()
            .map(|root| root.join(TEMPLATE_DIR).join(&file_name))
            .find(|path| path.is_file())
    }
}

impl TemplateRenderer for TemplatePartRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> String {
        let Some(path) = self.locate(request.name, request.template_kind) else {
            tracing::debug!(
                block = request.name,
                kind = request.template_kind,
                "no template part found",
            );
            return String::new();
        };

        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read template part");
                return String::new();
            }
        };

        match self.env.render_str(&source, request.attributes) {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to render template part");
                String::new()
            }
        }
    }
}
