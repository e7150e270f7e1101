//! Loader configuration
//!
//! Every setting has a default, so an empty TOML document is a valid config.
//!
//! ```toml
//! namespace = "acb"
//! prefix_policy = "always"
//! definitions_path = "blocks/blocks.json"
//! search_roots = ["themes/child", "themes/parent", "plugin"]
//! record_classification = "acb_block"
//! template_kind = "block"
//! template_extension = "html"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::name::{NameNormalizer, PrefixPolicy, DEFAULT_NAMESPACE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Namespace token prefixed to canonical identifiers
    pub namespace: String,
    /// When the namespace prefix applies
    pub prefix_policy: PrefixPolicy,
    /// Definitions document looked up under every search root
    pub definitions_path: PathBuf,
    /// Directories searched for definitions and templates; earlier roots take precedence
    pub search_roots: Vec<PathBuf>,
    /// Record classification accepted from the persisted-record source
    pub record_classification: String,
    /// Template kind passed to the renderer on dispatch
    pub template_kind: String,
    /// File extension of template parts
    pub template_extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            prefix_policy: PrefixPolicy::default(),
            definitions_path: PathBuf::from("blocks/blocks.json"),
            search_roots: Vec::new(),
            record_classification: "acb_block".to_string(),
            template_kind: "block".to_string(),
            template_extension: "html".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    /// Add a search root after the existing ones
    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_roots.push(root.into());
        self
    }

    /// Normalizer matching `namespace` and `prefix_policy`
    pub fn normalizer(&self) -> NameNormalizer {
        NameNormalizer::new(self.namespace.clone(), self.prefix_policy)
    }
}

impl FromStr for LoaderConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(content)?)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
