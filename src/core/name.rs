//! Canonical block identifiers
//!
//! Raw definition keys may contain underscores and start with digits, neither
//! of which the host accepts in a block name. The normalizer rewrites a key
//! into the namespaced identifier the block is registered and dispatched under.

use serde::{Deserialize, Serialize};

use super::registry::RegistryError;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "acb";

/// When the namespace prefix is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixPolicy {
    /// Prefix every key. Matches identifiers already stored by existing hosts.
    #[default]
    Always,
    /// Prefix only keys whose first character is an ASCII digit.
    NumericLeading,
}

/// Key → canonical identifier conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameNormalizer {
    namespace: String,
    policy: PrefixPolicy,
}

impl NameNormalizer {
    pub fn new(namespace: impl Into<String>, policy: PrefixPolicy) -> Self {
        Self {
            namespace: namespace.into(),
            policy,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn policy(&self) -> PrefixPolicy {
        self.policy
    }

    /// Normalize a raw definition key
    ///
    /// # Returns
    /// * `Ok(String)` with underscores replaced by hyphens and the namespace
    ///   prefix applied per policy
    /// * `Err(RegistryError::InvalidKey)` if `raw_key` is empty
    ///
    /// # Example
    /// ```
    /// use block_registry::core::name::NameNormalizer;
    ///
    /// let normalizer = NameNormalizer::default();
    /// assert_eq!(normalizer.normalize("my_custom_block").unwrap(), "acb-my-custom-block");
    /// ```
    pub fn normalize(&self, raw_key: &str) -> Result<String, RegistryError> {
        if raw_key.is_empty() {
            return Err(RegistryError::InvalidKey(raw_key.to_string()));
        }

        let hyphenated = raw_key.replace('_', "-");
        let prefixed = match self.policy {
            PrefixPolicy::Always => true,
            PrefixPolicy::NumericLeading => hyphenated.starts_with(|c: char| c.is_ascii_digit()),
        };

        if prefixed && !self.namespace.is_empty() {
            Ok(format!("{}-{}", self.namespace, hyphenated))
        } else {
            Ok(hyphenated)
        }
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, PrefixPolicy::default())
    }
}

/// Normalize with the default namespace and policy
pub fn normalize(raw_key: &str) -> Result<String, RegistryError> {
    NameNormalizer::default().normalize(raw_key)
}
