// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry configuration - reserved keys and naming conventions.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: reserved document keys and the relation prefix
//! - **Level 2 (Runtime)**: [`RegistryConfig`], one per [`Registry`](crate::Registry),
//!   seeded from the environment and overridable programmatically or from JSON
//!
//! # Example
//!
//! ```rust
//! use dynreg::config::{IdentityPolicy, RegistryConfig};
//!
//! let config = RegistryConfig::default()
//!     .with_reference_prefix("REF_")
//!     .with_identity_policy(IdentityPolicy::Random);
//! assert_eq!(config.type_marker, "TYPENAME");
//! ```

use serde::Deserialize;

/// Reserved document key naming the registered type to materialize into.
pub const TYPE_MARKER_KEY: &str = "TYPENAME";

/// Reserved document key (and instance field name) carrying the identity.
pub const IDENTITY_KEY: &str = "UUID";

/// Field name prefix marking a non-owning relation.
///
/// `String` fields (and string sequences) named with this prefix are
/// registered as [`DataType::Reference`](crate::dynamic::DataType::Reference).
pub const REFERENCE_PREFIX: &str = "M_";

/// `round()` leaves values alone once `|x * 10^n|` exceeds this.
pub const ROUND_MAGNITUDE_LIMIT: f64 = 1e17;

/// How the materializer treats empty identity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityPolicy {
    /// Leave identity fields exactly as materialized.
    #[default]
    Keep,
    /// Fill empty identity fields with a random UUID.
    Random,
    /// Fill empty identity fields with a UUID derived from the type name and
    /// the document contents (stable for identical documents).
    Derived,
}

impl IdentityPolicy {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Some(Self::Keep),
            "random" => Some(Self::Random),
            "derived" => Some(Self::Derived),
            _ => None,
        }
    }
}

/// Per-registry configuration.
///
/// `Default` honours the `DYNREG_TYPE_MARKER`, `DYNREG_IDENTITY_KEY`,
/// `DYNREG_REFERENCE_PREFIX` and `DYNREG_IDENTITY_POLICY` environment
/// variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Document key naming the type (default `TYPENAME`)
    pub type_marker: String,

    /// Document key / field name holding the identity (default `UUID`)
    pub identity_key: String,

    /// Field name prefix promoted to reference fields (default `M_`)
    pub reference_prefix: String,

    /// Identity handling during materialization
    pub identity_policy: IdentityPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            type_marker: std::env::var("DYNREG_TYPE_MARKER")
                .unwrap_or_else(|_| TYPE_MARKER_KEY.to_string()),
            identity_key: std::env::var("DYNREG_IDENTITY_KEY")
                .unwrap_or_else(|_| IDENTITY_KEY.to_string()),
            reference_prefix: std::env::var("DYNREG_REFERENCE_PREFIX")
                .unwrap_or_else(|_| REFERENCE_PREFIX.to_string()),
            identity_policy: std::env::var("DYNREG_IDENTITY_POLICY")
                .ok()
                .and_then(|s| IdentityPolicy::parse(&s))
                .unwrap_or_default(),
        }
    }
}

impl RegistryConfig {
    /// Built-in defaults, ignoring the environment.
    pub fn builtin() -> Self {
        Self {
            type_marker: TYPE_MARKER_KEY.to_string(),
            identity_key: IDENTITY_KEY.to_string(),
            reference_prefix: REFERENCE_PREFIX.to_string(),
            identity_policy: IdentityPolicy::Keep,
        }
    }

    /// Load from a JSON object; missing keys fall back to [`Default`].
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set the type marker key.
    pub fn with_type_marker(mut self, key: impl Into<String>) -> Self {
        self.type_marker = key.into();
        self
    }

    /// Set the identity key.
    pub fn with_identity_key(mut self, key: impl Into<String>) -> Self {
        self.identity_key = key.into();
        self
    }

    /// Set the relation prefix. An empty prefix disables name-based promotion.
    pub fn with_reference_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reference_prefix = prefix.into();
        self
    }

    /// Set the identity policy.
    pub fn with_identity_policy(mut self, policy: IdentityPolicy) -> Self {
        self.identity_policy = policy;
        self
    }

    /// True if `field` follows the relation naming convention.
    pub fn is_reference_name(&self, field: &str) -> bool {
        !self.reference_prefix.is_empty() && field.starts_with(&self.reference_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let config = RegistryConfig::builtin();
        assert_eq!(config.type_marker, "TYPENAME");
        assert_eq!(config.identity_key, "UUID");
        assert_eq!(config.reference_prefix, "M_");
        assert_eq!(config.identity_policy, IdentityPolicy::Keep);
    }

    #[test]
    fn test_reference_name() {
        let config = RegistryConfig::builtin();
        assert!(config.is_reference_name("M_owner"));
        assert!(!config.is_reference_name("owner"));
        assert!(!config.is_reference_name("m_owner"));

        let disabled = config.with_reference_prefix("");
        assert!(!disabled.is_reference_name("M_owner"));
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            RegistryConfig::from_json(r#"{"type_marker": "__type", "identity_policy": "derived"}"#)
                .expect("parse config");
        assert_eq!(config.type_marker, "__type");
        assert_eq!(config.identity_policy, IdentityPolicy::Derived);
        assert!(!config.reference_prefix.is_empty());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(IdentityPolicy::parse(" Random "), Some(IdentityPolicy::Random));
        assert_eq!(IdentityPolicy::parse("nope"), None);
    }
}
