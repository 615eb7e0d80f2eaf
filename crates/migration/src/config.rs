//! Rules file format for `chainkit migrate` and `chainkit inspect`.
//!
//! A rules file declares the element library and the migration rules that
//! apply to it.
//!
//! # Example
//!
//! ```toml
//! [[element]]
//! type = "http-trigger"
//! outputs = ["out", "error"]
//!
//! [[element]]
//! type = "old-http-trigger"
//! deprecated = true
//!
//! [[element]]
//! type = "split"
//! container = true
//!
//! [[rule]]
//! from = "old-http-trigger"
//! to = "http-trigger"
//! versions = { min = 1, max = 3 }
//!
//! [[rule.ops]]
//! op = "rename"
//! from = "uri"
//! to = "url"
//!
//! [[rule.ops]]
//! op = "drop"
//! key = "legacyMode"
//! ```
//!
//! A rule is lossless when none of its ops can lose data; set `lossless`
//! explicitly to override that.

use std::path::Path;
use std::sync::Arc;

use chainkit_core::{ElementDescriptor, ElementLibrary, ElementType};
use serde::{Deserialize, Serialize};

use crate::error::MigrationError;
use crate::rules::{MigrationRule, RuleTable, VersionRange};
use crate::transform::{DeclarativeTransform, TransformOp};

// ── Types ─────────────────────────────────────────────────────────────────────

/// Top-level rules file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// `[[element]]` entries.
    #[serde(default, rename = "element")]
    pub elements: Vec<ElementDescriptor>,
    /// `[[rule]]` entries, in precedence order.
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,
}

/// One `[[rule]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Deprecated type.
    pub from: ElementType,
    /// Replacement type.
    pub to: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<VersionRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lossless: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ops: Vec<TransformOp>,
}

// ── Functions ─────────────────────────────────────────────────────────────────

impl RulesConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, MigrationError> {
        let config: RulesConfig =
            toml::from_str(content).map_err(|e| MigrationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a rules file.
    pub fn load(path: &Path) -> Result<Self, MigrationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MigrationError::Config(format!("could not read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            MigrationError::Config(msg) => {
                MigrationError::Config(format!("'{}': {}", path.display(), msg))
            }
            other => other,
        })
    }

    fn validate(&self) -> Result<(), MigrationError> {
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.from.as_str().is_empty() || rule.to.as_str().is_empty() {
                return Err(MigrationError::Config(format!(
                    "rule #{} needs non-empty 'from' and 'to' types",
                    i + 1
                )));
            }
            if let Some(VersionRange {
                min: Some(min),
                max: Some(max),
            }) = rule.versions
            {
                if min > max {
                    return Err(MigrationError::Config(format!(
                        "rule #{} ({} -> {}) has an empty version range {}..={}",
                        i + 1,
                        rule.from,
                        rule.to,
                        min,
                        max
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn library(&self) -> ElementLibrary {
        ElementLibrary::from_descriptors(self.elements.iter().cloned())
    }

    pub fn rule_table(&self) -> RuleTable {
        RuleTable::from_rules(self.rules.iter().map(RuleConfig::to_rule))
    }
}

impl RuleConfig {
    fn to_rule(&self) -> MigrationRule {
        let transform = DeclarativeTransform::new(self.ops.clone());
        let lossless = self.lossless.unwrap_or_else(|| transform.is_lossless());
        let rule = MigrationRule::new(self.from.clone(), self.to.clone())
            .with_transform(Arc::new(transform), lossless);
        match self.versions {
            Some(range) => rule.for_versions(range),
            None => rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RULES: &str = r#"
[[element]]
type = "http"
inputs = ["in"]
outputs = ["out"]

[[element]]
type = "old-http"
deprecated = true

[[element]]
type = "split"
container = true

[[rule]]
from = "old-http"
to = "http"

[[rule.ops]]
op = "rename"
from = "uri"
to = "url"

[[rule]]
from = "old-http"
to = "http"
versions = { min = 2, max = 2 }
lossless = true

[[rule.ops]]
op = "set"
key = "mode"
value = "sync"
"#;

    #[test]
    fn parses_elements_and_rules() {
        let config = RulesConfig::from_toml_str(RULES).unwrap();
        let library = config.library();
        assert_eq!(library.len(), 3);
        assert!(library.is_deprecated("old-http"));
        assert!(library.is_container("split"));

        let table = config.rule_table();
        assert_eq!(table.len(), 2);
        let fallback = table.lookup("old-http", Some(1)).unwrap();
        assert!(fallback.lossless);
        let scoped = table.lookup("old-http", Some(2)).unwrap();
        assert_eq!(scoped.versions, Some(VersionRange::exactly(2)));
        assert!(scoped.lossless);

        let props = serde_json::from_value(json!({"mode": "async"})).unwrap();
        let out = scoped.transform.apply(&props);
        assert_eq!(out.properties["mode"], json!("sync"));
    }

    #[test]
    fn lossy_ops_make_rule_lossy_by_default() {
        let config = RulesConfig::from_toml_str(
            r#"
[[rule]]
from = "a"
to = "b"
ops = [{ op = "drop", key = "x" }]
"#,
        )
        .unwrap();
        assert!(!config.rule_table().rules()[0].lossless);
    }

    #[test]
    fn empty_version_range_rejected() {
        let err = RulesConfig::from_toml_str(
            r#"
[[rule]]
from = "a"
to = "b"
versions = { min = 3, max = 1 }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("empty version range"));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = RulesConfig::from_toml_str("[[rule]]\nfrom = ").unwrap_err();
        assert!(matches!(err, MigrationError::Config(_)));
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = RulesConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));

        let path = dir.path().join("rules.toml");
        std::fs::write(&path, RULES).unwrap();
        assert_eq!(RulesConfig::load(&path).unwrap().rules.len(), 2);
    }
}
