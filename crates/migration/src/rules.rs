//! Migration rules and the table that selects one for an element.

use std::fmt;
use std::sync::Arc;

use chainkit_core::ElementType;
use serde::{Deserialize, Serialize};

use crate::transform::{DeclarativeTransform, PropertyTransform};

/// Inclusive range of element versions. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl VersionRange {
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        VersionRange { min, max }
    }

    pub fn exactly(version: u32) -> Self {
        VersionRange::new(Some(version), Some(version))
    }

    pub fn contains(&self, version: u32) -> bool {
        self.min.map_or(true, |min| version >= min) && self.max.map_or(true, |max| version <= max)
    }

    /// Number of versions covered, minus one. Used to prefer narrow rules.
    fn width(&self) -> u64 {
        let min = u64::from(self.min.unwrap_or(0));
        let max = u64::from(self.max.unwrap_or(u32::MAX));
        max.saturating_sub(min)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => write!(f, "{}", min),
            (Some(min), Some(max)) => write!(f, "{}..={}", min, max),
            (Some(min), None) => write!(f, "{}..", min),
            (None, Some(max)) => write!(f, "..={}", max),
            (None, None) => f.write_str(".."),
        }
    }
}

/// Replaces elements of a deprecated type (optionally only some versions of
/// it) with a supported type.
#[derive(Debug, Clone)]
pub struct MigrationRule {
    pub deprecated_type: ElementType,
    /// `None` applies to every version, including elements without one.
    pub versions: Option<VersionRange>,
    pub replacement_type: ElementType,
    pub transform: Arc<dyn PropertyTransform>,
    /// When false, every element migrated by this rule gets a property-loss
    /// warning.
    pub lossless: bool,
}

impl MigrationRule {
    /// A lossless rule that keeps properties as they are.
    pub fn new(deprecated_type: impl Into<ElementType>, replacement_type: impl Into<ElementType>) -> Self {
        MigrationRule {
            deprecated_type: deprecated_type.into(),
            versions: None,
            replacement_type: replacement_type.into(),
            transform: Arc::new(DeclarativeTransform::identity()),
            lossless: true,
        }
    }

    pub fn for_versions(mut self, versions: VersionRange) -> Self {
        self.versions = Some(versions);
        self
    }

    pub fn with_transform(mut self, transform: Arc<dyn PropertyTransform>, lossless: bool) -> Self {
        self.transform = transform;
        self.lossless = lossless;
        self
    }

    /// Whether this rule covers an element of the given type and version.
    pub fn applies_to(&self, element_type: &str, version: Option<u32>) -> bool {
        if self.deprecated_type.as_str() != element_type {
            return false;
        }
        match (&self.versions, version) {
            (None, _) => true,
            (Some(range), Some(v)) => range.contains(v),
            (Some(_), None) => false,
        }
    }
}

/// Ordered collection of migration rules.
///
/// Lookup precedence for an element of type `T` at version `v`:
/// 1. rules for `T` whose version range contains `v`, narrowest range first;
/// 2. the type-only rule for `T`.
///
/// Remaining ties go to the rule declared first.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<MigrationRule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: impl IntoIterator<Item = MigrationRule>) -> Self {
        RuleTable {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn push(&mut self, rule: MigrationRule) {
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: MigrationRule) -> Self {
        self.push(rule);
        self
    }

    pub fn rules(&self) -> &[MigrationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rule to apply to an element, if any.
    pub fn lookup(&self, element_type: &str, version: Option<u32>) -> Option<&MigrationRule> {
        let candidates = || {
            self.rules
                .iter()
                .filter(move |r| r.applies_to(element_type, version))
        };
        let scoped = candidates()
            .filter_map(|r| r.versions.map(|range| (range.width(), r)))
            .min_by_key(|(width, _)| *width)
            .map(|(_, r)| r);
        scoped.or_else(|| candidates().find(|r| r.versions.is_none()))
    }

    /// Whether any rule mentions the type as deprecated.
    pub fn migrates(&self, element_type: &str) -> bool {
        self.rules
            .iter()
            .any(|r| r.deprecated_type.as_str() == element_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RuleTable {
        RuleTable::new()
            .with_rule(MigrationRule::new("old-http", "http"))
            .with_rule(
                MigrationRule::new("old-http", "http-v2")
                    .for_versions(VersionRange::new(Some(2), None)),
            )
            .with_rule(
                MigrationRule::new("old-http", "http-v3").for_versions(VersionRange::exactly(3)),
            )
    }

    fn replacement(table: &RuleTable, ty: &str, version: Option<u32>) -> Option<String> {
        table
            .lookup(ty, version)
            .map(|r| r.replacement_type.to_string())
    }

    #[test]
    fn type_only_rule_is_the_fallback() {
        let t = table();
        assert_eq!(replacement(&t, "old-http", None).as_deref(), Some("http"));
        assert_eq!(replacement(&t, "old-http", Some(1)).as_deref(), Some("http"));
    }

    #[test]
    fn narrowest_version_scoped_rule_wins() {
        let t = table();
        assert_eq!(replacement(&t, "old-http", Some(2)).as_deref(), Some("http-v2"));
        assert_eq!(replacement(&t, "old-http", Some(3)).as_deref(), Some("http-v3"));
        assert_eq!(replacement(&t, "old-http", Some(7)).as_deref(), Some("http-v2"));
    }

    #[test]
    fn declaration_order_breaks_ties() {
        let t = RuleTable::new()
            .with_rule(MigrationRule::new("a", "first"))
            .with_rule(MigrationRule::new("a", "second"));
        assert_eq!(replacement(&t, "a", None).as_deref(), Some("first"));
    }

    #[test]
    fn unversioned_elements_skip_scoped_rules() {
        let t = RuleTable::new()
            .with_rule(MigrationRule::new("a", "b").for_versions(VersionRange::exactly(1)));
        assert!(t.lookup("a", None).is_none());
        assert!(t.lookup("a", Some(2)).is_none());
        assert!(t.lookup("a", Some(1)).is_some());
        assert!(t.migrates("a"));
        assert!(!t.migrates("b"));
    }

    #[test]
    fn range_display() {
        assert_eq!(VersionRange::exactly(3).to_string(), "3");
        assert_eq!(VersionRange::new(Some(1), Some(4)).to_string(), "1..=4");
        assert_eq!(VersionRange::new(None, Some(4)).to_string(), "..=4");
    }
}
