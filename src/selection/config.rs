//! Configuration of a selection pass.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::exclusion::RawExclusion;
use crate::{generate_id, Id};

/// Settings for one [`SelectionRunner`](super::SelectionRunner).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectionConfig {
    /// Name stamped on the produced result. Defaults to a fresh UUID.
    #[cfg_attr(feature = "serde", serde(default = "generate_id"))]
    pub name: Id,
    /// Records to exclude in addition to those selected by upstream passes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclude_configurations: RawExclusion,
}

impl SelectionConfig {
    pub fn with_name(mut self, name: impl Into<Id>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_exclusions(mut self, exclusions: impl Into<RawExclusion>) -> Self {
        self.exclude_configurations = exclusions.into();
        self
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            name: generate_id(),
            exclude_configurations: RawExclusion::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_excludes_nothing() {
        let cfg = SelectionConfig::default();
        assert!(cfg.exclude_configurations.is_none());
        assert!(!cfg.name.is_empty());
    }

    #[test]
    fn default_names_are_unique() {
        assert_ne!(SelectionConfig::default().name, SelectionConfig::default().name);
    }

    #[test]
    fn builders_override_fields() {
        let cfg = SelectionConfig::default()
            .with_name("random")
            .with_exclusions(RawExclusion::Flat(vec![0]));
        assert_eq!(cfg.name, "random");
        assert_eq!(cfg.exclude_configurations, RawExclusion::Flat(vec![0]));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_with_defaults() {
        let cfg: SelectionConfig = serde_json::from_str(r#"{"name": "kmeans"}"#).unwrap();
        assert_eq!(cfg.name, "kmeans");
        assert!(cfg.exclude_configurations.is_none());

        let cfg: SelectionConfig =
            serde_json::from_str(r#"{"exclude_configurations": {"md": [0, 3]}}"#).unwrap();
        assert_eq!(cfg.exclude_configurations.layout(), Some(crate::dataset::Layout::Keyed));
    }
}
