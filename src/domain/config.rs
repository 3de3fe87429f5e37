use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    hierarchy::{DuplicatePolicy, OrphanPolicy, Policy},
    record::DEFAULT_IDENTIFIER_KEY,
};
use crate::storage::writer::DEFAULT_MAX_DEPTH;

/// Configuration for a conversion.
///
/// This struct holds settings that control how input records are read, how
/// anomalies in the relation are handled and how the output is formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The `id` attribute of the XML field holding the employee identifier.
    pub id_field: String,

    /// The `id` attribute of the XML field holding the manager identifier.
    pub manager_field: String,

    /// A manager value meaning "no manager", in addition to an empty field.
    ///
    /// For example, `"null"` or `"-"`.
    pub root_sentinel: Option<String>,

    /// The key identifiers are written under in the output document.
    pub identifier_key: String,

    /// Number of spaces per indentation level of JSON output.
    pub indent: usize,

    /// Deepest tree that is written out.
    ///
    /// Encoders recurse once per level, so deeper forests are rejected before
    /// anything is written.
    pub max_depth: usize,

    /// Handling of employees whose manager has no record.
    pub orphans: OrphanPolicy,

    /// Handling of identifiers that appear in more than one record.
    pub duplicates: DuplicatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            manager_field: default_manager_field(),
            root_sentinel: None,
            identifier_key: default_identifier_key(),
            indent: default_indent(),
            max_depth: default_max_depth(),
            orphans: OrphanPolicy::default(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The anomaly policy these settings describe.
    #[must_use]
    pub const fn policy(&self) -> Policy {
        Policy {
            orphans: self.orphans,
            duplicates: self.duplicates,
        }
    }

    /// Whether a raw manager field value means "no manager".
    ///
    /// Blank values always do; the configured sentinel, if any, does too.
    #[must_use]
    pub fn is_root_marker(&self, value: &str) -> bool {
        let value = value.trim();
        value.is_empty() || self.root_sentinel.as_deref() == Some(value)
    }
}

fn default_id_field() -> String {
    "email".to_string()
}

fn default_manager_field() -> String {
    "manager".to_string()
}

fn default_identifier_key() -> String {
    DEFAULT_IDENTIFIER_KEY.to_string()
}

const fn default_indent() -> usize {
    3
}

const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_id_field")]
        id_field: String,

        #[serde(default = "default_manager_field")]
        manager_field: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        root_sentinel: Option<String>,

        #[serde(default = "default_identifier_key")]
        identifier_key: String,

        /// Spaces per indentation level of JSON output.
        #[serde(default = "default_indent")]
        indent: usize,

        #[serde(default = "default_max_depth")]
        max_depth: usize,

        #[serde(default)]
        orphans: OrphanPolicy,

        #[serde(default)]
        duplicates: DuplicatePolicy,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                id_field,
                manager_field,
                root_sentinel,
                identifier_key,
                indent,
                max_depth,
                orphans,
                duplicates,
            } => Self {
                id_field,
                manager_field,
                root_sentinel,
                identifier_key,
                indent,
                max_depth,
                orphans,
                duplicates,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            id_field: config.id_field,
            manager_field: config.manager_field,
            root_sentinel: config.root_sentinel,
            identifier_key: config.identifier_key,
            indent: config.indent,
            max_depth: config.max_depth,
            orphans: config.orphans,
            duplicates: config.duplicates,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nid_field = \"mail\"\nmanager_field = \"boss\"\nroot_sentinel = \"null\"\nidentifier_key = \"email\"\nindent = 2\nmax_depth = 64\norphans = \"promote\"\nduplicates = \"fail\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.id_field, "mail");
        assert_eq!(config.manager_field, "boss");
        assert_eq!(config.root_sentinel.as_deref(), Some("null"));
        assert_eq!(config.identifier_key, "email");
        assert_eq!(config.indent, 2);
        assert_eq!(config.max_depth, 64);
        assert_eq!(
            config.policy(),
            Policy {
                orphans: OrphanPolicy::Promote,
                duplicates: DuplicatePolicy::Fail,
            }
        );
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nindent = \"three\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\norphans = \"ignore\"\n")
            .unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn empty_file_returns_default() {
        // Tests that deserialising an empty file returns the default configuration.
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("orgchart.toml");

        let config = Config {
            root_sentinel: Some("-".to_string()),
            indent: 4,
            max_depth: 1000,
            orphans: OrphanPolicy::Fail,
            ..Config::default()
        };
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn root_markers() {
        let config = Config {
            root_sentinel: Some("null".to_string()),
            ..Config::default()
        };

        assert!(config.is_root_marker(""));
        assert!(config.is_root_marker("   "));
        assert!(config.is_root_marker("null"));
        assert!(!config.is_root_marker("NULL"));
        assert!(!config.is_root_marker("boss@example.com"));
        assert!(!Config::default().is_root_marker("null"));
    }
}
