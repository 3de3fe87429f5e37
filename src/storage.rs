//! Reading relations from input documents and writing output documents.

use std::{ffi::OsStr, fmt, fs, io, path::Path, str::FromStr};

use tracing::instrument;

use crate::domain::{Config, Identifier, Relation};

mod structured;
mod xml;

/// Encoding output documents.
pub mod writer;
pub use writer::{OutputFormat, WriteError};

/// The encoding of an input document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// A root element whose children are records of `<field id="...">`
    /// elements.
    #[default]
    Xml,
    /// A JSON array of `{ "id": ..., "manager": ... }` objects.
    Json,
    /// A YAML sequence of `{ id: ..., manager: ... }` mappings.
    Yaml,
}

impl InputFormat {
    /// Guesses the format from a file extension, falling back to XML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Xml,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Yaml => "yaml",
        })
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!(
                "unknown input format '{other}' (expected xml, json or yaml)"
            )),
        }
    }
}

/// Errors that can occur while loading relations.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The input could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The XML document is not well formed.
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// An XML attribute is not well formed.
    #[error("invalid XML attribute: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),
    /// The JSON document could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The YAML document could not be parsed.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A record has no field holding the employee identifier.
    #[error("record {record} has no '{field}' field")]
    MissingField {
        /// One-based record number.
        record: usize,
        /// The name of the missing field.
        field: String,
    },
    /// A record's employee identifier is blank.
    #[error("record {record} has an empty identifier")]
    EmptyIdentifier {
        /// One-based record number.
        record: usize,
    },
}

/// Builds the relation read from record number `record` (one-based).
///
/// Identifiers are trimmed. A manager value the config treats as a root
/// marker means no manager.
fn relation(
    record: usize,
    id: &str,
    manager: Option<&str>,
    config: &Config,
) -> Result<Relation, LoadError> {
    let identifier = |value: &str| {
        Identifier::try_from(value.trim()).map_err(|_| LoadError::EmptyIdentifier { record })
    };

    let id = identifier(id)?;
    let manager = manager
        .filter(|manager| !config.is_root_marker(manager))
        .map(identifier)
        .transpose()?;

    Ok(Relation { id, manager })
}

/// Reads all relations from the file at `path`, in document order.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a valid document of
/// the given format, or contains a record without an employee identifier.
#[instrument(skip(config))]
pub fn load_relations(
    path: &Path,
    format: InputFormat,
    config: &Config,
) -> Result<Vec<Relation>, LoadError> {
    let content = fs::read_to_string(path)?;
    let relations = parse_relations(&content, format, config)?;
    tracing::info!("Loaded {} records from {}", relations.len(), path.display());
    Ok(relations)
}

/// Parses relations from an in-memory document.
///
/// # Errors
///
/// See [`load_relations`].
pub fn parse_relations(
    content: &str,
    format: InputFormat,
    config: &Config,
) -> Result<Vec<Relation>, LoadError> {
    match format {
        InputFormat::Xml => xml::parse(content, config),
        InputFormat::Json => structured::parse_json(content, config),
        InputFormat::Yaml => structured::parse_yaml(content, config),
    }
}
