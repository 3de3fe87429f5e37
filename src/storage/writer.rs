//! Persisting serialized forests.
//!
//! JSON output is indented with a configurable number of spaces; YAML uses
//! the encoder's own layout. Both encoders recurse once per tree level, so the
//! writer refuses forests deeper than its limit before writing anything.
//! Files are written next to their destination and renamed into place.

use std::{
    fmt,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::domain::record::Records;

/// The deepest forest a [`DocumentWriter`] encodes unless configured
/// otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// The encoding of an output document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl OutputFormat {
    /// The file extension documents of this format are written with.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// The path a document named `name` is written to.
    ///
    /// The format's extension is appended to the name, so `reports/output`
    /// becomes `reports/output.json`.
    #[must_use]
    pub fn path_for(self, name: &Path) -> PathBuf {
        let mut file_name = name.as_os_str().to_owned();
        file_name.push(".");
        file_name.push(self.extension());
        PathBuf::from(file_name)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!(
                "unknown output format '{other}' (expected json or yaml)"
            )),
        }
    }
}

/// Errors that can occur while writing a document.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The document could not be written.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The value could not be encoded as JSON.
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The value could not be encoded as YAML.
    #[error("failed to encode YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The forest is deeper than the writer is allowed to encode.
    #[error("forest is {depth} levels deep; output is limited to {limit} levels")]
    TooDeep {
        /// Levels in the deepest tree.
        depth: usize,
        /// The configured limit.
        limit: usize,
    },
}

/// Encodes forests in one format.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    format: OutputFormat,
    indent: Vec<u8>,
    max_depth: usize,
}

impl DocumentWriter {
    /// A writer for `format`, indenting JSON by `indent` spaces per level.
    #[must_use]
    pub fn new(format: OutputFormat, indent: usize) -> Self {
        Self {
            format,
            indent: vec![b' '; indent],
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Refuses forests with more than `max_depth` levels.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn check_depth(&self, records: &Records<'_>) -> Result<(), WriteError> {
        let depth = records.depth();
        if depth > self.max_depth {
            return Err(WriteError::TooDeep {
                depth,
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    /// Encodes `records` to `writer`, followed by a newline.
    ///
    /// Nothing is written if the forest is too deep.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest exceeds the depth limit, or if encoding
    /// or writing fails.
    pub fn write<W: Write>(&self, mut writer: W, records: &Records<'_>) -> Result<(), WriteError> {
        self.check_depth(records)?;
        self.encode(&mut writer, records)?;
        writer.flush()?;
        Ok(())
    }

    fn encode<W: Write>(&self, mut writer: W, records: &Records<'_>) -> Result<(), WriteError> {
        match self.format {
            OutputFormat::Json => {
                let formatter = PrettyFormatter::with_indent(&self.indent);
                let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
                records.serialize(&mut serializer)?;
                writer.write_all(b"\n")?;
            }
            OutputFormat::Yaml => serde_yaml::to_writer(&mut writer, records)?,
        }
        Ok(())
    }

    /// Encodes `records` and persists them as `name` plus the format's
    /// extension.
    ///
    /// The document is written to a temporary file in the same directory and
    /// renamed into place, so an existing document is either replaced whole or
    /// left untouched. Returns the path written to.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest exceeds the depth limit, the file cannot
    /// be created or the records cannot be encoded.
    pub fn save(&self, name: &Path, records: &Records<'_>) -> Result<PathBuf, WriteError> {
        self.check_depth(records)?;

        let path = self.format.path_for(name);
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut file = NamedTempFile::new_in(dir)?;
        self.write(BufWriter::new(file.as_file_mut()), records)?;
        file.persist(&path).map_err(io::Error::from)?;

        tracing::info!("Wrote {}", path.display());
        Ok(path)
    }
}
