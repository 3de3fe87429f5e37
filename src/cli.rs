use std::path::{Path, PathBuf};

mod terminal;

use anyhow::Context;
use clap::ArgAction;
use orgchart::{
    Config, Hierarchy, Identifier, Index, InputFormat, OutputFormat,
    domain::{DuplicatePolicy, OrphanPolicy},
    storage::{self, writer::DocumentWriter},
};
use terminal::Colorize;
use tracing::instrument;

/// The configuration file looked up in the working directory when `--config`
/// is not given.
const DEFAULT_CONFIG: &str = "orgchart.toml";

/// Build organizational hierarchy trees from a flat list of employee/manager
/// records.
#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The input document
    input: PathBuf,

    /// Name of the output document, without extension
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Write the document to stdout instead of a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Output format (json, yaml)
    #[arg(short, long, default_value_t)]
    format: OutputFormat,

    /// Input format (xml, json, yaml); guessed from the extension by default
    #[arg(long)]
    input_format: Option<InputFormat>,

    /// Employees whose manager has no record (drop, promote, fail)
    #[arg(long)]
    orphans: Option<OrphanPolicy>,

    /// Identifiers that appear in more than one record (last-wins, fail)
    #[arg(long)]
    duplicates: Option<DuplicatePolicy>,

    /// Key the identifier is written under in the output
    #[arg(long)]
    identifier_key: Option<String>,

    /// Path to a configuration file [default: ./orgchart.toml if present]
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = self.config()?;
        self.convert(&config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(terminal::supports_color())
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }

    /// Resolves the configuration file and applies command-line overrides.
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                Config::load(path).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?
            }
            None => load_default_config(Path::new(DEFAULT_CONFIG)),
        };

        if let Some(orphans) = self.orphans {
            config.orphans = orphans;
        }
        if let Some(duplicates) = self.duplicates {
            config.duplicates = duplicates;
        }
        if let Some(key) = &self.identifier_key {
            config.identifier_key.clone_from(key);
        }

        Ok(config)
    }

    #[instrument(skip(self, config))]
    fn convert(&self, config: &Config) -> anyhow::Result<()> {
        let format = self
            .input_format
            .unwrap_or_else(|| InputFormat::from_path(&self.input));
        let relations = storage::load_relations(&self.input, format, config)
            .with_context(|| format!("failed to load {}", self.input.display()))?;
        let records = relations.len();

        let hierarchy = Hierarchy::from_index(Index::build(relations), config.policy());
        let forest = hierarchy
            .build()
            .with_context(|| format!("failed to build hierarchy from {}", self.input.display()))?;

        let document = forest
            .records()
            .with_identifier_key(&config.identifier_key);
        let writer =
            DocumentWriter::new(self.format, config.indent).with_max_depth(config.max_depth);

        let destination = if self.stdout {
            writer
                .write(std::io::stdout().lock(), &document)
                .context("failed to write to stdout")?;
            "stdout".to_string()
        } else {
            let path = writer
                .save(&self.output, &document)
                .with_context(|| format!("failed to write {}", self.output.display()))?;
            path.display().to_string()
        };

        let summary = format!(
            "{} tree(s), {} employee(s) from {records} record(s) written to {destination}",
            forest.roots().len(),
            forest.len(),
        );
        eprintln!("{}", summary.success());

        let unattached = hierarchy.unattached();
        if !unattached.is_empty() {
            let names: Vec<&str> = unattached.iter().copied().map(Identifier::as_str).collect();
            let warning = format!(
                "{} employee(s) not attached to any tree: {}",
                unattached.len(),
                names.join(", ")
            );
            eprintln!("{}", warning.warning());
        }

        Ok(())
    }
}

/// Loads the configuration at `path`, falling back to the defaults when it
/// is missing or invalid.
fn load_default_config(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Config::default();
    }

    Config::load(path).unwrap_or_else(|e| {
        tracing::warn!("Ignoring {}: {e}", path.display());
        Config::default()
    })
}
