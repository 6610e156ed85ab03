//! Command-line surface for dbswap.
//!
//! The binary in `main.rs` only parses arguments, installs logging and maps
//! the outcome of [`run`] onto an exit status. Everything it does is exposed
//! here so it can be exercised from tests.

use clap::{Args, Parser, ValueEnum};
use dbswap_core::models::{DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE, DEFAULT_PLACEHOLDER};
use dbswap_core::{DbSwapError, Projection, RewriteMode, RewriteOptions, RewriteReport};
use std::path::PathBuf;
use tracing::{debug, info};

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "dbswap")]
#[command(about = "Rewrites the database name inside a Superset dashboard import template")]
#[command(version)]
#[command(long_about = "
dbswap - Superset template database rewriter

Reads a dashboard export template, replaces the database name it refers to,
and writes an upload file ready for Superset's Import Dashboard option.

MODES:
- structured (default): rewrites `database_name` inside every slice and
  datasource params blob; input and output must be .json files
- plain-text: replaces every literal occurrence of a placeholder token

EXAMPLES:
  dbswap bdrdb
  dbswap -d bdrdb -i pgd_monitoring_template.json -o upload.json
  dbswap --mode plain-text --placeholder template_database_name bdrdb -i import_template.json
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Target database name (takes precedence over -d and the environment)
    #[arg(value_name = "DATABASE_NAME", required_unless_present = "database_name")]
    pub database: Option<String>,

    /// Target database name (flag form)
    #[arg(
        short = 'd',
        long = "database_name",
        visible_alias = "database-name",
        env = "DBSWAP_DATABASE_NAME",
        value_name = "NAME"
    )]
    pub database_name: Option<String>,

    /// Template to read
    #[arg(
        short = 'i',
        long = "input_file",
        visible_alias = "input-file",
        env = "DBSWAP_INPUT_FILE",
        default_value = DEFAULT_INPUT_FILE
    )]
    pub input_file: PathBuf,

    /// Upload file to write
    #[arg(
        short = 'o',
        long = "output_file",
        visible_alias = "output-file",
        env = "DBSWAP_OUTPUT_FILE",
        default_value = DEFAULT_OUTPUT_FILE
    )]
    pub output_file: PathBuf,

    /// How the template is interpreted
    #[arg(short, long, value_enum, default_value_t = ModeArg::Structured)]
    pub mode: ModeArg,

    /// Token replaced in plain-text mode
    #[arg(long, default_value = DEFAULT_PLACEHOLDER)]
    pub placeholder: String,

    /// Keep fields next to the wrapper tag of dashboard and datasource entries
    #[arg(long)]
    pub preserve_siblings: bool,
}

/// Template interpretation as accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// JSON-aware rewrite of params blobs
    Structured,
    /// Literal placeholder substitution
    PlainText,
}

impl From<ModeArg> for RewriteMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Structured => Self::Structured,
            ModeArg::PlainText => Self::PlainText,
        }
    }
}

/// Logging flags shared by every invocation
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,
}

impl Cli {
    /// The database name to write, preferring the positional form.
    pub fn target_database(&self) -> Option<&str> {
        self.database
            .as_deref()
            .or(self.database_name.as_deref())
    }

    /// Converts the parsed arguments into rewrite options.
    ///
    /// # Errors
    /// Returns [`DbSwapError::InvalidArgument`] if no database name was given
    /// or the options fail validation.
    pub fn rewrite_options(&self) -> Result<RewriteOptions, DbSwapError> {
        let database_name = self
            .target_database()
            .ok_or_else(|| DbSwapError::invalid_argument("a database name is required"))?;

        let projection = if self.preserve_siblings {
            Projection::PreserveSiblings
        } else {
            Projection::WrapperOnly
        };

        let options = RewriteOptions::new(database_name)
            .with_mode(self.mode.into())
            .with_placeholder(self.placeholder.clone())
            .with_projection(projection);
        options.validate()?;
        Ok(options)
    }
}

/// Runs one rewrite and logs the start and completion messages.
///
/// Failures are returned untouched; the caller logs them and picks the exit
/// status.
///
/// # Errors
/// Any [`DbSwapError`] raised while validating options or rewriting.
pub fn run(cli: &Cli) -> Result<RewriteReport, DbSwapError> {
    let options = cli.rewrite_options()?;
    info!("Database name entered: {}", options.database_name);

    let report = dbswap_core::rewrite(&cli.input_file, &cli.output_file, &options)?;
    debug!(
        mode = %report.mode,
        params_rewritten = report.stats.params_rewritten(),
        dropped_fields = report.stats.dropped_fields,
        replacements = report.replacements,
        bytes_written = report.bytes_written,
        "Wrote '{}'",
        report.output.display()
    );

    info!("{}", completion_message(&report, &options.database_name));
    Ok(report)
}

/// Human-readable instructions printed after a successful rewrite.
pub fn completion_message(report: &RewriteReport, database_name: &str) -> String {
    format!(
        "Upload file generated. Please import the '{}' file in your Superset using \
         Import Dashboard option under Settings menu on Database '{}'",
        report.output.display(),
        database_name
    )
}
