//! Template data model and rewrite options.
//!
//! A Superset dashboard export looks like this (trimmed):
//!
//! ```json
//! {
//!     "dashboards": [
//!         {"__Dashboard__": {"slices": [{"__Slice__": {"params": "{\"database_name\": \"x\"}"}}]}}
//!     ],
//!     "datasources": [
//!         {"__SqlaTable__": {"params": "{\"database_name\": \"x\"}"}}
//!     ]
//! }
//! ```
//!
//! Each `params` value is itself a JSON document encoded as a string.

use std::path::PathBuf;

/// Top-level key holding the dashboard entries
pub const DASHBOARDS_KEY: &str = "dashboards";
/// Top-level key holding the datasource entries
pub const DATASOURCES_KEY: &str = "datasources";
/// Wrapper tag of a dashboard entry
pub const DASHBOARD_TAG: &str = "__Dashboard__";
/// Key of the slice list inside a dashboard
pub const SLICES_KEY: &str = "slices";
/// Wrapper tag of a slice entry
pub const SLICE_TAG: &str = "__Slice__";
/// Wrapper tag of a datasource entry
pub const SQLA_TABLE_TAG: &str = "__SqlaTable__";
/// Key of the double-encoded params blob
pub const PARAMS_KEY: &str = "params";
/// Key rewritten inside every params blob
pub const DATABASE_NAME_KEY: &str = "database_name";

/// Placeholder replaced in plain-text mode unless overridden
pub const DEFAULT_PLACEHOLDER: &str = "template_database_name";
/// Input template read when no path is given
pub const DEFAULT_INPUT_FILE: &str = "pgd_monitoring_template.json";
/// Output file written when no path is given
pub const DEFAULT_OUTPUT_FILE: &str = "upload.json";

/// How the input template is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewriteMode {
    /// JSON-aware rewrite of every `params.database_name`
    #[default]
    Structured,
    /// Literal placeholder substitution on raw text
    PlainText,
}

impl std::fmt::Display for RewriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::PlainText => write!(f, "plain-text"),
        }
    }
}

/// What survives of a dashboard or datasource entry when it is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Keep only the wrapper tag; sibling fields are dropped
    #[default]
    WrapperOnly,
    /// Keep every field of the entry
    PreserveSiblings,
}

/// Options for a single rewrite invocation.
///
/// # Example
/// ```rust
/// use dbswap_core::models::{RewriteMode, RewriteOptions};
///
/// let options = RewriteOptions::new("analytics").with_mode(RewriteMode::PlainText);
/// assert!(options.validate().is_ok());
/// assert!(RewriteOptions::new("").validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Database name written into the template
    pub database_name: String,
    /// Template interpretation
    pub mode: RewriteMode,
    /// Token replaced in plain-text mode
    pub placeholder: String,
    /// Shape of rebuilt entries in structured mode
    pub projection: Projection,
}

impl RewriteOptions {
    /// Creates options for `database_name` with default mode, placeholder and projection.
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            mode: RewriteMode::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            projection: Projection::default(),
        }
    }

    /// Builder method to set the rewrite mode.
    pub const fn with_mode(mut self, mode: RewriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method to set the plain-text placeholder.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Builder method to set the projection of rebuilt entries.
    pub const fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    /// Returns [`crate::DbSwapError::InvalidArgument`] for an empty database
    /// name, or an empty placeholder in plain-text mode.
    pub fn validate(&self) -> crate::Result<()> {
        if self.database_name.is_empty() {
            return Err(crate::DbSwapError::invalid_argument(
                "database name must not be empty",
            ));
        }

        if self.mode == RewriteMode::PlainText && self.placeholder.is_empty() {
            return Err(crate::DbSwapError::invalid_argument(
                "placeholder must not be empty",
            ));
        }

        Ok(())
    }
}

/// Counters collected while rewriting a structured template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateStats {
    /// Dashboard entries rebuilt
    pub dashboards: usize,
    /// Slice params blobs rewritten
    pub slices: usize,
    /// Datasource params blobs rewritten
    pub datasources: usize,
    /// Params blobs that had no `database_name` key before the rewrite
    pub inserted_database_names: usize,
    /// Sibling fields removed by [`Projection::WrapperOnly`]
    pub dropped_fields: usize,
}

impl TemplateStats {
    /// Total number of params blobs rewritten.
    pub const fn params_rewritten(&self) -> usize {
        self.slices.saturating_add(self.datasources)
    }
}

/// Outcome of a successful [`crate::rewrite::rewrite`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    /// Mode the template was processed in
    pub mode: RewriteMode,
    /// Template that was read
    pub input: PathBuf,
    /// File that was written
    pub output: PathBuf,
    /// Structured mode counters (all zero in plain-text mode)
    pub stats: TemplateStats,
    /// Placeholder occurrences replaced (zero in structured mode)
    pub replacements: usize,
    /// Bytes written to the output file
    pub bytes_written: usize,
}
