//! File-level template rewriting.
//!
//! [`rewrite`] performs the whole read, transform, write sequence for one
//! template. The input is read and closed before the output is opened, and
//! the output is only created once the transform has succeeded.

mod plain_text;
mod structured;

pub use plain_text::replace_placeholder;
pub use structured::rewrite_template;

use crate::error::{DbSwapError, IoOperation};
use crate::models::{RewriteMode, RewriteOptions, RewriteReport, TemplateStats};
use crate::validation::{validate_json_extension, validate_template};
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rewrites the template at `input` into `output`.
///
/// # Errors
/// - [`DbSwapError::InvalidArgument`] for invalid options or, in structured
///   mode, a path without the `.json` extension
/// - [`DbSwapError::NotFound`] if `input` does not exist
/// - [`DbSwapError::IoFailure`] if reading or writing fails
/// - [`DbSwapError::MalformedInput`] for non UTF-8 input, invalid JSON or a
///   template that does not match the export layout
/// - [`DbSwapError::Internal`] if the rewritten document cannot be serialized
///
/// # Example
/// ```rust,no_run
/// use dbswap_core::models::RewriteOptions;
/// use dbswap_core::rewrite::rewrite;
/// use std::path::Path;
///
/// let report = rewrite(
///     Path::new("pgd_monitoring_template.json"),
///     Path::new("upload.json"),
///     &RewriteOptions::new("bdrdb"),
/// )?;
/// println!("rewrote {} params blobs", report.stats.params_rewritten());
/// # Ok::<(), dbswap_core::DbSwapError>(())
/// ```
pub fn rewrite(input: &Path, output: &Path, options: &RewriteOptions) -> Result<RewriteReport> {
    options.validate()?;

    if options.mode == RewriteMode::Structured {
        validate_json_extension(input, "Input")?;
        validate_json_extension(output, "Output")?;
    }

    debug!(
        input = %input.display(),
        output = %output.display(),
        mode = %options.mode,
        "Rewriting template"
    );

    let content = read_template(input)?;

    let (rendered, stats, replacements) = match options.mode {
        RewriteMode::Structured => {
            let document = parse_template(&content)?;
            validate_template(&document)?;
            let (rewritten, stats) =
                rewrite_template(document, &options.database_name, options.projection)?;
            info!(
                dashboards = stats.dashboards,
                slices = stats.slices,
                datasources = stats.datasources,
                "Replaced database name in {} params blobs",
                stats.params_rewritten()
            );
            if stats.inserted_database_names > 0 {
                warn!(
                    "{} params blobs had no database_name; it was added",
                    stats.inserted_database_names
                );
            }
            (render_document(&rewritten)?, stats, 0)
        }
        RewriteMode::PlainText => {
            let (text, count) =
                replace_placeholder(&content, &options.placeholder, &options.database_name);
            if count == 0 {
                warn!(
                    "Placeholder '{}' not found in '{}'; output is a verbatim copy",
                    options.placeholder,
                    input.display()
                );
            } else {
                info!("Replaced {} occurrences of '{}'", count, options.placeholder);
            }
            (text, TemplateStats::default(), count)
        }
    };

    write_output(output, &rendered)?;

    Ok(RewriteReport {
        mode: options.mode,
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        stats,
        replacements,
        bytes_written: rendered.len(),
    })
}

/// Parses template text as JSON.
///
/// # Errors
/// Returns [`DbSwapError::MalformedInput`] wrapping the parser error.
pub fn parse_template(content: &str) -> Result<Value> {
    serde_json::from_str(content)
        .map_err(|e| DbSwapError::malformed_with("template is not valid JSON", e))
}

/// Serializes a document with four-space indentation, keeping key order.
///
/// # Errors
/// Returns [`DbSwapError::Internal`] if serialization fails.
pub fn render_document(document: &Value) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document
        .serialize(&mut serializer)
        .map_err(|e| DbSwapError::internal("Failed to serialize rewritten template", e))?;

    String::from_utf8(buffer)
        .map_err(|e| DbSwapError::internal("Serialized template is not valid UTF-8", e))
}

fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| DbSwapError::from_io(IoOperation::Read, path, e))
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| DbSwapError::from_io(IoOperation::Write, path, e))
}
