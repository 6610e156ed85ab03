//! Input validation for dashboard templates.
//!
//! Two layers run before any template is rewritten:
//! - path validation: structured templates and their outputs must carry the
//!   `.json` extension
//! - shape validation: the parsed document is checked against an embedded
//!   JSON Schema describing the Superset export layout
//!
//! The schema only describes the keys the rewriter relies on; any other
//! fields in the export are allowed and ignored.
//!
//! # Example
//! ```rust
//! use dbswap_core::validation::{initialize_schema_validator, validate_template};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! initialize_schema_validator()?;
//! validate_template(&json!({"dashboards": [], "datasources": []}))?;
//! # Ok(())
//! # }
//! ```

use jsonschema::Validator;
use serde_json::Value;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Template validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// Validation failed with one message per violation
    #[error("Template validation failed with {error_count} errors: {}", errors.join("; "))]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// Path does not carry the extension the mode requires
    #[error("{role} file '{path}' must have JSON extension")]
    Extension { role: &'static str, path: String },
}

impl From<ValidationError> for crate::DbSwapError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::Extension { .. } => Self::invalid_argument(error.to_string()),
            ValidationError::SchemaCompilation { .. } => {
                Self::internal("template schema unavailable", error)
            }
            ValidationError::ValidationFailed { .. } => {
                Self::malformed_with("template does not match the dashboard export layout", error)
            }
        }
    }
}

/// Embedded JSON Schema for the Superset dashboard export layout
const TEMPLATE_SCHEMA: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "Superset dashboard export template",
  "type": "object",
  "required": ["dashboards", "datasources"],
  "properties": {
    "dashboards": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["__Dashboard__"],
        "properties": {
          "__Dashboard__": {
            "type": "object",
            "required": ["slices"],
            "properties": {
              "slices": {
                "type": "array",
                "items": {
                  "type": "object",
                  "required": ["__Slice__"],
                  "properties": {
                    "__Slice__": { "$ref": "#/$defs/paramsHolder" }
                  }
                }
              }
            }
          }
        }
      }
    },
    "datasources": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["__SqlaTable__"],
        "properties": {
          "__SqlaTable__": { "$ref": "#/$defs/paramsHolder" }
        }
      }
    }
  },
  "$defs": {
    "paramsHolder": {
      "type": "object",
      "required": ["params"],
      "properties": {
        "params": { "type": "string" }
      }
    }
  }
}"##;

/// Compiled JSON Schema instance (initialized once)
static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Initialize and compile the template JSON Schema.
///
/// Safe to call more than once; later calls keep the first compiled schema.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_schema_validator() -> Result<(), ValidationError> {
    compiled_schema().map(|_| ())
}

fn compiled_schema() -> Result<&'static Validator, ValidationError> {
    if let Some(schema) = COMPILED_SCHEMA.get() {
        return Ok(schema);
    }

    let schema_json = get_schema_definition()?;
    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    // A concurrent caller may have stored its copy first; both are identical
    Ok(COMPILED_SCHEMA.get_or_init(|| compiled))
}

/// Validate a parsed template against the dashboard export layout.
///
/// Initializes the schema on first use, so callers do not have to.
///
/// # Errors
/// Returns `ValidationError::ValidationFailed` listing every violation, each
/// prefixed with the location of the offending value
/// (`dashboards[0].__Dashboard__.slices[1].__Slice__: "params" is a required property`).
pub fn validate_template(json_value: &Value) -> Result<(), ValidationError> {
    let schema = compiled_schema()?;

    let errors: Vec<String> = schema
        .iter_errors(json_value)
        .map(|error| {
            format!(
                "{}: {}",
                pointer_to_path(&error.instance_path().to_string()),
                error
            )
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::ValidationFailed {
            error_count: errors.len(),
            errors,
        })
    }
}

/// Converts a JSON Pointer (`/dashboards/0/__Dashboard__`) into the dotted
/// form used in rewrite errors (`dashboards[0].__Dashboard__`).
///
/// The empty pointer names the document itself.
pub fn pointer_to_path(pointer: &str) -> String {
    let mut path = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(&segment);
        }
    }

    if path.is_empty() {
        "template root".to_string()
    } else {
        path
    }
}

/// Check that `path` ends in the `.json` extension.
///
/// The comparison is exact: `upload.JSON` and a bare `.json` are rejected.
/// `role` names the path in the error message ("Input", "Output").
///
/// # Errors
/// Returns `ValidationError::Extension` if the extension is missing or different.
pub fn validate_json_extension(path: &Path, role: &'static str) -> Result<(), ValidationError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(()),
        _ => Err(ValidationError::Extension {
            role,
            path: path.display().to_string(),
        }),
    }
}

/// Get the embedded JSON Schema as a parsed Value.
pub fn get_schema_definition() -> Result<Value, ValidationError> {
    serde_json::from_str(TEMPLATE_SCHEMA).map_err(|e| ValidationError::SchemaCompilation {
        message: format!("Failed to parse embedded schema: {}", e),
    })
}
