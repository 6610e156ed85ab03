//! Core template handling for dbswap.
//!
//! dbswap rewrites the database name inside Superset dashboard import
//! templates. This crate holds everything except the command-line surface:
//! - the template model and rewrite options ([`models`])
//! - extension and JSON-shape validation ([`validation`])
//! - the structured and plain-text transforms and the file-level
//!   [`rewrite::rewrite`] operation ([`rewrite`])
//! - the error taxonomy ([`error`]) and logging setup ([`logging`])
//!
//! # Example
//! ```rust
//! use dbswap_core::models::Projection;
//! use dbswap_core::rewrite::{render_document, rewrite_template};
//! use serde_json::json;
//!
//! let template = json!({
//!     "dashboards": [{"__Dashboard__": {"slices": [
//!         {"__Slice__": {"params": "{\"database_name\":\"old\"}"}}
//!     ]}}],
//!     "datasources": []
//! });
//! let (rewritten, _) = rewrite_template(template, "new", Projection::WrapperOnly)?;
//! assert!(render_document(&rewritten)?.contains(r#"{\"database_name\":\"new\"}"#));
//! # Ok::<(), dbswap_core::DbSwapError>(())
//! ```

pub mod error;
pub mod logging;
pub mod models;
pub mod rewrite;
pub mod validation;

// Re-export commonly used types
pub use error::{DbSwapError, IoOperation, Result};
pub use logging::init_logging;
pub use models::{Projection, RewriteMode, RewriteOptions, RewriteReport, TemplateStats};
pub use rewrite::{replace_placeholder, rewrite, rewrite_template};
pub use validation::{ValidationError, validate_json_extension, validate_template};
