//! JSON-aware rewrite of Superset dashboard exports.

use crate::models::{
    DASHBOARD_TAG, DASHBOARDS_KEY, DATABASE_NAME_KEY, DATASOURCES_KEY, PARAMS_KEY, Projection,
    SLICE_TAG, SLICES_KEY, SQLA_TABLE_TAG, TemplateStats,
};
use crate::{DbSwapError, Result};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

/// Rewrites `database_name` in every slice and datasource params blob.
///
/// Entries of both collections, and the document itself, are rebuilt
/// according to `projection`: with [`Projection::WrapperOnly`] the document
/// only holds `dashboards` and `datasources`, and each entry only its wrapper
/// tag. Every dropped field is logged and counted. Inside each params blob
/// every key other than `database_name` keeps its value and position.
///
/// # Errors
/// Returns [`DbSwapError::MalformedInput`] naming the JSON path of the first
/// missing key, wrongly typed value, or undecodable params blob.
///
/// # Example
/// ```rust
/// use dbswap_core::models::Projection;
/// use dbswap_core::rewrite::rewrite_template;
/// use serde_json::json;
///
/// let template = json!({
///     "dashboards": [],
///     "datasources": [{"__SqlaTable__": {"params": "{\"database_name\":\"old\"}"}}]
/// });
/// let (rewritten, stats) = rewrite_template(template, "new", Projection::WrapperOnly).unwrap();
/// assert_eq!(
///     rewritten["datasources"][0]["__SqlaTable__"]["params"],
///     "{\"database_name\":\"new\"}"
/// );
/// assert_eq!(stats.datasources, 1);
/// ```
pub fn rewrite_template(
    document: Value,
    database_name: &str,
    projection: Projection,
) -> Result<(Value, TemplateStats)> {
    let mut document = match document {
        Value::Object(map) => map,
        other => {
            return Err(DbSwapError::malformed(format!(
                "template root must be an object, found {}",
                json_type(&other)
            )));
        }
    };

    let mut stats = TemplateStats::default();

    let dashboards = take_array(&mut document, DASHBOARDS_KEY)?;
    let mut rebuilt_dashboards = Vec::with_capacity(dashboards.len());
    for (index, entry) in dashboards.into_iter().enumerate() {
        let path = format!("{DASHBOARDS_KEY}[{index}]");
        let mut entry = into_object(entry, &path)?;

        let dashboard_path = format!("{path}.{DASHBOARD_TAG}");
        let dashboard = object_field_mut(&mut entry, DASHBOARD_TAG, &path)?;
        let slices = array_field_mut(dashboard, SLICES_KEY, &dashboard_path)?;

        for (slice_index, slice) in slices.iter_mut().enumerate() {
            let slice_path = format!("{dashboard_path}.{SLICES_KEY}[{slice_index}]");
            let slice = as_object_mut(slice, &slice_path)?;
            let holder = object_field_mut(slice, SLICE_TAG, &slice_path)?;
            let inserted =
                rewrite_params(holder, database_name, &format!("{slice_path}.{SLICE_TAG}"))?;
            if inserted {
                stats.inserted_database_names = stats.inserted_database_names.saturating_add(1);
            }
            stats.slices = stats.slices.saturating_add(1);
        }

        debug!(dashboard = %path, slices = slices.len(), "Rewrote dashboard slices");
        rebuilt_dashboards.push(project(entry, DASHBOARD_TAG, projection, &path, &mut stats));
        stats.dashboards = stats.dashboards.saturating_add(1);
    }

    let datasources = take_array(&mut document, DATASOURCES_KEY)?;
    let mut rebuilt_datasources = Vec::with_capacity(datasources.len());
    for (index, entry) in datasources.into_iter().enumerate() {
        let path = format!("{DATASOURCES_KEY}[{index}]");
        let mut entry = into_object(entry, &path)?;

        let holder = object_field_mut(&mut entry, SQLA_TABLE_TAG, &path)?;
        let inserted =
            rewrite_params(holder, database_name, &format!("{path}.{SQLA_TABLE_TAG}"))?;
        if inserted {
            stats.inserted_database_names = stats.inserted_database_names.saturating_add(1);
        }

        debug!(datasource = %path, "Rewrote datasource params");
        rebuilt_datasources.push(project(entry, SQLA_TABLE_TAG, projection, &path, &mut stats));
        stats.datasources = stats.datasources.saturating_add(1);
    }

    let rebuilt = match projection {
        Projection::PreserveSiblings => {
            document.insert(DASHBOARDS_KEY.to_string(), Value::Array(rebuilt_dashboards));
            document.insert(DATASOURCES_KEY.to_string(), Value::Array(rebuilt_datasources));
            document
        }
        Projection::WrapperOnly => {
            let dropped: Vec<&str> = document
                .keys()
                .map(String::as_str)
                .filter(|key| *key != DASHBOARDS_KEY && *key != DATASOURCES_KEY)
                .collect();
            if !dropped.is_empty() {
                warn!(
                    fields = ?dropped,
                    "Dropping top-level fields outside '{}' and '{}' (use --preserve-siblings to keep them)",
                    DASHBOARDS_KEY,
                    DATASOURCES_KEY
                );
                stats.dropped_fields = stats.dropped_fields.saturating_add(dropped.len());
            }

            let mut rebuilt = Map::new();
            rebuilt.insert(DASHBOARDS_KEY.to_string(), Value::Array(rebuilt_dashboards));
            rebuilt.insert(DATASOURCES_KEY.to_string(), Value::Array(rebuilt_datasources));
            rebuilt
        }
    };

    Ok((Value::Object(rebuilt), stats))
}

/// Decodes `holder.params`, sets `database_name`, and stores the re-encoded blob.
///
/// Returns true when the blob had no `database_name` before.
fn rewrite_params(
    holder: &mut Map<String, Value>,
    database_name: &str,
    path: &str,
) -> Result<bool> {
    let params_path = format!("{path}.{PARAMS_KEY}");
    let raw = holder
        .get_mut(PARAMS_KEY)
        .ok_or_else(|| missing_key(PARAMS_KEY, path))?;

    let encoded = match &*raw {
        Value::String(encoded) => encoded.as_str(),
        other => {
            return Err(DbSwapError::malformed(format!(
                "'{params_path}' must be a JSON-encoded string, found {}",
                json_type(other)
            )));
        }
    };

    let mut params: Value = serde_json::from_str(encoded).map_err(|e| {
        DbSwapError::malformed_with(format!("'{params_path}' does not hold valid JSON"), e)
    })?;

    let params_object = match &mut params {
        Value::Object(map) => map,
        other => {
            return Err(DbSwapError::malformed(format!(
                "'{params_path}' must encode an object, found {}",
                json_type(other)
            )));
        }
    };

    let previous = params_object.insert(
        DATABASE_NAME_KEY.to_string(),
        Value::String(database_name.to_string()),
    );
    if previous.is_none() {
        trace!(params = %params_path, "Inserting missing database_name");
    }

    let reencoded = serde_json::to_string(&params).map_err(|e| {
        DbSwapError::internal(format!("Failed to re-encode '{params_path}'"), e)
    })?;
    *raw = Value::String(reencoded);

    Ok(previous.is_none())
}

/// Rebuilds an entry according to the projection.
fn project(
    entry: Map<String, Value>,
    tag: &str,
    projection: Projection,
    path: &str,
    stats: &mut TemplateStats,
) -> Value {
    match projection {
        Projection::PreserveSiblings => Value::Object(entry),
        Projection::WrapperOnly => {
            let dropped: Vec<&str> = entry
                .keys()
                .map(String::as_str)
                .filter(|key| *key != tag)
                .collect();
            if !dropped.is_empty() {
                warn!(
                    entry = %path,
                    fields = ?dropped,
                    "Dropping fields outside '{}' (use --preserve-siblings to keep them)",
                    tag
                );
                stats.dropped_fields = stats.dropped_fields.saturating_add(dropped.len());
            }

            Value::Object(entry.into_iter().filter(|(key, _)| key == tag).collect())
        }
    }
}

/// Moves the array out of `document[key]`, leaving an empty one in place so
/// the key keeps its position.
fn take_array(document: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match document.get_mut(key) {
        Some(Value::Array(items)) => Ok(std::mem::take(items)),
        Some(other) => Err(DbSwapError::malformed(format!(
            "'{key}' must be an array, found {}",
            json_type(other)
        ))),
        None => Err(missing_key(key, "template root")),
    }
}

fn into_object(value: Value, path: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DbSwapError::malformed(format!(
            "'{path}' must be an object, found {}",
            json_type(&other)
        ))),
    }
}

fn as_object_mut<'a>(value: &'a mut Value, path: &str) -> Result<&'a mut Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DbSwapError::malformed(format!(
            "'{path}' must be an object, found {}",
            json_type(other)
        ))),
    }
}

fn object_field_mut<'a>(
    object: &'a mut Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a mut Map<String, Value>> {
    let value = object.get_mut(key).ok_or_else(|| missing_key(key, path))?;
    as_object_mut(value, &format!("{path}.{key}"))
}

fn array_field_mut<'a>(
    object: &'a mut Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a mut Vec<Value>> {
    match object.get_mut(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(DbSwapError::malformed(format!(
            "'{path}.{key}' must be an array, found {}",
            json_type(other)
        ))),
        None => Err(missing_key(key, path)),
    }
}

fn missing_key(key: &str, path: &str) -> DbSwapError {
    DbSwapError::malformed(format!("missing key '{key}' in '{path}'"))
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
