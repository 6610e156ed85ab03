//! Property tests for the structured rewrite.
//!
//! Generated templates carry arbitrary extra keys in every params blob; after
//! the rewrite each blob must hold the new database name and nothing else may
//! change.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use dbswap_core::models::Projection;
use dbswap_core::rewrite::{render_document, rewrite_template};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn params_strategy() -> impl Strategy<Value = Map<String, Value>> {
    let scalar = prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 _-]{0,12}".prop_map(Value::from),
        Just(Value::Null),
    ];
    (
        prop::collection::vec(("[a-z_]{1,10}", scalar), 0..6),
        prop::option::of("[a-z0-9_]{1,12}"),
    )
        .prop_map(|(pairs, original_name)| {
            let mut params = Map::new();
            for (key, value) in pairs {
                if key != "database_name" {
                    params.insert(key, value);
                }
            }
            if let Some(name) = original_name {
                params.insert("database_name".to_string(), Value::from(name));
            }
            params
        })
}

fn encode(params: &Map<String, Value>) -> Value {
    Value::String(serde_json::to_string(params).expect("params encode"))
}

fn template_strategy() -> impl Strategy<Value = (Value, Vec<Map<String, Value>>)> {
    (
        prop::collection::vec(prop::collection::vec(params_strategy(), 0..4), 0..3),
        prop::collection::vec(params_strategy(), 0..4),
    )
        .prop_map(|(dashboards, datasources)| {
            let mut originals = Vec::new();
            let dashboards: Vec<Value> = dashboards
                .into_iter()
                .map(|slices| {
                    let slices: Vec<Value> = slices
                        .into_iter()
                        .map(|params| {
                            let slice = json!({"__Slice__": {"params": encode(&params)}});
                            originals.push(params);
                            slice
                        })
                        .collect();
                    json!({"__Dashboard__": {"slices": slices}})
                })
                .collect();
            let datasources: Vec<Value> = datasources
                .into_iter()
                .map(|params| {
                    let datasource = json!({"__SqlaTable__": {"params": encode(&params)}});
                    originals.push(params);
                    datasource
                })
                .collect();
            (
                json!({"dashboards": dashboards, "datasources": datasources}),
                originals,
            )
        })
}

/// Decoded params blobs in document order: slices first, then datasources.
fn collect_params(document: &Value) -> Vec<Map<String, Value>> {
    let mut blobs = Vec::new();
    for dashboard in document["dashboards"].as_array().unwrap() {
        for slice in dashboard["__Dashboard__"]["slices"].as_array().unwrap() {
            blobs.push(decode(&slice["__Slice__"]["params"]));
        }
    }
    for datasource in document["datasources"].as_array().unwrap() {
        blobs.push(decode(&datasource["__SqlaTable__"]["params"]));
    }
    blobs
}

fn decode(value: &Value) -> Map<String, Value> {
    serde_json::from_str(value.as_str().unwrap()).unwrap()
}

proptest! {
    #[test]
    fn rewritten_params_hold_new_name_and_keep_other_keys(
        (template, originals) in template_strategy(),
        name in "\\PC{1,20}",
    ) {
        let (rewritten, stats) =
            rewrite_template(template, &name, Projection::WrapperOnly).unwrap();
        let blobs = collect_params(&rewritten);

        prop_assert_eq!(blobs.len(), originals.len());
        prop_assert_eq!(stats.params_rewritten(), originals.len());

        for (blob, original) in blobs.iter().zip(&originals) {
            prop_assert_eq!(blob.get("database_name"), Some(&Value::from(name.as_str())));
            for (key, value) in original {
                if key != "database_name" {
                    prop_assert_eq!(blob.get(key), Some(value));
                }
            }
            let extra_keys = blob.keys().filter(|key| !original.contains_key(*key)).count();
            prop_assert!(extra_keys <= 1);
        }
    }

    #[test]
    fn rewriting_twice_is_byte_identical(
        (template, _) in template_strategy(),
        name in "[a-zA-Z0-9_]{1,16}",
    ) {
        let (once, _) = rewrite_template(template, &name, Projection::WrapperOnly).unwrap();
        let (twice, stats) =
            rewrite_template(once.clone(), &name, Projection::WrapperOnly).unwrap();

        prop_assert_eq!(render_document(&once).unwrap(), render_document(&twice).unwrap());
        prop_assert_eq!(stats.inserted_database_names, 0);
    }
}
