//! Parameter set merging and flattening.

use std::collections::HashMap;

use serde_json::Value;

/// An ordered mapping from parameter key to scalar or nested mapping.
///
/// Layers of these are merged with single-level precedence: a key present
/// in a later layer shadows the earlier one wholesale, nested objects are
/// not merged recursively.
pub type ParameterSet = serde_json::Map<String, Value>;

/// Merges parameter layers in ascending precedence order.
///
/// The last layer wins for any key present in more than one layer. The
/// merge is a single-level spread: shadowing replaces the whole value,
/// including nested objects.
#[must_use]
pub fn merge(layers: &[&ParameterSet]) -> ParameterSet {
    let mut merged = ParameterSet::new();
    for layer in layers {
        for (key, value) in *layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Flattens a parameter set into dot-path-keyed scalar entries.
///
/// Nested objects contribute entries keyed by their joined path
/// (`a.b.c`), so compound variable names in templates can reach into
/// nested configuration. Numbers and booleans are rendered with their
/// canonical text form. Nulls and arrays contribute nothing: a marker
/// referencing them stays unresolved in the output, which keeps the gap
/// visible.
#[must_use]
pub fn flatten(set: &ParameterSet) -> HashMap<String, String> {
    let mut flat = HashMap::new();
    for (key, value) in set {
        flatten_value(key, value, &mut flat);
    }
    flat
}

fn flatten_value(path: &str, value: &Value, flat: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_value(&format!("{path}.{key}"), nested, flat);
            }
        }
        Value::String(s) => {
            flat.insert(path.to_string(), s.clone());
        }
        Value::Number(n) => {
            flat.insert(path.to_string(), n.to_string());
        }
        Value::Bool(b) => {
            flat.insert(path.to_string(), b.to_string());
        }
        Value::Null | Value::Array(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_set(value: Value) -> ParameterSet {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_merge_precedence() {
        let project = as_set(json!({ "region": "us-east-1", "stage": "dev" }));
        let build = as_set(json!({ "stage": "test" }));
        let stack = as_set(json!({ "stage": "prod", "memory": 512 }));

        let merged = merge(&[&project, &build, &stack]);

        assert_eq!(merged["region"], json!("us-east-1"));
        assert_eq!(merged["stage"], json!("prod"));
        assert_eq!(merged["memory"], json!(512));
    }

    #[test]
    fn test_merge_shadows_nested_objects_wholesale() {
        let low = as_set(json!({ "vpc": { "cidr": "10.0.0.0/16", "az": "a" } }));
        let high = as_set(json!({ "vpc": { "cidr": "10.1.0.0/16" } }));

        let merged = merge(&[&low, &high]);

        // Single-level spread: the nested "az" from the lower layer is gone.
        assert_eq!(merged["vpc"], json!({ "cidr": "10.1.0.0/16" }));
    }

    #[test]
    fn test_flatten_nested_paths() {
        let set = as_set(json!({
            "projectName": "Acme",
            "vpc": { "cidr": "10.0.0.0/16", "subnets": { "public": "10.0.1.0/24" } },
            "memory": 512,
            "tracing": true
        }));

        let flat = flatten(&set);

        assert_eq!(flat["projectName"], "Acme");
        assert_eq!(flat["vpc.cidr"], "10.0.0.0/16");
        assert_eq!(flat["vpc.subnets.public"], "10.0.1.0/24");
        assert_eq!(flat["memory"], "512");
        assert_eq!(flat["tracing"], "true");
    }

    #[test]
    fn test_flatten_skips_nulls_and_arrays() {
        let set = as_set(json!({ "missing": null, "list": [1, 2, 3] }));

        let flat = flatten(&set);

        assert!(flat.is_empty());
    }
}
