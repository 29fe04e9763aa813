//! Typed views over service description fragments.
//!
//! The loader hands out raw `serde_json::Value` documents; these structs are
//! what the factory reads when it builds method tables.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identifier definition from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierSchema {
    /// Name the identifier is stored under on a collection instance
    pub var_name: String,
    /// Name the remote API uses for the same value
    pub api_name: String,
}

/// Parameter definition from JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSchema {
    /// Wire name; falls back to the caller-facing name when absent
    #[serde(default)]
    pub api_name: Option<String>,
    /// Informational type tag ("string", "map", ...)
    #[serde(default, rename = "type")]
    pub param_type: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl ParamSchema {
    /// Wire name for a parameter declared as `var_name`
    pub fn wire_name<'a>(&'a self, var_name: &'a str) -> &'a str {
        self.api_name.as_deref().unwrap_or(var_name)
    }
}

/// Operation definition from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSchema {
    pub api_name: String,
    #[serde(default)]
    pub docs: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamSchema>,
}

/// Collection definition from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Name of the resource type this collection produces
    pub resource: String,
    #[serde(default)]
    pub identifiers: Vec<IdentifierSchema>,
    #[serde(default)]
    pub operations: BTreeMap<String, OperationSchema>,
}

/// Collect the `api_name` of every operation of every collection in a
/// service description. Sorted and deduplicated.
pub fn operation_api_names(service_data: &Value) -> Vec<String> {
    let Some(collections) = service_data.get("collections").and_then(|v| v.as_object()) else {
        return Vec::new();
    };

    let mut names: Vec<String> = collections
        .values()
        .filter_map(|c| c.get("operations").and_then(|v| v.as_object()))
        .flat_map(|ops| ops.values())
        .filter_map(|op| op.get("api_name").and_then(|v| v.as_str()))
        .map(|s| s.to_string())
        .collect();

    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_schema_defaults() {
        let schema: CollectionSchema = serde_json::from_value(json!({
            "resource": "Pipeline",
            "operations": {
                "create": { "api_name": "CreatePipeline" }
            }
        }))
        .unwrap();

        assert!(schema.identifiers.is_empty());
        let create = &schema.operations["create"];
        assert_eq!(create.docs, "");
        assert!(create.params.is_empty());
    }

    #[test]
    fn test_param_wire_name_falls_back_to_var_name() {
        let named = ParamSchema {
            api_name: Some("QueueName".to_string()),
            ..Default::default()
        };
        assert_eq!(named.wire_name("name"), "QueueName");
        assert_eq!(ParamSchema::default().wire_name("name"), "name");
    }

    #[test]
    fn test_operation_api_names_across_collections() {
        let doc = json!({
            "collections": {
                "A": { "resource": "X", "operations": {
                    "create": { "api_name": "CreateX" },
                    "delete": { "api_name": "DeleteX" }
                }},
                "B": { "resource": "Y", "operations": {
                    "create": { "api_name": "CreateX" }
                }}
            }
        });
        assert_eq!(operation_api_names(&doc), vec!["CreateX", "DeleteX"]);
        assert!(operation_api_names(&json!({})).is_empty());
    }
}
