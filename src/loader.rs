use std::collections::HashMap;

use serde_json::Value;

use crate::types::{McpError, PropertyType, Resource, SchemaMeta, SchemaRequirementSet, Tool};

/// Parse tool definitions from raw JSON bytes.
pub fn parse_tools(data: &[u8]) -> Result<Vec<Tool>, McpError> {
    let raw: Vec<Value> = serde_json::from_slice(data)?;
    let mut tools = Vec::with_capacity(raw.len());

    for val in raw {
        let name = val["name"].as_str().unwrap_or_default().to_string();
        let description = val["description"].as_str().unwrap_or_default().to_string();
        let input_schema = val["inputSchema"].clone();
        let meta = val.get("_meta").filter(|m| m.is_object()).cloned();

        let schema_meta = parse_schema_meta(&input_schema);

        tools.push(Tool {
            name,
            description,
            input_schema,
            meta,
            schema_meta,
        });
    }

    Ok(tools)
}

/// Parse resource definitions from raw JSON bytes.
pub fn parse_resources(data: &[u8]) -> Result<Vec<Resource>, McpError> {
    let resources: Vec<Resource> = serde_json::from_slice(data)?;
    Ok(resources)
}

/// Extract validation metadata from a JSON Schema object.
fn parse_schema_meta(schema: &Value) -> SchemaMeta {
    let mut meta = SchemaMeta::default();

    if let Some(arr) = schema.get("required").and_then(|v| v.as_array()) {
        meta.required = arr
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
    }

    if let Some(arr) = schema.get("oneOf").and_then(|v| v.as_array()) {
        meta.one_of = arr
            .iter()
            .filter_map(|v| {
                v.get("required").and_then(|r| r.as_array()).map(|reqs| {
                    SchemaRequirementSet {
                        required: reqs
                            .iter()
                            .filter_map(|r| r.as_str().map(String::from))
                            .collect(),
                    }
                })
            })
            .collect();
    }

    if let Some(obj) = schema.get("dependencies").and_then(|v| v.as_object()) {
        let mut deps = HashMap::new();
        for (key, val) in obj {
            if let Some(arr) = val.as_array() {
                deps.insert(
                    key.clone(),
                    arr.iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect(),
                );
            }
        }
        meta.dependencies = deps;
    }

    if let Some(props) = schema.get("properties").and_then(|v| v.as_object()) {
        meta.property_types = props
            .iter()
            .filter_map(|(name, prop)| PropertyType::from_schema(prop).map(|t| (name.clone(), t)))
            .collect();
    }

    meta
}
