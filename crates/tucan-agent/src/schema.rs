//! Backend-neutral structured-output schemas.
//!
//! Agents declare the shape they expect as a small tree; each provider
//! adapter renders it into whatever its API understands.

use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub enum Schema {
    /// Object with an ordered property list; every property is required.
    Object(Vec<(&'static str, Schema)>),
    Array(Box<Schema>),
    String,
    Integer,
    Boolean,
    Enum(Vec<&'static str>),
}

impl Schema {
    pub fn object(properties: Vec<(&'static str, Schema)>) -> Self {
        Schema::Object(properties)
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array(Box::new(items))
    }

    /// Render as a Gemini `generationConfig.responseSchema` document.
    pub fn to_gemini(&self) -> Value {
        match self {
            Schema::Object(properties) => {
                let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
                let props: serde_json::Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.to_string(), schema.to_gemini()))
                    .collect();
                json!({ "type": "OBJECT", "properties": props, "required": required })
            }
            Schema::Array(items) => json!({ "type": "ARRAY", "items": items.to_gemini() }),
            Schema::String => json!({ "type": "STRING" }),
            Schema::Integer => json!({ "type": "INTEGER" }),
            Schema::Boolean => json!({ "type": "BOOLEAN" }),
            Schema::Enum(values) => json!({ "type": "STRING", "enum": values }),
        }
    }

    /// Render as a standard JSON Schema document (OpenAI `json_schema`).
    pub fn to_json_schema(&self) -> Value {
        match self {
            Schema::Object(properties) => {
                let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
                let props: serde_json::Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.to_string(), schema.to_json_schema()))
                    .collect();
                json!({
                    "type": "object",
                    "properties": props,
                    "required": required,
                    "additionalProperties": false
                })
            }
            Schema::Array(items) => json!({ "type": "array", "items": items.to_json_schema() }),
            Schema::String => json!({ "type": "string" }),
            Schema::Integer => json!({ "type": "integer" }),
            Schema::Boolean => json!({ "type": "boolean" }),
            Schema::Enum(values) => json!({ "type": "string", "enum": values }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::object(vec![
            ("a_chain_of_thought", Schema::String),
            (
                "c_existing_categories_list",
                Schema::array(Schema::object(vec![
                    ("a_category", Schema::String),
                    ("b_rank", Schema::Integer),
                ])),
            ),
            ("b_no_category", Schema::Boolean),
        ])
    }

    #[test]
    fn gemini_rendering_uses_uppercase_types() {
        let doc = sample().to_gemini();
        assert_eq!(doc["type"], "OBJECT");
        assert_eq!(
            doc["properties"]["c_existing_categories_list"]["items"]["properties"]["b_rank"]
                ["type"],
            "INTEGER"
        );
        assert_eq!(doc["required"][0], "a_chain_of_thought");
    }

    #[test]
    fn json_schema_rendering_closes_objects() {
        let doc = sample().to_json_schema();
        assert_eq!(doc["type"], "object");
        assert_eq!(doc["additionalProperties"], false);
        assert_eq!(doc["properties"]["b_no_category"]["type"], "boolean");
    }

    #[test]
    fn enums_render_as_constrained_strings() {
        let doc = Schema::Enum(vec!["directly", "indirectly", "na"]).to_gemini();
        assert_eq!(doc["type"], "STRING");
        assert_eq!(doc["enum"][2], "na");
    }
}
