//! JSON Schema builder for tool parameters.

use serde_json::{json, Map, Value};

/// Builder for an `object` parameter schema.
#[derive(Debug, Default)]
pub struct ParameterBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ParameterBuilder {
    pub fn object() -> Self {
        Self::default()
    }

    /// Add a string property.
    pub fn string(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            json!({
                "type": "string",
                "description": description.into(),
            }),
        );
        if required {
            self.required.push(name);
        }
        self
    }

    /// Add a string property restricted to `values`.
    pub fn string_enum<I, S>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: I,
        required: bool,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        self.properties.insert(
            name.clone(),
            json!({
                "type": "string",
                "description": description.into(),
                "enum": values,
            }),
        );
        if required {
            self.required.push(name);
        }
        self
    }

    pub fn build(self) -> Value {
        json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
        })
    }
}
