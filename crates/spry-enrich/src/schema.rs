//! [`SchemaValidator`] backed by the `jsonschema` crate, used for a
//! partial's `argsSchema`.

use jsonschema::Validator;
use serde_json::Value;

use spry_types::SchemaValidator;

pub struct JsonSchemaValidator {
    validator: Validator,
}

impl JsonSchemaValidator {
    pub fn compile(schema: &Value) -> Result<Self, String> {
        let validator = jsonschema::validator_for(schema).map_err(|err| err.to_string())?;
        Ok(JsonSchemaValidator { validator })
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, locals: &Value) -> Result<(), String> {
        self.validator
            .validate(locals)
            .map_err(|err| err.to_string())
    }
}
