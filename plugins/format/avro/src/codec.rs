use std::path::Path;

use apache_avro::Schema;
use bench_api::BackendError;

use super::convert::{avro_to_value, value_to_avro};

// ═══════════════════════════════════════════════════════════════
//  AvroCodec
// ═══════════════════════════════════════════════════════════════

/// A parsed Avro schema together with its encode/decode operations.
#[derive(Debug, Clone)]
pub struct AvroCodec {
    schema: Schema,
}

impl AvroCodec {
    /// Load and parse a schema file (.avsc).
    pub fn from_file(path: &Path) -> Result<Self, BackendError> {
        let schema_str = std::fs::read_to_string(path).map_err(|e| {
            let path = path.display();
            BackendError::config(format!("avro: failed to read schema file '{path}': {e}"))
        })?;
        Self::parse(&schema_str)
            .map_err(|e| e.with_context(format!("'{}'", path.display())))
    }

    pub fn parse(schema_str: &str) -> Result<Self, BackendError> {
        let schema = Schema::parse_str(schema_str)
            .map_err(|e| BackendError::config(format!("avro: failed to parse schema: {e}")))?;
        Ok(Self { schema })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Namespace of the top-level named type, if the schema declares one.
    ///
    /// A fully-qualified name (`a.b.Record`) contributes its dotted prefix.
    pub fn namespace(&self) -> Option<&str> {
        self.schema.name().and_then(|n| n.namespace.as_deref())
    }

    /// Encode a JSON value as a single Avro datum.
    ///
    /// Fails if the value does not fit the schema; nothing is produced in
    /// that case.
    pub fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, BackendError> {
        let avro_value = value_to_avro(value, &self.schema)?;
        apache_avro::to_avro_datum(&self.schema, avro_value)
            .map_err(|e| BackendError::format_err(format!("avro encode: {e}")))
    }

    pub fn decode(&self, data: &[u8]) -> Result<serde_json::Value, BackendError> {
        let mut reader = data;
        let avro_value = apache_avro::from_avro_datum(&self.schema, &mut reader, None)
            .map_err(|e| BackendError::format_err(format!("avro decode: {e}")))?;
        Ok(avro_to_value(&avro_value))
    }
}
