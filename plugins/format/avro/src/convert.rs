use std::collections::HashMap;

use apache_avro::types::Value;
use apache_avro::Schema;
use base64::Engine;
use bench_api::BackendError;
use serde_json::Value as Json;

// ═══════════════════════════════════════════════════════════════
//  Avro → JSON conversion
// ═══════════════════════════════════════════════════════════════

pub(crate) fn avro_to_value(value: &Value) -> Json {
    match value {
        Value::Null | Value::Duration(_) => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Int(i) | Value::Date(i) | Value::TimeMillis(i) => serde_json::json!(i),
        Value::Long(l)
        | Value::TimeMicros(l)
        | Value::TimestampMillis(l)
        | Value::TimestampMicros(l)
        | Value::TimestampNanos(l)
        | Value::LocalTimestampMillis(l)
        | Value::LocalTimestampMicros(l)
        | Value::LocalTimestampNanos(l) => serde_json::json!(l),
        Value::Float(f) => serde_json::json!(f),
        Value::Double(d) => serde_json::json!(d),
        Value::Bytes(b) | Value::Fixed(_, b) => Json::String(base64_encode(b)),
        Value::String(s) | Value::Enum(_, s) => Json::String(s.clone()),
        Value::Union(_, inner) => avro_to_value(inner),
        Value::Array(items) => Json::Array(items.iter().map(avro_to_value).collect()),
        Value::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), avro_to_value(v)))
                .collect(),
        ),
        Value::Record(fields) => Json::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), avro_to_value(v)))
                .collect(),
        ),
        Value::Decimal(d) => {
            let bytes: Vec<u8> = d.try_into().unwrap_or_default();
            Json::String(base64_encode(&bytes))
        }
        Value::BigDecimal(d) => Json::String(d.to_string()),
        Value::Uuid(u) => Json::String(u.to_string()),
    }
}

fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

// ═══════════════════════════════════════════════════════════════
//  JSON → Avro conversion
// ═══════════════════════════════════════════════════════════════

/// Конвертация serde_json::Value → apache_avro::types::Value по схеме.
///
/// Unlike a best-effort mapping, a value that does not fit its schema is an
/// error here: numbers are range checked, records must carry every field
/// their schema declares (unless the field accepts null), and unions take
/// the first branch that converts.
pub(crate) fn value_to_avro(val: &Json, schema: &Schema) -> Result<Value, BackendError> {
    match (val, schema) {
        (_, Schema::Union(union_schema)) => {
            for (idx, variant) in union_schema.variants().iter().enumerate() {
                if let Ok(v) = value_to_avro(val, variant) {
                    return Ok(Value::Union(idx as u32, Box::new(v)));
                }
            }
            Err(mismatch(val, schema))
        }
        (Json::Null, Schema::Null) => Ok(Value::Null),
        (Json::Bool(b), Schema::Boolean) => Ok(Value::Boolean(*b)),
        (Json::Number(n), Schema::Int) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::Int)
            .ok_or_else(|| mismatch(val, schema)),
        (Json::Number(n), Schema::Long) => {
            n.as_i64().map(Value::Long).ok_or_else(|| mismatch(val, schema))
        }
        (Json::Number(n), Schema::TimestampMillis) => n
            .as_i64()
            .map(Value::TimestampMillis)
            .ok_or_else(|| mismatch(val, schema)),
        (Json::Number(n), Schema::Float) => n
            .as_f64()
            .map(|f| Value::Float(f as f32))
            .ok_or_else(|| mismatch(val, schema)),
        (Json::Number(n), Schema::Double) => {
            n.as_f64().map(Value::Double).ok_or_else(|| mismatch(val, schema))
        }
        (Json::String(s), Schema::String) => Ok(Value::String(s.clone())),
        (Json::String(s), Schema::Enum(enum_schema)) => enum_schema
            .symbols
            .iter()
            .position(|sym| sym == s)
            .map(|idx| Value::Enum(idx as u32, s.clone()))
            .ok_or_else(|| mismatch(val, schema)),
        (Json::Array(items), Schema::Array(inner)) => {
            let avro_items: Result<Vec<Value>, BackendError> = items
                .iter()
                .map(|item| value_to_avro(item, &inner.items))
                .collect();
            Ok(Value::Array(avro_items?))
        }
        (Json::Object(map), Schema::Map(inner)) => {
            let mut entries = HashMap::with_capacity(map.len());
            for (k, v) in map {
                entries.insert(k.clone(), value_to_avro(v, &inner.types)?);
            }
            Ok(Value::Map(entries))
        }
        (Json::Object(map), Schema::Record(record_schema)) => {
            let mut fields = Vec::with_capacity(record_schema.fields.len());
            for field in &record_schema.fields {
                let field_val = map.get(&field.name).unwrap_or(&Json::Null);
                let avro_val = value_to_avro(field_val, &field.schema)
                    .map_err(|e| e.with_context(format!("field '{}'", field.name)))?;
                fields.push((field.name.clone(), avro_val));
            }
            Ok(Value::Record(fields))
        }
        _ => Err(mismatch(val, schema)),
    }
}

fn mismatch(val: &Json, schema: &Schema) -> BackendError {
    BackendError::format_err(format!(
        "value {val} does not match schema {}",
        schema.canonical_form()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(text: &str) -> Schema {
        Schema::parse_str(text).unwrap()
    }

    #[test]
    fn record_fields_follow_schema_order() {
        let s = schema(
            r#"{"type":"record","name":"R","fields":[
                {"name":"a","type":"long"},
                {"name":"b","type":"string"}
            ]}"#,
        );
        let v = value_to_avro(&serde_json::json!({"b": "x", "a": 7}), &s).unwrap();
        assert_eq!(
            v,
            Value::Record(vec![
                ("a".into(), Value::Long(7)),
                ("b".into(), Value::String("x".into())),
            ])
        );
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let s = schema(r#"{"type":"record","name":"R","fields":[{"name":"a","type":"boolean"}]}"#);
        let err = value_to_avro(&serde_json::json!({}), &s).unwrap_err();
        assert!(err.message().starts_with("field 'a'"), "{err}");
    }

    #[test]
    fn nullable_field_may_be_absent() {
        let s = schema(
            r#"{"type":"record","name":"R","fields":[{"name":"a","type":["null","string"]}]}"#,
        );
        let v = value_to_avro(&serde_json::json!({}), &s).unwrap();
        assert_eq!(
            v,
            Value::Record(vec![("a".into(), Value::Union(0, Box::new(Value::Null)))])
        );
    }

    #[test]
    fn int_out_of_range_is_rejected() {
        let s = schema(r#""int""#);
        assert!(value_to_avro(&serde_json::json!(i64::from(i32::MAX) + 1), &s).is_err());
        assert_eq!(value_to_avro(&serde_json::json!(5), &s).unwrap(), Value::Int(5));
    }

    #[test]
    fn fractional_number_is_not_a_long() {
        let s = schema(r#""long""#);
        assert!(value_to_avro(&serde_json::json!(1.5), &s).is_err());
    }

    #[test]
    fn enum_symbols_are_checked() {
        let s = schema(r#"{"type":"enum","name":"E","symbols":["UP","DOWN"]}"#);
        assert_eq!(
            value_to_avro(&serde_json::json!("DOWN"), &s).unwrap(),
            Value::Enum(1, "DOWN".into())
        );
        assert!(value_to_avro(&serde_json::json!("LEFT"), &s).is_err());
    }

    #[test]
    fn bytes_render_as_base64() {
        assert_eq!(avro_to_value(&Value::Bytes(vec![1, 2, 3])), serde_json::json!("AQID"));
    }
}
