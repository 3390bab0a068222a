// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversion between records and Firestore's typed value encoding.
//!
//! Records are serialized with serde first, then each JSON value is wrapped
//! in its Firestore type tag (`stringValue`, `doubleValue`, ...). Decoding
//! strips the tags and hands the plain JSON back to serde.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};

use super::StoreError;

/// Fields written as `timestampValue` rather than strings.
pub const TIMESTAMP_FIELDS: &[&str] = &["createdAt", "updatedAt"];

/// A Firestore document as returned by the REST API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, ending in the document id.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

/// Encode a record's fields. `skip` names fields kept out of the document
/// body (the id lives in the document name).
pub fn encode_fields<T: Serialize>(record: &T, skip: &[&str]) -> Result<Map<String, Value>, StoreError> {
    let value = serde_json::to_value(record).map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(StoreError::InvalidResponse("record is not an object".to_string()));
    };

    Ok(map
        .into_iter()
        .filter(|(key, _)| !skip.contains(&key.as_str()))
        .map(|(key, value)| {
            let encoded = match value {
                Value::String(ts) if TIMESTAMP_FIELDS.contains(&key.as_str()) => {
                    json!({ "timestampValue": ts })
                }
                other => encode_value(other),
            };
            (key, encoded)
        })
        .collect())
}

pub fn encode_value(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_f64() => json!({ "doubleValue": n }),
        // Firestore carries 64-bit integers as strings.
        Value::Number(n) => json!({ "integerValue": n.to_string() }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            let values: Vec<Value> = values.into_iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => {
            let fields: Map<String, Value> =
                map.into_iter().map(|(k, v)| (k, encode_value(v))).collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some((tag, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(StoreError::InvalidResponse(format!("untyped value: {value}")));
    };

    match tag.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            Ok(inner.clone())
        }
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed
                .map(|n| Value::Number(n.into()))
                .ok_or_else(|| StoreError::InvalidResponse(format!("bad integerValue: {inner}")))
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| StoreError::InvalidResponse(format!("bad doubleValue: {inner}"))),
        "mapValue" => {
            let fields = inner.get("fields").and_then(Value::as_object);
            Ok(Value::Object(match fields {
                Some(fields) => decode_map(fields)?,
                None => Map::new(),
            }))
        }
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(values))
        }
        other => Err(StoreError::InvalidResponse(format!("unsupported value type `{other}`"))),
    }
}

fn decode_map(fields: &Map<String, Value>) -> Result<Map<String, Value>, StoreError> {
    fields
        .iter()
        .map(|(k, v)| decode_value(v).map(|decoded| (k.clone(), decoded)))
        .collect()
}

/// Decode a document into a record, placing the document id in `id_field`.
pub fn decode_document<T: DeserializeOwned>(doc: &Document, id_field: &str) -> Result<T, StoreError> {
    let mut map = decode_map(&doc.fields)?;
    map.insert(id_field.to_string(), Value::String(doc.id().to_string()));
    serde_json::from_value(Value::Object(map))
        .map_err(|e| StoreError::InvalidResponse(format!("document {}: {e}", doc.name)))
}
