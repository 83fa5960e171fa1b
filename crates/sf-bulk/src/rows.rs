//! JSON rows to upload CSV, and result CSV back to rows.

use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};
use crate::types::BulkRowResult;

/// Bulk API marker for "set this field to null".
pub const NULL_MARKER: &str = "#N/A";

/// Encode JSON object rows as one CSV batch.
///
/// The header is the union of all keys in first-seen order. A nested object
/// one level deep becomes dotted columns (`Account__r.Ext_UID__c`), which is
/// how the Bulk API expresses lookups by external id. `null` is written as
/// [`NULL_MARKER`]; absent keys are written empty and leave the field as is.
pub fn encode_rows(rows: &[Value]) -> Result<String> {
    let mut flat_rows = Vec::with_capacity(rows.len());
    let mut header: Vec<String> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let object = row.as_object().ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput(format!(
                "row {index} is not a JSON object"
            )))
        })?;

        let flat = flatten(object, index)?;
        for (key, _) in &flat {
            if !header.contains(key) {
                header.push(key.clone());
            }
        }
        flat_rows.push(flat);
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&header)?;
    for flat in &flat_rows {
        writer.write_record(header.iter().map(|column| {
            flat.iter()
                .find(|(key, _)| key == column)
                .map(|(_, cell)| cell.as_str())
                .unwrap_or("")
        }))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::new(ErrorKind::Csv(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| Error::with_source(ErrorKind::Csv(e.to_string()), e))
}

/// Flatten one row into `(column, cell)` pairs, keeping key order.
fn flatten(object: &Map<String, Value>, index: usize) -> Result<Vec<(String, String)>> {
    let mut flat = Vec::with_capacity(object.len());
    for (key, value) in object {
        match value {
            Value::Object(nested) => {
                for (inner_key, inner) in nested {
                    if inner.is_object() {
                        return Err(Error::new(ErrorKind::InvalidInput(format!(
                            "row {index}: {key}.{inner_key} nests deeper than one level"
                        ))));
                    }
                    flat.push((format!("{key}.{inner_key}"), cell(inner)));
                }
            }
            other => flat.push((key.clone(), cell(other))),
        }
    }
    Ok(flat)
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => NULL_MARKER.to_string(),
        Value::String(s) => s.clone(),
        // Multi-select picklists take `;`-separated values.
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(";"),
        other => other.to_string(),
    }
}

/// Which result set a CSV came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Successful,
    Failed,
    Unprocessed,
}

/// Decode a results CSV. `sf__Id`, `sf__Created` and `sf__Error` feed the
/// row outcome; the remaining columns are the row as uploaded.
pub fn decode_results(csv_text: &str, kind: ResultKind) -> Result<Vec<BulkRowResult>> {
    if csv_text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut results = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = BulkRowResult {
            success: kind == ResultKind::Successful,
            created: false,
            id: None,
            error: match kind {
                ResultKind::Unprocessed => Some("Record was not processed".to_string()),
                _ => None,
            },
            fields: Map::new(),
        };

        for (name, value) in headers.iter().zip(record.iter()) {
            match name {
                "sf__Id" => row.id = (!value.is_empty()).then(|| value.to_string()),
                "sf__Created" => row.created = value.eq_ignore_ascii_case("true"),
                "sf__Error" => row.error = Some(value.to_string()),
                _ => {
                    row.fields.insert(name.to_string(), Value::from(value));
                }
            }
        }
        results.push(row);
    }
    Ok(results)
}
