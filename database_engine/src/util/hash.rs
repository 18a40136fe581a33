use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use sha2::{Digest, Sha384};

use crate::errors::{ConnectorError, SchemaError, SurrogateError};
use crate::util::value::{cell_value, Value};

/// Computes a SHA-384 surrogate key for each row.
///
/// Values of `columns` are formatted, concatenated without a separator and hashed.
/// Booleans and floats are formatted the way Python's `str` formats them, so keys
/// match the ones computed by existing pipelines (`True`, `2.0`, `1e-05`).
/// Nulls contribute nothing. The result is the lowercase hex digest.
pub fn surrogate_hash(batch: &RecordBatch, columns: &[&str]) -> Result<StringArray, SurrogateError> {
    let arrays = columns
        .iter()
        .map(|name| {
            batch
                .column_by_name(name)
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: name.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut digests = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let mut hasher = Sha384::new();
        for (array, name) in arrays.iter().zip(columns) {
            let value = cell_value(array.as_ref(), name, row)?;
            hasher.update(hash_text(&value).as_bytes());
        }
        digests.push(hex::encode(hasher.finalize()));
    }
    Ok(StringArray::from(digests))
}

fn hash_text(value: &Value) -> String {
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Float(v) => float_text(*v),
        v => v.to_string(),
    }
}

fn float_text(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    if v == 0.0 || (1e-4..1e16).contains(&v.abs()) {
        let text = v.to_string();
        return if text.contains('.') { text } else { format!("{text}.0") };
    }

    // exponent is signed and has at least two digits
    let text = format!("{v:e}");
    match text.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

/// Appends a column `name` that contains [surrogate_hash] of `columns`.
pub fn with_surrogate_key(
    batch: &RecordBatch,
    columns: &[&str],
    name: &str,
) -> Result<RecordBatch, SurrogateError> {
    let hashes: ArrayRef = Arc::new(surrogate_hash(batch, columns)?);

    let schema = batch.schema();
    let mut fields = schema.fields().iter().cloned().collect::<Vec<_>>();
    fields.push(Arc::new(Field::new(name, DataType::Utf8, false)));

    let mut arrays = batch.columns().to_vec();
    arrays.push(hashes);

    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    Ok(RecordBatch::try_new(schema, arrays).map_err(ConnectorError::from)?)
}
