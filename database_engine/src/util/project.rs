use arrow::record_batch::RecordBatch;

use crate::errors::SchemaError;

/// Reorders columns of `batch` to match `columns`.
///
/// Every name in `columns` must be present in the batch. When `strict` is set,
/// the batch must not contain any other columns either.
pub fn project_by_name(
    batch: &RecordBatch,
    columns: &[String],
    table: &str,
    strict: bool,
) -> Result<RecordBatch, SchemaError> {
    let schema = batch.schema();

    if strict {
        if let Some(extra) = schema
            .fields()
            .iter()
            .find(|f| !columns.iter().any(|c| c == f.name()))
        {
            return Err(SchemaError::UnknownColumn {
                column: extra.name().clone(),
                table: table.to_string(),
            });
        }
    }

    let indices = columns
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| SchemaError::MissingColumn {
                    column: name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // nothing to do if the batch is already in the right shape
    if indices.len() == batch.num_columns() && indices.iter().enumerate().all(|(i, j)| i == *j) {
        return Ok(batch.clone());
    }

    Ok(batch.project(&indices)?)
}
