use std::fmt;

use arrow::array::*;
use arrow::datatypes::*;
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::ConnectorError;

/// A single cell of a [RecordBatch], in a form that drivers can bind as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Bytes(v) => f.write_str(&hex::encode(v)),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.f")),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

/// Converts all cells of a row.
pub fn row_values(batch: &RecordBatch, row: usize) -> Result<Vec<Value>, ConnectorError> {
    let schema = batch.schema();
    batch
        .columns()
        .iter()
        .zip(schema.fields())
        .map(|(array, field)| cell_value(array.as_ref(), field.name(), row))
        .collect()
}

/// Iterates over rows of a batch, converting each into a vec of values.
pub fn rows(batch: &RecordBatch) -> impl Iterator<Item = Result<Vec<Value>, ConnectorError>> + '_ {
    (0..batch.num_rows()).map(move |row| row_values(batch, row))
}

/// Converts a single cell. `column` is only used for error messages.
pub fn cell_value(arr: &dyn Array, column: &str, i: usize) -> Result<Value, ConnectorError> {
    if arr.is_null(i) {
        return Ok(Value::Null);
    }

    Ok(match arr.data_type() {
        DataType::Null => Value::Null,
        DataType::Boolean => Value::Bool(arr.as_boolean().value(i)),
        DataType::Int8 => Value::Int(arr.as_primitive::<Int8Type>().value(i).into()),
        DataType::Int16 => Value::Int(arr.as_primitive::<Int16Type>().value(i).into()),
        DataType::Int32 => Value::Int(arr.as_primitive::<Int32Type>().value(i).into()),
        DataType::Int64 => Value::Int(arr.as_primitive::<Int64Type>().value(i)),
        DataType::UInt8 => Value::UInt(arr.as_primitive::<UInt8Type>().value(i).into()),
        DataType::UInt16 => Value::UInt(arr.as_primitive::<UInt16Type>().value(i).into()),
        DataType::UInt32 => Value::UInt(arr.as_primitive::<UInt32Type>().value(i).into()),
        DataType::UInt64 => Value::UInt(arr.as_primitive::<UInt64Type>().value(i)),
        DataType::Float16 => Value::Float(arr.as_primitive::<Float16Type>().value(i).to_f64()),
        DataType::Float32 => Value::Float(arr.as_primitive::<Float32Type>().value(i).into()),
        DataType::Float64 => Value::Float(arr.as_primitive::<Float64Type>().value(i)),

        DataType::Utf8 => Value::Text(arr.as_string::<i32>().value(i).to_string()),
        DataType::LargeUtf8 => Value::Text(arr.as_string::<i64>().value(i).to_string()),
        DataType::Binary => Value::Bytes(arr.as_binary::<i32>().value(i).to_vec()),
        DataType::LargeBinary => Value::Bytes(arr.as_binary::<i64>().value(i).to_vec()),
        DataType::FixedSizeBinary(_) => Value::Bytes(arr.as_fixed_size_binary().value(i).to_vec()),

        DataType::Date32 => Value::Date(in_range(arr.as_primitive::<Date32Type>().value_as_date(i))?),
        DataType::Date64 => Value::Date(in_range(arr.as_primitive::<Date64Type>().value_as_date(i))?),

        DataType::Time32(TimeUnit::Second) => {
            Value::Time(in_range(arr.as_primitive::<Time32SecondType>().value_as_time(i))?)
        }
        DataType::Time32(TimeUnit::Millisecond) => {
            Value::Time(in_range(arr.as_primitive::<Time32MillisecondType>().value_as_time(i))?)
        }
        DataType::Time64(TimeUnit::Microsecond) => {
            Value::Time(in_range(arr.as_primitive::<Time64MicrosecondType>().value_as_time(i))?)
        }
        DataType::Time64(TimeUnit::Nanosecond) => {
            Value::Time(in_range(arr.as_primitive::<Time64NanosecondType>().value_as_time(i))?)
        }

        // timezone is dropped, values are stored as UTC wall-clock time
        DataType::Timestamp(TimeUnit::Second, _) => Value::Timestamp(in_range(
            arr.as_primitive::<TimestampSecondType>().value_as_datetime(i),
        )?),
        DataType::Timestamp(TimeUnit::Millisecond, _) => Value::Timestamp(in_range(
            arr.as_primitive::<TimestampMillisecondType>().value_as_datetime(i),
        )?),
        DataType::Timestamp(TimeUnit::Microsecond, _) => Value::Timestamp(in_range(
            arr.as_primitive::<TimestampMicrosecondType>().value_as_datetime(i),
        )?),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => Value::Timestamp(in_range(
            arr.as_primitive::<TimestampNanosecondType>().value_as_datetime(i),
        )?),

        DataType::Decimal128(_, _) => {
            Value::Text(arr.as_primitive::<Decimal128Type>().value_as_string(i))
        }
        DataType::Decimal256(_, _) => {
            Value::Text(arr.as_primitive::<Decimal256Type>().value_as_string(i))
        }

        data_type => {
            return Err(ConnectorError::UnsupportedType {
                column: column.to_string(),
                data_type: data_type.clone(),
            })
        }
    })
}

fn in_range<T>(value: Option<T>) -> Result<T, ConnectorError> {
    value.ok_or(ConnectorError::DataOutOfRange)
}
