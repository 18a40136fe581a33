use chrono::{Datelike, Timelike};

use crate::util::Value;

impl From<Value> for mysql::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => mysql::Value::NULL,
            Value::Bool(v) => mysql::Value::Int(i64::from(v)),
            Value::Int(v) => mysql::Value::Int(v),
            Value::UInt(v) => mysql::Value::UInt(v),
            Value::Float(v) => mysql::Value::Double(v),
            Value::Text(v) => mysql::Value::Bytes(v.into_bytes()),
            Value::Bytes(v) => mysql::Value::Bytes(v),
            Value::Date(d) => {
                mysql::Value::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0)
            }
            Value::Time(t) => mysql::Value::Time(
                false,
                0,
                t.hour() as u8,
                t.minute() as u8,
                t.second() as u8,
                t.nanosecond() / 1000,
            ),
            Value::Timestamp(ts) => mysql::Value::Date(
                ts.year() as u16,
                ts.month() as u8,
                ts.day() as u8,
                ts.hour() as u8,
                ts.minute() as u8,
                ts.second() as u8,
                ts.nanosecond() / 1000,
            ),
        }
    }
}
