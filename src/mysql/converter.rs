// ABOUTME: MySQL to SQLite value conversion for rows read from the source
// ABOUTME: Text-protocol bytes are passed through as blobs; temporal values become text

use anyhow::{anyhow, bail, Result};
use mysql_async::{Row, Value as MySqlValue};
use rusqlite::types::Value;

/// Convert a single MySQL value to a SQLite value
///
/// Maps MySQL wire values to SQLite storage values:
/// - NULL → NULL
/// - Bytes → BLOB (the synchronizer decides whether to store it as text)
/// - Int → INTEGER
/// - UInt → INTEGER, or TEXT when it does not fit in an i64
/// - Float / Double → REAL
/// - Date → TEXT `YYYY-MM-DD HH:MM:SS[.ffffff]`
/// - Time → TEXT `[-]HH:MM:SS[.ffffff]`, hours may exceed 24
///
/// # Examples
///
/// ```
/// # use mysql_sqlite_sync::mysql::converter::mysql_value_to_sqlite;
/// # use mysql_async::Value as MySqlValue;
/// # use rusqlite::types::Value;
/// assert_eq!(mysql_value_to_sqlite(MySqlValue::Int(42)), Value::Integer(42));
/// ```
pub fn mysql_value_to_sqlite(value: MySqlValue) -> Value {
    match value {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Bytes(bytes) => Value::Blob(bytes),
        MySqlValue::Int(i) => Value::Integer(i),
        MySqlValue::UInt(u) => match i64::try_from(u) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Text(u.to_string()),
        },
        MySqlValue::Float(f) => Value::Real(f64::from(f)),
        MySqlValue::Double(d) => Value::Real(d),
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let mut text = format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            );
            push_micros(&mut text, micros);
            Value::Text(text)
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = u64::from(days) * 24 + u64::from(hours);
            let mut text = format!(
                "{}{:02}:{:02}:{:02}",
                if negative { "-" } else { "" },
                total_hours,
                minutes,
                seconds
            );
            push_micros(&mut text, micros);
            Value::Text(text)
        }
    }
}

fn push_micros(text: &mut String, micros: u32) {
    if micros > 0 {
        text.push_str(&format!(".{:06}", micros));
    }
}

/// Convert a MySQL row into SQLite values, in column order.
///
/// Fails if the row does not carry exactly `expected_columns` values or if
/// a value was already taken out of the row.
pub fn row_to_values(row: Row, expected_columns: usize) -> Result<Vec<Value>> {
    let raw = row.unwrap_raw();
    if raw.len() != expected_columns {
        bail!(
            "row has {} values, expected {}",
            raw.len(),
            expected_columns
        );
    }

    raw.into_iter()
        .enumerate()
        .map(|(index, value)| {
            value
                .map(mysql_value_to_sqlite)
                .ok_or_else(|| anyhow!("value for column {} is missing", index + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(mysql_value_to_sqlite(MySqlValue::NULL), Value::Null);
        assert_eq!(mysql_value_to_sqlite(MySqlValue::Int(-7)), Value::Integer(-7));
        assert_eq!(mysql_value_to_sqlite(MySqlValue::UInt(7)), Value::Integer(7));
        assert_eq!(mysql_value_to_sqlite(MySqlValue::Double(2.5)), Value::Real(2.5));
        assert_eq!(mysql_value_to_sqlite(MySqlValue::Float(0.5)), Value::Real(0.5));
    }

    #[test]
    fn test_unsigned_overflow_becomes_text() {
        assert_eq!(
            mysql_value_to_sqlite(MySqlValue::UInt(u64::MAX)),
            Value::Text("18446744073709551615".to_string())
        );
    }

    #[test]
    fn test_bytes_stay_blobs() {
        assert_eq!(
            mysql_value_to_sqlite(MySqlValue::Bytes(b"Widget".to_vec())),
            Value::Blob(b"Widget".to_vec())
        );
    }

    #[test]
    fn test_date_formatting() {
        assert_eq!(
            mysql_value_to_sqlite(MySqlValue::Date(2024, 3, 1, 9, 5, 0, 0)),
            Value::Text("2024-03-01 09:05:00".to_string())
        );
        assert_eq!(
            mysql_value_to_sqlite(MySqlValue::Date(2024, 3, 1, 9, 5, 0, 120)),
            Value::Text("2024-03-01 09:05:00.000120".to_string())
        );
    }

    #[test]
    fn test_time_formatting() {
        assert_eq!(
            mysql_value_to_sqlite(MySqlValue::Time(false, 0, 8, 30, 0, 0)),
            Value::Text("08:30:00".to_string())
        );
        assert_eq!(
            mysql_value_to_sqlite(MySqlValue::Time(true, 2, 1, 0, 5, 0)),
            Value::Text("-49:00:05".to_string())
        );
    }
}
