// ABOUTME: Prepares source values for insertion into SQLite
// ABOUTME: Binary payloads are stored as (lossy) UTF-8 text

use rusqlite::types::Value;

/// Convert a source value into the value written to the destination.
///
/// Byte payloads become text, since the source driver reports most column
/// types (strings, decimals, dates) as raw bytes. Everything else passes through.
///
/// # Examples
///
/// ```
/// # use mysql_sqlite_sync::sqlite::converter::to_destination_value;
/// # use rusqlite::types::Value;
/// let value = to_destination_value(Value::Blob(b"1.50".to_vec()));
/// assert_eq!(value, Value::Text("1.50".to_string()));
/// ```
pub fn to_destination_value(value: Value) -> Value {
    match value {
        Value::Blob(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Text(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        },
        other => other,
    }
}

/// Convert a full row.
pub fn to_destination_row(row: Vec<Value>) -> Vec<Value> {
    row.into_iter().map(to_destination_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_becomes_text() {
        assert_eq!(
            to_destination_value(Value::Blob(b"hello".to_vec())),
            Value::Text("hello".to_string())
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let value = to_destination_value(Value::Blob(vec![0x61, 0xff, 0x62]));
        assert_eq!(value, Value::Text("a\u{fffd}b".to_string()));
    }

    #[test]
    fn test_other_values_pass_through() {
        assert_eq!(to_destination_value(Value::Null), Value::Null);
        assert_eq!(to_destination_value(Value::Integer(7)), Value::Integer(7));
        assert_eq!(to_destination_value(Value::Real(1.5)), Value::Real(1.5));
        assert_eq!(
            to_destination_value(Value::Text("x".to_string())),
            Value::Text("x".to_string())
        );
    }

    #[test]
    fn test_row_conversion_keeps_order() {
        let row = to_destination_row(vec![
            Value::Integer(1),
            Value::Blob(b"a".to_vec()),
            Value::Null,
        ]);
        assert_eq!(
            row,
            vec![Value::Integer(1), Value::Text("a".to_string()), Value::Null]
        );
    }
}
