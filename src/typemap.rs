// ABOUTME: Type mapping from MySQL column types to SQLite storage classes
// ABOUTME: Total function - unknown types fall back to TEXT

use serde::Serialize;
use std::fmt;

/// SQLite storage class a replicated column is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageClass {
    Integer,
    Text,
    Real,
    Blob,
}

impl StorageClass {
    pub fn as_sql(&self) -> &'static str {
        match self {
            StorageClass::Integer => "INTEGER",
            StorageClass::Text => "TEXT",
            StorageClass::Real => "REAL",
            StorageClass::Blob => "BLOB",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Map a MySQL column type (as reported by `DESCRIBE`) to a SQLite storage class.
///
/// The type is uppercased and cut at the first parenthesis, so `varchar(255)`
/// and `decimal(10,2)` classify as `VARCHAR` and `DECIMAL`. Dates and times
/// are kept as formatted text rather than native temporal values.
///
/// # Examples
///
/// ```
/// use mysql_sqlite_sync::typemap::{map_type, StorageClass};
/// assert_eq!(map_type("int(11)"), StorageClass::Integer);
/// assert_eq!(map_type("decimal(10,2)"), StorageClass::Real);
/// assert_eq!(map_type("geometry"), StorageClass::Text);
/// ```
pub fn map_type(mysql_type: &str) -> StorageClass {
    let upper = mysql_type.to_uppercase();
    let base = upper.split('(').next().unwrap_or_default().trim();

    match base {
        // Integer types
        "INT" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "BIGINT" => StorageClass::Integer,

        // String types
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            StorageClass::Text
        }

        // Floating point and fixed precision
        "FLOAT" | "DOUBLE" | "DECIMAL" => StorageClass::Real,

        // Date/time types are stored as strings
        "DATE" | "DATETIME" | "TIMESTAMP" | "TIME" | "YEAR" => StorageClass::Text,

        // Binary types
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => StorageClass::Blob,

        _ => StorageClass::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_types() {
        assert_eq!(map_type("int"), StorageClass::Integer);
        assert_eq!(map_type("int(11)"), StorageClass::Integer);
        assert_eq!(map_type("tinyint(1)"), StorageClass::Integer);
        assert_eq!(map_type("smallint"), StorageClass::Integer);
        assert_eq!(map_type("mediumint(9)"), StorageClass::Integer);
        assert_eq!(map_type("BIGINT(20)"), StorageClass::Integer);
    }

    #[test]
    fn test_string_types() {
        assert_eq!(map_type("varchar(255)"), StorageClass::Text);
        assert_eq!(map_type("char(3)"), StorageClass::Text);
        assert_eq!(map_type("longtext"), StorageClass::Text);
        assert_eq!(map_type("enum('a','b')"), StorageClass::Text);
        assert_eq!(map_type("set('x','y')"), StorageClass::Text);
    }

    #[test]
    fn test_numeric_types() {
        assert_eq!(map_type("decimal(10,2)"), StorageClass::Real);
        assert_eq!(map_type("double"), StorageClass::Real);
        assert_eq!(map_type("float"), StorageClass::Real);
    }

    #[test]
    fn test_temporal_types_are_text() {
        for ty in ["date", "datetime", "timestamp", "time", "year(4)"] {
            assert_eq!(map_type(ty), StorageClass::Text, "{ty}");
        }
    }

    #[test]
    fn test_binary_types() {
        assert_eq!(map_type("blob"), StorageClass::Blob);
        assert_eq!(map_type("mediumblob"), StorageClass::Blob);
        assert_eq!(map_type("longblob"), StorageClass::Blob);
    }

    #[test]
    fn test_unknown_types_fall_back_to_text() {
        assert_eq!(map_type("json"), StorageClass::Text);
        assert_eq!(map_type("geometry"), StorageClass::Text);
        assert_eq!(map_type(""), StorageClass::Text);
        assert_eq!(map_type("("), StorageClass::Text);
        // MySQL 8 reports unsigned ints without a display width
        assert_eq!(map_type("int unsigned"), StorageClass::Text);
        assert_eq!(map_type("int(10) unsigned"), StorageClass::Integer);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let inputs = ["INT", "varchar(5)", "Decimal(3,1)", "weird type", "blob"];
        for input in inputs {
            assert_eq!(map_type(input), map_type(input));
        }
    }
}
