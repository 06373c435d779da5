//! SQL data type hints attached to AST nodes.

use core::fmt;

/// SQL data types.
///
/// Every variant is `Copy` so the hint can live inside an arena node. The
/// spelling of a [`Custom`](Self::Custom) type is kept in the owning node's
/// text rather than in the hint itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    // Integer types
    /// Small integer (2 bytes).
    Smallint,
    /// Integer (4 bytes).
    Integer,
    /// Big integer (8 bytes).
    Bigint,

    // Floating point
    /// Real (4-byte float).
    Real,
    /// Double precision (8-byte float).
    Double,
    /// Decimal with precision and scale.
    Decimal {
        /// Total number of digits.
        precision: Option<u16>,
        /// Number of digits after decimal point.
        scale: Option<u16>,
    },
    /// Numeric (alias for Decimal).
    Numeric {
        /// Total number of digits.
        precision: Option<u16>,
        /// Number of digits after decimal point.
        scale: Option<u16>,
    },

    // String types
    /// Fixed-length character string.
    Char(Option<u32>),
    /// Variable-length character string.
    Varchar(Option<u32>),
    /// Text (variable length, no limit).
    Text,

    // Binary types
    /// Binary large object.
    Blob,
    /// Binary with specified length.
    Binary(Option<u32>),
    /// Variable-length binary.
    Varbinary(Option<u32>),

    // Date/time types
    /// Date.
    Date,
    /// Time.
    Time,
    /// Timestamp.
    Timestamp,
    /// DateTime (SQLite-style).
    Datetime,

    // Boolean
    /// Boolean.
    Boolean,

    /// Any other type name; the spelling lives in the node text.
    Custom,
}

impl DataType {
    /// Maps a (possibly multi-word) type name and its optional parameters
    /// to a hint. Unknown names become [`DataType::Custom`].
    #[must_use]
    pub fn from_name(name: &str, first: Option<u32>, second: Option<u32>) -> Self {
        let small = |v: Option<u32>| v.and_then(|v| u16::try_from(v).ok());
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "SMALLINT" | "INT2" | "TINYINT" => Self::Smallint,
            "INT" | "INTEGER" | "INT4" | "MEDIUMINT" => Self::Integer,
            "BIGINT" | "INT8" | "UNSIGNED BIG INT" => Self::Bigint,
            "REAL" => Self::Real,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" | "FLOAT8" => Self::Double,
            "DECIMAL" => Self::Decimal {
                precision: small(first),
                scale: small(second),
            },
            "NUMERIC" => Self::Numeric {
                precision: small(first),
                scale: small(second),
            },
            "CHAR" | "CHARACTER" | "NCHAR" => Self::Char(first),
            "VARCHAR" | "CHARACTER VARYING" | "NVARCHAR" | "VARYING CHARACTER" => {
                Self::Varchar(first)
            }
            "TEXT" | "CLOB" => Self::Text,
            "BLOB" => Self::Blob,
            "BINARY" => Self::Binary(first),
            "VARBINARY" => Self::Varbinary(first),
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "TIMESTAMP" => Self::Timestamp,
            "DATETIME" => Self::Datetime,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            _ => Self::Custom,
        }
    }

    /// Returns the SQL representation of the data type.
    ///
    /// [`DataType::Custom`] has no spelling of its own and renders as
    /// `CUSTOM`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Smallint => String::from("SMALLINT"),
            Self::Integer => String::from("INTEGER"),
            Self::Bigint => String::from("BIGINT"),
            Self::Real => String::from("REAL"),
            Self::Double => String::from("DOUBLE"),
            Self::Decimal { precision, scale } => with_precision("DECIMAL", *precision, *scale),
            Self::Numeric { precision, scale } => with_precision("NUMERIC", *precision, *scale),
            Self::Char(len) => with_length("CHAR", *len),
            Self::Varchar(len) => with_length("VARCHAR", *len),
            Self::Text => String::from("TEXT"),
            Self::Blob => String::from("BLOB"),
            Self::Binary(len) => with_length("BINARY", *len),
            Self::Varbinary(len) => with_length("VARBINARY", *len),
            Self::Date => String::from("DATE"),
            Self::Time => String::from("TIME"),
            Self::Timestamp => String::from("TIMESTAMP"),
            Self::Datetime => String::from("DATETIME"),
            Self::Boolean => String::from("BOOLEAN"),
            Self::Custom => String::from("CUSTOM"),
        }
    }
}

fn with_length(name: &str, len: Option<u32>) -> String {
    match len {
        Some(n) => format!("{name}({n})"),
        None => String::from(name),
    }
}

fn with_precision(name: &str, precision: Option<u16>, scale: Option<u16>) -> String {
    match (precision, scale) {
        (Some(p), Some(s)) => format!("{name}({p}, {s})"),
        (Some(p), None) => format!("{name}({p})"),
        _ => String::from(name),
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_to_sql() {
        assert_eq!(DataType::Integer.to_sql(), "INTEGER");
        assert_eq!(DataType::Varchar(Some(255)).to_sql(), "VARCHAR(255)");
        assert_eq!(
            DataType::Decimal {
                precision: Some(10),
                scale: Some(2)
            }
            .to_sql(),
            "DECIMAL(10, 2)"
        );
    }

    #[test]
    fn test_from_name() {
        assert_eq!(DataType::from_name("int", None, None), DataType::Integer);
        assert_eq!(
            DataType::from_name("VARCHAR", Some(10), None),
            DataType::Varchar(Some(10))
        );
        assert_eq!(
            DataType::from_name("double precision", None, None),
            DataType::Double
        );
        assert_eq!(
            DataType::from_name("numeric", Some(8), Some(3)),
            DataType::Numeric {
                precision: Some(8),
                scale: Some(3)
            }
        );
        assert_eq!(DataType::from_name("uuid", None, None), DataType::Custom);
    }
}
