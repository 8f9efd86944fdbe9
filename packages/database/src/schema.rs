//! Column type inference results.

/// Logical type `DuckDB` inferred for a CSV column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// `BOOLEAN`
    Boolean,
    /// Any integer width.
    Integer,
    /// `DOUBLE`, `FLOAT` or `DECIMAL`.
    Float,
    /// `DATE`
    Date,
    /// `TIME`
    Time,
    /// `TIMESTAMP` variants.
    Timestamp,
    /// `VARCHAR`
    Text,
    /// Anything else, with the raw `DuckDB` type name.
    Other(String),
}

impl ColumnType {
    /// Maps a `DuckDB` type name (as reported by `information_schema`) onto
    /// a [`ColumnType`].
    #[must_use]
    pub fn from_duckdb(type_name: &str) -> Self {
        let upper = type_name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "BOOLEAN" => Self::Boolean,
            "TINYINT" | "SMALLINT" | "INTEGER" | "BIGINT" | "HUGEINT" | "UTINYINT"
            | "USMALLINT" | "UINTEGER" | "UBIGINT" | "UHUGEINT" => Self::Integer,
            "FLOAT" | "REAL" | "DOUBLE" => Self::Float,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "VARCHAR" | "TEXT" | "STRING" => Self::Text,
            _ if upper.starts_with("DECIMAL") => Self::Float,
            _ if upper.starts_with("TIMESTAMP") => Self::Timestamp,
            _ => Self::Other(type_name.to_string()),
        }
    }

    /// Whether values of this type can be binned as numbers.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

/// One column of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name as it appears in the CSV header.
    pub name: String,
    /// Inferred type.
    pub column_type: ColumnType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_integer_widths() {
        for name in ["BIGINT", "integer", "SMALLINT"] {
            assert_eq!(ColumnType::from_duckdb(name), ColumnType::Integer);
        }
    }

    #[test]
    fn maps_decimal_and_timestamp_families() {
        assert_eq!(ColumnType::from_duckdb("DECIMAL(9,6)"), ColumnType::Float);
        assert_eq!(
            ColumnType::from_duckdb("TIMESTAMP WITH TIME ZONE"),
            ColumnType::Timestamp
        );
    }

    #[test]
    fn keeps_unknown_type_names() {
        assert_eq!(
            ColumnType::from_duckdb("BLOB"),
            ColumnType::Other("BLOB".to_string())
        );
    }
}
