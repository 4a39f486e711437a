//! Dialect-correct SQL text fragments. Everything here is a pure function
//! from structured input to SQL text; callers embed the fragments into the
//! statements they assemble.

use std::fmt::Write;

/// Quote an identifier, doubling any embedded quote character.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Encode a string literal, doubling any embedded single quote.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Expression computing the bounding envelope of a geometry column as
/// backend-native text. The column is decoded back with
/// [`crate::GeometryDecoder::decode_envelope`].
pub fn envelope_expression(geometry_column: &str) -> String {
    format!(
        "ST_AsText(ST_Envelope(ST_GeomFromText({})))",
        quote_ident(geometry_column)
    )
}

/// Column definition fragment for an auto-incremented primary key.
pub fn primary_key_ddl(column: &str) -> String {
    format!("{} SERIAL PRIMARY KEY", quote_ident(column))
}

/// `CREATE INDEX` statement for a spatial index over the given column. The
/// index name is derived from table and column, so two geometry columns on
/// the same table never collide.
pub fn spatial_index_ddl(schema: &str, table: &str, column: &str) -> String {
    let index_name = format!("spatial_{}_{}", table, column.to_lowercase());
    format!(
        "CREATE INDEX {} ON {}.{} USING GIST ({})",
        quote_ident(&index_name),
        quote_ident(schema),
        quote_ident(table),
        quote_ident(column)
    )
}

/// Sweep a stale spatial-catalog row for a geometry column before the real
/// registration is written after table creation.
pub fn geometry_column_cleanup_sql(schema: &str, table: &str, column: &str) -> String {
    format!(
        "DELETE FROM ST_GEOMETRY_COLUMNS WHERE SCHEMA_NAME = {} AND TABLE_NAME = {} AND COLUMN_NAME = {}",
        string_literal(schema),
        string_literal(table),
        string_literal(column)
    )
}

/// Remove all geometry-column registrations for a dropped table.
pub fn drop_geometry_columns_sql(schema: &str, table: &str) -> String {
    format!(
        "DELETE FROM GEOMETRY_COLUMNS WHERE SCHEMA_NAME = {} AND TABLE_NAME = {}",
        string_literal(schema),
        string_literal(table)
    )
}

/// Pagination clause. A negative or `i64::MAX` limit means unbounded, in
/// which case only the offset (if positive) is emitted.
pub fn limit_offset(limit: i64, offset: i64) -> String {
    let mut sql = String::new();
    if limit >= 0 && limit < i64::MAX {
        let _ = write!(sql, " LIMIT {limit}");
        if offset > 0 {
            let _ = write!(sql, " OFFSET {offset}");
        }
    } else if offset > 0 {
        let _ = write!(sql, " OFFSET {offset}");
    }
    sql
}

/// Hex-encoded byte-array literal with the backend escape prefix, two
/// lowercase digits per byte.
pub fn byte_array_literal(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(2 + bytes.len() * 2);
    hex.push_str("\\x");
    for byte in bytes {
        let _ = write!(hex, "{byte:02x}");
    }
    string_literal(&hex)
}

#[cfg(test)]
mod tests {
    use super::{
        byte_array_literal, envelope_expression, limit_offset, primary_key_ddl, quote_ident,
        spatial_index_ddl, string_literal,
    };

    #[test]
    fn quoting_doubles_embedded_characters() {
        assert_eq!(quote_ident("geom"), "\"geom\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(string_literal("it's"), "'it''s'");
    }

    #[test]
    fn envelope_expression_wraps_the_column() {
        assert_eq!(
            envelope_expression("geom"),
            "ST_AsText(ST_Envelope(ST_GeomFromText(\"geom\")))"
        );
    }

    #[test]
    fn primary_key_uses_serial() {
        assert_eq!(primary_key_ddl("fid"), "\"fid\" SERIAL PRIMARY KEY");
    }

    #[test]
    fn spatial_index_name_is_derived_from_table_and_column() {
        let sql = spatial_index_ddl("public", "roads", "GEOM");
        assert_eq!(
            sql,
            "CREATE INDEX \"spatial_roads_geom\" ON \"public\".\"roads\" USING GIST (\"GEOM\")"
        );

        let other = spatial_index_ddl("public", "roads", "geom_alt");
        assert_ne!(sql, other, "distinct columns get distinct index names");
    }

    #[test]
    fn limit_offset_cases() {
        assert_eq!(limit_offset(-1, 0), "");
        assert_eq!(limit_offset(i64::MAX, 0), "");
        assert_eq!(limit_offset(10, 0), " LIMIT 10");
        assert_eq!(limit_offset(10, 5), " LIMIT 10 OFFSET 5");
        assert_eq!(limit_offset(-1, 5), " OFFSET 5");
        assert_eq!(limit_offset(0, 0), " LIMIT 0");
    }

    #[test]
    fn byte_array_literal_is_lowercase_zero_padded_hex() {
        assert_eq!(byte_array_literal(&[0x0A, 0xFF]), "'\\x0aff'");
        assert_eq!(byte_array_literal(&[]), "'\\x'");
        assert_eq!(byte_array_literal(&[0x00, 0x01]), "'\\x0001'");
    }
}
