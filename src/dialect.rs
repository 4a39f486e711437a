use crate::codec::{GeometryDecoder, encode_ewkb, encode_sql};
use crate::error::{CodecError, ConfigError, DbError, DialectError};
use crate::filter::{Filter, filter_to_sql};
use crate::geometry::Geometry;
use crate::metadata::{
    CatalogQuery, SpatialColumnMetadata, resolve_geometry_subtype, resolve_spatial_column,
    resolve_srid, resolve_user_defined_type_name,
};
use crate::sequence::{KeyStrategy, last_generated_value, next_sequence_value};
use crate::sql;
use crate::types::{AbstractType, GeometrySubtype, TypeMap};

/// Behavior flags of one dialect instance. Immutable after construction;
/// every fragment-generation call reads from here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DialectConfig {
    /// Substitute an index-only bbox test for exact spatial predicates.
    pub loose_bbox_enabled: bool,
    /// Allow estimated layer extents instead of exact envelope scans.
    pub estimated_extents_enabled: bool,
    /// Push filter functions down into SQL.
    pub function_encoding_enabled: bool,
    /// Flatten Z/M ordinates to XY when decoding; when disabled, 3D input
    /// is refused instead of silently flattened.
    pub force_2d: bool,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            loose_bbox_enabled: false,
            estimated_extents_enabled: false,
            function_encoding_enabled: true,
            force_2d: true,
        }
    }
}

/// The dialect facade: the single entry point the feature-storage engine
/// talks to. Composes the codec, type map, introspector, fragment
/// generator, and key resolver behind one contract.
///
/// The facade is stateless with respect to in-flight operations; it owns
/// only the configuration and the type registration table. Decoders are
/// handed out per worker via [`HanaDialect::decoder`].
#[derive(Debug)]
pub struct HanaDialect {
    config: DialectConfig,
    types: TypeMap,
}

impl HanaDialect {
    /// Build a dialect instance. Fails if the type registration table is
    /// inconsistent (a backend name registered twice with different
    /// targets).
    pub fn new(config: DialectConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config,
            types: TypeMap::new()?,
        })
    }

    pub fn config(&self) -> &DialectConfig {
        &self.config
    }

    // -- capability flags ---------------------------------------------------

    /// The backend supports `LIMIT`/`OFFSET` pagination.
    pub fn supports_limit_offset(&self) -> bool {
        true
    }

    /// Generated keys are looked up after the insert, not pre-fetched from
    /// a sequence.
    pub fn requires_post_insert_lookup(&self) -> bool {
        self.key_strategy().requires_post_insert_lookup()
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        KeyStrategy::PostInsertLookup
    }

    /// Whether a catalog table should be exposed to the engine's schema
    /// scan. The spatial metadata table is the backend's own bookkeeping.
    pub fn include_table(&self, table: &str) -> bool {
        table != "ST_GEOMETRY_COLUMNS"
    }

    /// Cheap connection liveness probe for the engine's pool.
    pub fn validation_query(&self) -> &'static str {
        "SELECT SRS_OID FROM SYS.ST_SPATIAL_REFERENCE_SYSTEMS WHERE SRS_OID = 151798"
    }

    // -- type mapping -------------------------------------------------------

    /// Map a driver-reported type name to the engine's abstract type.
    pub fn abstract_type(&self, backend_type_name: &str) -> AbstractType {
        self.types.to_abstract(backend_type_name)
    }

    /// Canonical backend type name for DDL emission.
    pub fn backend_type_name(
        &self,
        abstract_type: AbstractType,
    ) -> Result<&'static str, ConfigError> {
        self.types.to_backend_name(abstract_type)
    }

    /// Interpret a result column from driver metadata, narrowing spatial
    /// columns through the catalog. `uuid` hides behind a generic marker in
    /// driver metadata; the spatial type needs a catalog lookup to recover
    /// its declared subtype, and a column missing from the catalog is
    /// generic geometry rather than an error.
    pub fn column_type<C: CatalogQuery + ?Sized>(
        &self,
        conn: &mut C,
        schema: &str,
        table: &str,
        column: &str,
        backend_type_name: &str,
    ) -> Result<AbstractType, DbError> {
        if backend_type_name.eq_ignore_ascii_case("uuid") {
            return Ok(AbstractType::Uuid);
        }

        if backend_type_name.eq_ignore_ascii_case("ST_GEOMETRY") {
            let subtype = resolve_geometry_subtype(conn, schema, table, column)?
                .unwrap_or(GeometrySubtype::Geometry);
            return Ok(AbstractType::Geometry(subtype));
        }

        Ok(self.types.to_abstract(backend_type_name))
    }

    // -- geometry codec -----------------------------------------------------

    /// A fresh per-worker decoder. One decoder per worker task; never
    /// shared across concurrent callers.
    pub fn decoder(&self) -> GeometryDecoder {
        GeometryDecoder::new(self.config.force_2d)
    }

    /// SQL expression constructing the geometry in the backend.
    pub fn encode_geometry(&self, geometry: &Geometry, srid: i32) -> Result<String, CodecError> {
        encode_sql(geometry, srid)
    }

    /// EWKB bytes for binding the geometry as a statement parameter.
    pub fn encode_geometry_ewkb(
        &self,
        geometry: &Geometry,
        srid: i32,
    ) -> Result<Vec<u8>, CodecError> {
        encode_ewkb(geometry, srid)
    }

    // -- metadata -----------------------------------------------------------

    pub fn spatial_column_metadata<C: CatalogQuery + ?Sized>(
        &self,
        conn: &mut C,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<SpatialColumnMetadata, DbError> {
        resolve_spatial_column(conn, schema, table, column)
    }

    pub fn geometry_srid(&self, schema: &str, table: &str, column: &str) -> i32 {
        resolve_srid(schema, table, column)
    }

    pub fn user_defined_type_name<C: CatalogQuery + ?Sized>(
        &self,
        conn: &mut C,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>, DbError> {
        resolve_user_defined_type_name(conn, schema, table, column)
    }

    // -- SQL fragments ------------------------------------------------------

    pub fn envelope_expression(&self, geometry_column: &str) -> String {
        sql::envelope_expression(geometry_column)
    }

    /// SQL for an estimated layer extent, or `None` when estimated extents
    /// are disabled and the engine must fall back to an exact scan.
    pub fn optimized_bounds_sql(&self, table: &str, geometry_column: &str) -> Option<String> {
        if !self.config.estimated_extents_enabled {
            return None;
        }
        Some(format!(
            "SELECT {} FROM {}",
            sql::envelope_expression(geometry_column),
            sql::quote_ident(table)
        ))
    }

    pub fn primary_key_ddl(&self, column: &str) -> String {
        sql::primary_key_ddl(column)
    }

    pub fn spatial_index_ddl(&self, schema: &str, table: &str, column: &str) -> String {
        sql::spatial_index_ddl(schema, table, column)
    }

    pub fn geometry_column_cleanup_sql(&self, schema: &str, table: &str, column: &str) -> String {
        sql::geometry_column_cleanup_sql(schema, table, column)
    }

    pub fn drop_geometry_columns_sql(&self, schema: &str, table: &str) -> String {
        sql::drop_geometry_columns_sql(schema, table)
    }

    pub fn limit_offset(&self, limit: i64, offset: i64) -> String {
        sql::limit_offset(limit, offset)
    }

    pub fn byte_array_literal(&self, bytes: &[u8]) -> String {
        sql::byte_array_literal(bytes)
    }

    pub fn filter_to_sql(&self, filter: &Filter) -> Result<String, DialectError> {
        filter_to_sql(filter, &self.config)
    }

    // -- key resolution -----------------------------------------------------

    pub fn next_sequence_value<C: CatalogQuery + ?Sized>(
        &self,
        conn: &mut C,
        schema: Option<&str>,
        sequence: &str,
    ) -> Result<i64, DbError> {
        next_sequence_value(conn, schema, sequence)
    }

    pub fn last_generated_value<C: CatalogQuery + ?Sized>(
        &self,
        conn: &mut C,
    ) -> Result<i64, DbError> {
        last_generated_value(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::{DialectConfig, HanaDialect};
    use crate::error::{CodecError, DbError};
    use crate::metadata::tests::FakeCatalog;
    use crate::types::{AbstractType, GeometrySubtype};

    #[test]
    fn capability_flags() {
        let dialect = HanaDialect::new(DialectConfig::default()).expect("dialect");
        assert!(dialect.supports_limit_offset());
        assert!(dialect.requires_post_insert_lookup());
        assert!(dialect.include_table("roads"));
        assert!(!dialect.include_table("ST_GEOMETRY_COLUMNS"));
    }

    #[test]
    fn column_type_narrows_spatial_columns_through_the_catalog() -> Result<(), DbError> {
        let dialect = HanaDialect::new(DialectConfig::default()).expect("dialect");

        let mut catalog = FakeCatalog::answering(vec![Some("POINT".to_string())]);
        let narrowed =
            dialect.column_type(&mut catalog, "public", "stops", "geom", "ST_GEOMETRY")?;
        assert_eq!(narrowed, AbstractType::Geometry(GeometrySubtype::Point));

        // Absence of a catalog row means generic geometry, not an error.
        let mut empty_catalog = FakeCatalog::answering(vec![None]);
        let generic =
            dialect.column_type(&mut empty_catalog, "public", "stops", "geom", "ST_GEOMETRY")?;
        assert_eq!(generic, AbstractType::Geometry(GeometrySubtype::Geometry));

        let mut unused = FakeCatalog::answering(Vec::new());
        assert_eq!(
            dialect.column_type(&mut unused, "public", "stops", "id", "uuid")?,
            AbstractType::Uuid
        );
        assert_eq!(
            dialect.column_type(&mut unused, "public", "stops", "name", "NVARCHAR")?,
            AbstractType::Text
        );
        assert!(
            unused.seen_sql.is_empty(),
            "non-spatial columns need no catalog round trip"
        );
        Ok(())
    }

    #[test]
    fn optimized_bounds_follow_the_estimated_extents_flag() {
        let exact = HanaDialect::new(DialectConfig::default()).expect("dialect");
        assert_eq!(exact.optimized_bounds_sql("roads", "geom"), None);

        let estimated = HanaDialect::new(DialectConfig {
            estimated_extents_enabled: true,
            ..DialectConfig::default()
        })
        .expect("dialect");
        let sql = estimated
            .optimized_bounds_sql("roads", "geom")
            .expect("estimated bounds sql");
        assert!(sql.contains("ST_Envelope"), "{sql}");
    }

    #[test]
    fn decoder_inherits_the_forcing_flag() -> Result<(), CodecError> {
        let strict = HanaDialect::new(DialectConfig {
            force_2d: false,
            ..DialectConfig::default()
        })
        .expect("dialect");
        let err = strict
            .decoder()
            .decode_wkt("POINT Z (1 2 3)")
            .expect_err("3D refused without forcing");
        assert!(matches!(err, CodecError::UnsupportedDimension { .. }));

        let forcing = HanaDialect::new(DialectConfig::default()).expect("dialect");
        forcing.decoder().decode_wkt("POINT Z (1 2 3)")?;
        Ok(())
    }
}
