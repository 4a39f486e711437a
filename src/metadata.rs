use log::debug;

use crate::error::DbError;
use crate::sql::string_literal;
use crate::types::GeometrySubtype;

/// Default SRID reported for geometry columns. The backend does not expose
/// per-column SRID metadata reliably, and deployments behind this adapter
/// do not vary the reference system per installation.
pub const DEFAULT_SRID: i32 = 4326;

/// Caller-supplied connection/transaction handle for catalog and sequence
/// queries.
///
/// The adapter issues no I/O of its own: every lookup is one
/// request/response round trip through this trait, scoped to the caller's
/// transaction. Implementations own statement and result-set lifecycle and
/// must release them on every exit path; the adapter performs no retries.
pub trait CatalogQuery {
    /// Run a query expected to return at most one row with one string
    /// column. Zero rows is `Ok(None)`.
    fn query_string(&mut self, sql: &str) -> Result<Option<String>, DbError>;

    /// Run a query expected to return at most one row with one integer
    /// column. Zero rows is `Ok(None)`.
    fn query_i64(&mut self, sql: &str) -> Result<Option<i64>, DbError>;
}

/// Spatial metadata resolved for one geometry column.
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialColumnMetadata {
    pub schema: String,
    pub table: String,
    pub column: String,
    /// `None` when the spatial catalog holds no row for the column; the
    /// column is then treated as generic geometry.
    pub geometry_subtype: Option<GeometrySubtype>,
    pub srid: i32,
}

/// Look up the declared geometry subtype of a column in the backend's
/// spatial catalog. Absence of a row is a valid outcome for generically
/// declared geometry columns, never an error. A subtype name the adapter
/// does not know degrades to generic geometry.
pub fn resolve_geometry_subtype<C: CatalogQuery + ?Sized>(
    conn: &mut C,
    schema: &str,
    table: &str,
    column: &str,
) -> Result<Option<GeometrySubtype>, DbError> {
    let sql = format!(
        "SELECT DATA_TYPE_NAME FROM ST_GEOMETRY_COLUMNS WHERE SCHEMA_NAME = {} AND TABLE_NAME = {} AND COLUMN_NAME = {}",
        string_literal(schema),
        string_literal(table),
        string_literal(column)
    );
    debug!("geometry type check: {sql}");

    Ok(conn
        .query_string(&sql)?
        .map(|name| GeometrySubtype::from_name(&name).unwrap_or(GeometrySubtype::Geometry)))
}

/// SRID of a geometry column. Always the configured default for this
/// backend.
pub fn resolve_srid(_schema: &str, _table: &str, _column: &str) -> i32 {
    DEFAULT_SRID
}

/// Recover the declared type name of a column that driver metadata reports
/// only as a generic user-defined type. Absence of a row is non-fatal: the
/// generic marker stands.
pub fn resolve_user_defined_type_name<C: CatalogQuery + ?Sized>(
    conn: &mut C,
    schema: &str,
    table: &str,
    column: &str,
) -> Result<Option<String>, DbError> {
    let sql = format!(
        "SELECT DATA_TYPE_NAME FROM SYS.TABLE_COLUMNS WHERE SCHEMA_NAME = {} AND TABLE_NAME = {} AND COLUMN_NAME = {}",
        string_literal(schema),
        string_literal(table),
        string_literal(column)
    );
    debug!("user-defined type check: {sql}");

    conn.query_string(&sql)
}

/// Resolve the full spatial metadata for a geometry column.
pub fn resolve_spatial_column<C: CatalogQuery + ?Sized>(
    conn: &mut C,
    schema: &str,
    table: &str,
    column: &str,
) -> Result<SpatialColumnMetadata, DbError> {
    let geometry_subtype = resolve_geometry_subtype(conn, schema, table, column)?;
    Ok(SpatialColumnMetadata {
        schema: schema.to_string(),
        table: table.to_string(),
        column: column.to_string(),
        geometry_subtype,
        srid: resolve_srid(schema, table, column),
    })
}
