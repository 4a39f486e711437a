//! SAP HANA spatial SQL dialect adapter.
//!
//! ## Overview
//!
//! A backend-agnostic feature-storage engine needs backend-specific help in
//! exactly five places, and this crate provides all of them behind one
//! facade:
//!
//! - `HanaDialect` is the entry point the engine calls.
//! - `GeometryDecoder` turns WKT and WKB/EWKB result columns into
//!   [`GeometryValue`]s; encoding goes the other way, into SQL expressions
//!   or EWKB parameter bytes.
//! - `TypeMap` maps driver-reported type names to the engine's abstract
//!   value types and back.
//! - The metadata functions resolve geometry subtype and SRID from the
//!   backend's spatial catalog through a caller-supplied [`CatalogQuery`]
//!   handle.
//! - The `sql` and `filter` modules produce dialect-correct SQL fragments
//!   (envelope expressions, DDL, pagination, literals, predicates) for the
//!   engine to embed into the statements it assembles.
//!
//! The adapter performs no network I/O, pooling, or retries of its own;
//! catalog and sequence queries run through the `CatalogQuery` handle the
//! engine supplies, inside the engine's transaction.
//!
//! ## Short usage
//!
//! ```
//! use hana_dialect::{DialectConfig, Geometry, HanaDialect};
//! use geo_types::Point;
//!
//! let dialect = HanaDialect::new(DialectConfig::default())?;
//!
//! // SQL fragments for the engine to embed.
//! let geom = Geometry::Point(Point::new(8.64, 49.29));
//! let literal = dialect.encode_geometry(&geom, 4326)?;
//! assert!(literal.starts_with("ST_GeomFromText"));
//!
//! let page = dialect.limit_offset(100, 20);
//! assert_eq!(page, " LIMIT 100 OFFSET 20");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Decoding result columns
//!
//! Each worker task acquires its own decoder and keeps it for the duration
//! of its iteration; decoders hold scratch state and are never shared:
//!
//! ```
//! use hana_dialect::{DialectConfig, HanaDialect};
//!
//! let dialect = HanaDialect::new(DialectConfig::default())?;
//! let mut decoder = dialect.decoder();
//!
//! let value = decoder.decode_wkt("POINT (1 2)")?;
//! assert_eq!(value.srid, hana_dialect::UNKNOWN_SRID);
//!
//! let bbox = decoder.decode_envelope("POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))")?;
//! assert_eq!(bbox.max_x, 2.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! A malformed geometry column is reported as a [`CodecError`], never
//! swallowed into a silent `NULL`; the engine decides between fail-fast and
//! best-effort row handling.

mod codec;
mod dialect;
mod error;
mod filter;
mod geometry;
mod metadata;
mod sequence;
mod sql;
mod types;

pub use codec::{GeometryDecoder, encode_ewkb, encode_sql, encode_wkt};
pub use dialect::{DialectConfig, HanaDialect};
pub use error::{CodecError, ConfigError, DbError, DialectError, Result};
pub use filter::{CompareOp, Expr, Filter, Literal, SpatialOp, filter_to_sql};
pub use geometry::{BoundingBox, Geometry, GeometryValue, UNKNOWN_SRID};
pub use metadata::{
    CatalogQuery, DEFAULT_SRID, SpatialColumnMetadata, resolve_geometry_subtype,
    resolve_spatial_column, resolve_srid, resolve_user_defined_type_name,
};
pub use sequence::{KeyStrategy, last_generated_value, next_sequence_value};
pub use sql::{
    byte_array_literal, drop_geometry_columns_sql, envelope_expression,
    geometry_column_cleanup_sql, limit_offset, primary_key_ddl, quote_ident, spatial_index_ddl,
    string_literal,
};
pub use types::{AbstractType, GeometrySubtype, TypeMap};
