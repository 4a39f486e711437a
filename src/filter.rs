//! Translation of the engine's abstract filter tree into backend SQL.
//!
//! The backend expresses spatial predicates in method-call form
//! (`"col".ST_Intersects(<geometry>) = 1`). In loose-bbox mode the exact
//! predicate is replaced by an index-only `ST_IntersectsRect` test over the
//! filter geometry's bounds, trading precision for speed.

use crate::codec::encode_sql;
use crate::dialect::DialectConfig;
use crate::error::{ConfigError, DialectError};
use crate::geometry::{BoundingBox, Geometry, GeometryValue};
use crate::sql::{byte_array_literal, quote_ident, string_literal};

/// Scalar literal in a filter expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Geometry(GeometryValue),
}

/// Value expression: a column reference, a literal, or a function call.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(Literal),
    Function { name: String, args: Vec<Expr> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpatialOp {
    Intersects,
    Contains,
    Within,
    Crosses,
    Touches,
    Overlaps,
    Disjoint,
    Equals,
}

impl SpatialOp {
    fn sql(self) -> &'static str {
        match self {
            Self::Intersects => "ST_Intersects",
            Self::Contains => "ST_Contains",
            Self::Within => "ST_Within",
            Self::Crosses => "ST_Crosses",
            Self::Touches => "ST_Touches",
            Self::Overlaps => "ST_Overlaps",
            Self::Disjoint => "ST_Disjoint",
            Self::Equals => "ST_Equals",
        }
    }
}

/// The engine's abstract filter tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    IsNull(Expr),
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    /// Spatial relation between a geometry column and a literal geometry.
    Spatial {
        column: String,
        op: SpatialOp,
        geometry: GeometryValue,
    },
    /// Pure bounding-box test against a geometry column.
    BBox {
        column: String,
        bounds: BoundingBox,
        srid: i32,
    },
}

/// Translate a filter tree into a SQL predicate, honoring the dialect
/// configuration flags.
pub fn filter_to_sql(filter: &Filter, config: &DialectConfig) -> Result<String, DialectError> {
    match filter {
        Filter::And(children) => combine(children, "AND", "1 = 1", config),
        Filter::Or(children) => combine(children, "OR", "1 = 0", config),
        Filter::Not(inner) => Ok(format!("NOT ({})", filter_to_sql(inner, config)?)),
        Filter::IsNull(expr) => Ok(format!("{} IS NULL", expr_to_sql(expr, config)?)),
        Filter::Compare { left, op, right } => Ok(format!(
            "{} {} {}",
            expr_to_sql(left, config)?,
            op.sql(),
            expr_to_sql(right, config)?
        )),
        Filter::Spatial {
            column,
            op,
            geometry,
        } => {
            // The loose-bbox substitution only makes sense for predicates
            // implied by bbox overlap; disjointness keeps its exact form.
            if config.loose_bbox_enabled && *op != SpatialOp::Disjoint {
                bbox_predicate(column, &geometry.geometry.bounding_box(), geometry.srid)
            } else {
                Ok(format!(
                    "{}.{}({}) = 1",
                    quote_ident(column),
                    op.sql(),
                    encode_sql(&geometry.geometry, geometry.srid)?
                ))
            }
        }
        Filter::BBox {
            column,
            bounds,
            srid,
        } => bbox_predicate(column, bounds, *srid),
    }
}

fn combine(
    children: &[Filter],
    op: &str,
    empty: &str,
    config: &DialectConfig,
) -> Result<String, DialectError> {
    if children.is_empty() {
        return Ok(empty.to_string());
    }
    let parts = children
        .iter()
        .map(|child| filter_to_sql(child, config))
        .collect::<Result<Vec<String>, DialectError>>()?;
    Ok(format!("({})", parts.join(&format!(" {op} "))))
}

fn bbox_predicate(
    column: &str,
    bounds: &BoundingBox,
    srid: i32,
) -> Result<String, DialectError> {
    if bounds.is_empty() {
        // Nothing intersects an empty box.
        return Ok("1 = 0".to_string());
    }

    let lower = encode_sql(
        &Geometry::Point(geo_types::Point::new(bounds.min_x, bounds.min_y)),
        srid,
    )?;
    let upper = encode_sql(
        &Geometry::Point(geo_types::Point::new(bounds.max_x, bounds.max_y)),
        srid,
    )?;
    Ok(format!(
        "{}.ST_IntersectsRect({lower}, {upper}) = 1",
        quote_ident(column)
    ))
}

fn expr_to_sql(expr: &Expr, config: &DialectConfig) -> Result<String, DialectError> {
    match expr {
        Expr::Column(name) => Ok(quote_ident(name)),
        Expr::Literal(literal) => literal_to_sql(literal),
        Expr::Function { name, args } => {
            if !config.function_encoding_enabled {
                return Err(ConfigError::FunctionEncodingDisabled {
                    function: name.clone(),
                }
                .into());
            }
            let rendered = args
                .iter()
                .map(|arg| expr_to_sql(arg, config))
                .collect::<Result<Vec<String>, DialectError>>()?;
            Ok(format!("{}({})", name.to_uppercase(), rendered.join(", ")))
        }
    }
}

fn literal_to_sql(literal: &Literal) -> Result<String, DialectError> {
    match literal {
        Literal::Null => Ok("NULL".to_string()),
        Literal::Boolean(true) => Ok("TRUE".to_string()),
        Literal::Boolean(false) => Ok("FALSE".to_string()),
        Literal::Integer(value) => Ok(value.to_string()),
        Literal::Double(value) => {
            if value.is_finite() {
                Ok(value.to_string())
            } else {
                Err(ConfigError::NonFiniteNumber { value: *value }.into())
            }
        }
        Literal::Text(value) => Ok(string_literal(value)),
        Literal::Bytes(bytes) => Ok(byte_array_literal(bytes)),
        Literal::Geometry(value) => Ok(encode_sql(&value.geometry, value.srid)?),
    }
}
