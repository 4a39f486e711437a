use std::error::Error;
use std::fmt;

use crate::types::AbstractType;

/// Errors from the geometry codec (WKT/WKB decode and SQL literal encode).
///
/// These are always recoverable by the caller: a malformed geometry column
/// means "treat this row as invalid", never a process-fatal condition. The
/// adapter never converts a parse failure into a silent `NULL`.
#[derive(Debug)]
pub enum CodecError {
    /// WKT text could not be parsed.
    MalformedWkt(String),
    /// WKB/EWKB bytes are truncated or carry an unknown geometry type tag.
    MalformedWkb(String),
    /// Input carries Z/M ordinates and 2D forcing is disabled.
    UnsupportedDimension {
        dimensions: String,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedWkt(detail) => write!(f, "malformed WKT: {detail}"),
            Self::MalformedWkb(detail) => write!(f, "malformed WKB: {detail}"),
            Self::UnsupportedDimension { dimensions } => {
                write!(f, "unsupported coordinate dimensions: {dimensions}")
            }
        }
    }
}

impl Error for CodecError {}

impl From<wkb::error::WkbError> for CodecError {
    fn from(err: wkb::error::WkbError) -> Self {
        Self::MalformedWkb(err.to_string())
    }
}

/// Errors from catalog and sequence queries executed through a
/// caller-supplied connection.
///
/// Retry and abort decisions belong to the surrounding engine; the adapter
/// only propagates. Note that *metadata absence* is not an error anywhere in
/// this crate, it is a valid `None` outcome.
#[derive(Debug)]
pub enum DbError {
    /// The underlying driver reported a failure.
    Backend(Box<dyn Error + Send + Sync>),
    /// A `NEXTVAL` fetch returned no row, i.e. the sequence does not exist.
    SequenceUnavailable {
        sequence: String,
    },
    /// The post-insert generated-key lookup returned no row.
    MissingGeneratedKey,
}

impl DbError {
    /// Wrap a driver error reported by a `CatalogQuery` implementation.
    pub fn backend<E: Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Backend(Box::new(err))
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "{err}"),
            Self::SequenceUnavailable { sequence } => {
                write!(f, "sequence is unavailable: {sequence}")
            }
            Self::MissingGeneratedKey => {
                write!(f, "post-insert key lookup returned no row")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Dialect configuration and type-registration errors.
///
/// These are fatal for the operation that hit them; the adapter refuses to
/// emit SQL it cannot emit correctly.
#[derive(Debug)]
pub enum ConfigError {
    /// A backend type name was registered twice with different targets.
    DuplicateTypeName {
        type_name: String,
        existing: AbstractType,
        conflicting: AbstractType,
    },
    /// An abstract type has no registered backend name at DDL-emission time.
    MissingTypeMapping(AbstractType),
    /// A filter function appeared while function encoding is disabled.
    FunctionEncodingDisabled {
        function: String,
    },
    /// A NaN or infinite filter literal, which has no SQL representation.
    NonFiniteNumber {
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTypeName {
                type_name,
                existing,
                conflicting,
            } => write!(
                f,
                "backend type '{type_name}' registered twice: {existing:?} and {conflicting:?}"
            ),
            Self::MissingTypeMapping(abstract_type) => {
                write!(f, "no backend type name registered for {abstract_type:?}")
            }
            Self::FunctionEncodingDisabled { function } => {
                write!(
                    f,
                    "function encoding is disabled, cannot translate: {function}"
                )
            }
            Self::NonFiniteNumber { value } => {
                write!(f, "no SQL literal for non-finite number: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Umbrella error for facade-level operations that can fail in more than
/// one of the categories above.
#[derive(Debug)]
pub enum DialectError {
    Codec(CodecError),
    Db(DbError),
    Config(ConfigError),
}

impl fmt::Display for DialectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DialectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<CodecError> for DialectError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err)
    }
}

impl From<DbError> for DialectError {
    fn from(err: DbError) -> Self {
        Self::Db(err)
    }
}

impl From<ConfigError> for DialectError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

pub type Result<T> = std::result::Result<T, DialectError>;
