use crate::error::ConfigError;

/// Geometry subtype as declared in the backend's spatial catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometrySubtype {
    /// Generic geometry, used when the catalog does not narrow the column.
    Geometry,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometrySubtype {
    /// Parse a catalog subtype name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("GEOMETRY") {
            Some(Self::Geometry)
        } else if name.eq_ignore_ascii_case("POINT") {
            Some(Self::Point)
        } else if name.eq_ignore_ascii_case("LINESTRING") {
            Some(Self::LineString)
        } else if name.eq_ignore_ascii_case("POLYGON") {
            Some(Self::Polygon)
        } else if name.eq_ignore_ascii_case("MULTIPOINT") {
            Some(Self::MultiPoint)
        } else if name.eq_ignore_ascii_case("MULTILINESTRING") {
            Some(Self::MultiLineString)
        } else if name.eq_ignore_ascii_case("MULTIPOLYGON") {
            Some(Self::MultiPolygon)
        } else if name.eq_ignore_ascii_case("GEOMETRYCOLLECTION") {
            Some(Self::GeometryCollection)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Geometry => "GEOMETRY",
            Self::Point => "POINT",
            Self::LineString => "LINESTRING",
            Self::Polygon => "POLYGON",
            Self::MultiPoint => "MULTIPOINT",
            Self::MultiLineString => "MULTILINESTRING",
            Self::MultiPolygon => "MULTIPOLYGON",
            Self::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }
}

/// The engine's abstract value types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbstractType {
    Geometry(GeometrySubtype),
    Text,
    Integer64,
    Integer32,
    Real,
    Double,
    Short,
    Time,
    Timestamp,
    Uuid,
    ByteArray,
    Boolean,
}

// Forward registrations: backend type name to abstract type. Order is fixed;
// duplicate names are rejected at construction. The backend reports both
// BOOL and BOOLEAN depending on where the name comes from, which is why
// Boolean appears twice here while VARCHAR appears exactly once (as Text).
const FORWARD: &[(&str, AbstractType)] = &[
    ("ST_GEOMETRY", AbstractType::Geometry(GeometrySubtype::Geometry)),
    ("GEOMETRY", AbstractType::Geometry(GeometrySubtype::Geometry)),
    ("POINT", AbstractType::Geometry(GeometrySubtype::Point)),
    ("LINESTRING", AbstractType::Geometry(GeometrySubtype::LineString)),
    ("POLYGON", AbstractType::Geometry(GeometrySubtype::Polygon)),
    ("MULTIPOINT", AbstractType::Geometry(GeometrySubtype::MultiPoint)),
    (
        "MULTILINESTRING",
        AbstractType::Geometry(GeometrySubtype::MultiLineString),
    ),
    (
        "MULTIPOLYGON",
        AbstractType::Geometry(GeometrySubtype::MultiPolygon),
    ),
    (
        "GEOMETRYCOLLECTION",
        AbstractType::Geometry(GeometrySubtype::GeometryCollection),
    ),
    ("TEXT", AbstractType::Text),
    ("VARCHAR", AbstractType::Text),
    ("NVARCHAR", AbstractType::Text),
    ("BIGINT", AbstractType::Integer64),
    ("INTEGER", AbstractType::Integer32),
    ("DOUBLE", AbstractType::Double),
    ("REAL", AbstractType::Real),
    ("SMALLINT", AbstractType::Short),
    ("TIME", AbstractType::Time),
    ("TIMESTAMP", AbstractType::Timestamp),
    ("UUID", AbstractType::Uuid),
    ("BYTEA", AbstractType::ByteArray),
    ("BOOL", AbstractType::Boolean),
    ("BOOLEAN", AbstractType::Boolean),
];

// Reverse registrations: exactly one canonical backend name per abstract
// type, used when emitting DDL.
const REVERSE: &[(AbstractType, &str)] = &[
    (AbstractType::Text, "VARCHAR"),
    (AbstractType::Integer64, "BIGINT"),
    (AbstractType::Integer32, "INTEGER"),
    (AbstractType::Real, "REAL"),
    (AbstractType::Double, "DOUBLE"),
    (AbstractType::Short, "SMALLINT"),
    (AbstractType::Time, "TIME"),
    (AbstractType::Timestamp, "TIMESTAMP"),
    (AbstractType::Uuid, "UUID"),
    (AbstractType::ByteArray, "BYTEA"),
    (AbstractType::Boolean, "BOOL"),
];

/// Bidirectional type mapping between backend type names and abstract types.
///
/// The forward direction is a total function (unknown names fall back to
/// [`AbstractType::Text`]); the reverse direction is deterministic, one
/// canonical name per abstract type.
#[derive(Debug)]
pub struct TypeMap {
    forward: &'static [(&'static str, AbstractType)],
    reverse: &'static [(AbstractType, &'static str)],
}

impl TypeMap {
    /// Build the mapping table, verifying that no backend type name is
    /// registered twice with different targets.
    pub fn new() -> Result<Self, ConfigError> {
        for (idx, (name, target)) in FORWARD.iter().enumerate() {
            for (earlier_name, earlier_target) in &FORWARD[..idx] {
                if name.eq_ignore_ascii_case(earlier_name) && target != earlier_target {
                    return Err(ConfigError::DuplicateTypeName {
                        type_name: (*name).to_string(),
                        existing: *earlier_target,
                        conflicting: *target,
                    });
                }
            }
        }

        Ok(Self {
            forward: FORWARD,
            reverse: REVERSE,
        })
    }

    /// Map a driver-reported type name to an abstract type. Total: unknown
    /// names degrade to `Text`, never an error.
    pub fn to_abstract(&self, backend_type_name: &str) -> AbstractType {
        let trimmed = backend_type_name.trim();
        self.forward
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
            .map(|(_, target)| *target)
            .unwrap_or(AbstractType::Text)
    }

    /// Canonical backend type name for DDL emission.
    pub fn to_backend_name(&self, abstract_type: AbstractType) -> Result<&'static str, ConfigError> {
        // All geometry subtypes share the backend's single spatial type.
        if let AbstractType::Geometry(_) = abstract_type {
            return Ok("ST_GEOMETRY");
        }

        self.reverse
            .iter()
            .find(|(registered, _)| *registered == abstract_type)
            .map(|(_, name)| *name)
            .ok_or(ConfigError::MissingTypeMapping(abstract_type))
    }
}

#[cfg(test)]
mod tests {
    use super::{AbstractType, FORWARD, GeometrySubtype, TypeMap};

    #[test]
    fn construction_checks_registration_uniqueness() {
        // The table must never regress into the historical double VARCHAR
        // registration (Boolean and Text at once).
        TypeMap::new().expect("unique registrations");

        for (idx, (name, target)) in FORWARD.iter().enumerate() {
            for (earlier_name, earlier_target) in &FORWARD[..idx] {
                assert!(
                    !(name.eq_ignore_ascii_case(earlier_name) && target != earlier_target),
                    "{name} registered to both {earlier_target:?} and {target:?}"
                );
            }
        }
    }

    #[test]
    fn forward_mapping_is_total() {
        let map = TypeMap::new().expect("type map");

        assert_eq!(map.to_abstract("BIGINT"), AbstractType::Integer64);
        assert_eq!(map.to_abstract("varchar"), AbstractType::Text);
        assert_eq!(map.to_abstract("uuid"), AbstractType::Uuid);
        assert_eq!(
            map.to_abstract("st_geometry"),
            AbstractType::Geometry(GeometrySubtype::Geometry)
        );
        assert_eq!(
            map.to_abstract("MULTIPOLYGON"),
            AbstractType::Geometry(GeometrySubtype::MultiPolygon)
        );

        // Unknown names degrade to Text instead of failing.
        assert_eq!(map.to_abstract("SOME_VENDOR_TYPE"), AbstractType::Text);
        assert_eq!(map.to_abstract(""), AbstractType::Text);
    }

    #[test]
    fn reverse_mapping_is_deterministic() {
        let map = TypeMap::new().expect("type map");

        assert_eq!(map.to_backend_name(AbstractType::Text).unwrap(), "VARCHAR");
        assert_eq!(map.to_backend_name(AbstractType::Boolean).unwrap(), "BOOL");
        assert_eq!(
            map.to_backend_name(AbstractType::Geometry(GeometrySubtype::Point))
                .unwrap(),
            "ST_GEOMETRY"
        );
        assert_eq!(
            map.to_backend_name(AbstractType::ByteArray).unwrap(),
            "BYTEA"
        );
    }

    #[test]
    fn subtype_names_roundtrip() {
        let subtypes = [
            GeometrySubtype::Geometry,
            GeometrySubtype::Point,
            GeometrySubtype::LineString,
            GeometrySubtype::Polygon,
            GeometrySubtype::MultiPoint,
            GeometrySubtype::MultiLineString,
            GeometrySubtype::MultiPolygon,
            GeometrySubtype::GeometryCollection,
        ];
        for subtype in subtypes {
            assert_eq!(GeometrySubtype::from_name(subtype.name()), Some(subtype));
        }
        assert_eq!(GeometrySubtype::from_name("multipoint"), Some(GeometrySubtype::MultiPoint));
        assert_eq!(GeometrySubtype::from_name("CIRCULARSTRING"), None);
    }
}
