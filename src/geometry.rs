use geo_traits::{
    CoordTrait, GeometryCollectionTrait, GeometryTrait, LineStringTrait, MultiLineStringTrait,
    MultiPointTrait, MultiPolygonTrait, PointTrait, PolygonTrait,
};
use geo_types::coord;

/// SRID value meaning "unknown/unset".
pub const UNKNOWN_SRID: i32 = -1;

/// In-memory geometry model the adapter decodes into and encodes from.
///
/// `LinearRing` exists because the engine's feature model can hand the
/// adapter a bare ring; it is normalized to a `LineString` before any
/// encoding since the backend does not accept standalone rings.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(geo_types::Point),
    LineString(geo_types::LineString),
    LinearRing(geo_types::LineString),
    Polygon(geo_types::Polygon),
    MultiPoint(geo_types::MultiPoint),
    MultiLineString(geo_types::MultiLineString),
    MultiPolygon(geo_types::MultiPolygon),
    GeometryCollection(Vec<Geometry>),
}

/// A geometry plus the spatial reference it is expressed in.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryValue {
    pub geometry: Geometry,
    /// SRID, or [`UNKNOWN_SRID`] when the source carried none.
    pub srid: i32,
}

impl GeometryValue {
    pub fn new(geometry: Geometry, srid: i32) -> Self {
        Self { geometry, srid }
    }

    /// A geometry whose spatial reference is not known.
    pub fn unreferenced(geometry: Geometry) -> Self {
        Self {
            geometry,
            srid: UNKNOWN_SRID,
        }
    }
}

impl Geometry {
    /// Build the model from anything implementing `geo_traits::GeometryTrait`
    /// (for example `geo_types` values, `wkt::Wkt`, or `wkb::reader::Wkb`).
    ///
    /// Z and M ordinates are dropped; the model is strictly 2D. A `POINT
    /// EMPTY` input becomes an empty `GeometryCollection` since `geo_types`
    /// points cannot be empty.
    ///
    /// Panics on `Rect`, `Triangle`, and `Line` inputs; the WKT and WKB
    /// readers never produce these.
    pub fn from_geometry<G: GeometryTrait<T = f64>>(geom: &G) -> Self {
        use geo_traits::GeometryType as GeoType;

        match geom.as_type() {
            GeoType::Point(point) => match point.coord() {
                Some(coord) => {
                    let (x, y) = coord.x_y();
                    Self::Point(geo_types::Point::new(x, y))
                }
                None => Self::GeometryCollection(Vec::new()),
            },
            GeoType::LineString(line) => Self::LineString(line_string_from(line)),
            GeoType::Polygon(poly) => Self::Polygon(polygon_from(poly)),
            GeoType::MultiPoint(multi) => {
                let points = multi
                    .points()
                    .filter_map(|point| {
                        point.coord().map(|coord| {
                            let (x, y) = coord.x_y();
                            geo_types::Point::new(x, y)
                        })
                    })
                    .collect::<Vec<geo_types::Point>>();
                Self::MultiPoint(geo_types::MultiPoint::new(points))
            }
            GeoType::MultiLineString(multi) => {
                let lines = multi
                    .line_strings()
                    .map(|line| line_string_from(&line))
                    .collect::<Vec<geo_types::LineString>>();
                Self::MultiLineString(geo_types::MultiLineString::new(lines))
            }
            GeoType::MultiPolygon(multi) => {
                let polygons = multi
                    .polygons()
                    .map(|poly| polygon_from(&poly))
                    .collect::<Vec<geo_types::Polygon>>();
                Self::MultiPolygon(geo_types::MultiPolygon::new(polygons))
            }
            GeoType::GeometryCollection(collection) => {
                let members = collection
                    .geometries()
                    .map(|sub_geom| Self::from_geometry(&sub_geom))
                    .collect();
                Self::GeometryCollection(members)
            }
            GeoType::Rect(_) | GeoType::Triangle(_) | GeoType::Line(_) => {
                // No WKT or WKB input should reach here.
                unreachable!()
            }
        }
    }

    /// Whether the geometry has no coordinates at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Point(_) => false,
            Self::LineString(line) | Self::LinearRing(line) => line.0.is_empty(),
            Self::Polygon(poly) => poly.exterior().0.is_empty(),
            Self::MultiPoint(multi) => multi.0.is_empty(),
            Self::MultiLineString(multi) => {
                multi.0.is_empty() || multi.0.iter().all(|line| line.0.is_empty())
            }
            Self::MultiPolygon(multi) => {
                multi.0.is_empty() || multi.0.iter().all(|poly| poly.exterior().0.is_empty())
            }
            Self::GeometryCollection(members) => {
                members.is_empty() || members.iter().all(Self::is_empty)
            }
        }
    }

    /// Convert into a `geo_types::Geometry`, normalizing `LinearRing` to
    /// `LineString`. Every encoder goes through this, which is what keeps
    /// bare rings out of the output.
    pub fn to_geo(&self) -> geo_types::Geometry {
        match self {
            Self::Point(point) => geo_types::Geometry::Point(*point),
            Self::LineString(line) | Self::LinearRing(line) => {
                geo_types::Geometry::LineString(line.clone())
            }
            Self::Polygon(poly) => geo_types::Geometry::Polygon(poly.clone()),
            Self::MultiPoint(multi) => geo_types::Geometry::MultiPoint(multi.clone()),
            Self::MultiLineString(multi) => geo_types::Geometry::MultiLineString(multi.clone()),
            Self::MultiPolygon(multi) => geo_types::Geometry::MultiPolygon(multi.clone()),
            Self::GeometryCollection(members) => geo_types::Geometry::GeometryCollection(
                geo_types::GeometryCollection::from(
                    members.iter().map(Self::to_geo).collect::<Vec<_>>(),
                ),
            ),
        }
    }

    /// Compute the bounding box over all coordinates.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::EMPTY;
        self.expand(&mut bbox);
        bbox
    }

    fn expand(&self, bbox: &mut BoundingBox) {
        match self {
            Self::Point(point) => bbox.expand_to_include(point.x(), point.y()),
            Self::LineString(line) | Self::LinearRing(line) => expand_line(bbox, line),
            Self::Polygon(poly) => expand_polygon(bbox, poly),
            Self::MultiPoint(multi) => {
                for point in &multi.0 {
                    bbox.expand_to_include(point.x(), point.y());
                }
            }
            Self::MultiLineString(multi) => {
                for line in &multi.0 {
                    expand_line(bbox, line);
                }
            }
            Self::MultiPolygon(multi) => {
                for poly in &multi.0 {
                    expand_polygon(bbox, poly);
                }
            }
            Self::GeometryCollection(members) => {
                for member in members {
                    member.expand(bbox);
                }
            }
        }
    }
}

fn line_string_from<L: LineStringTrait<T = f64>>(line: &L) -> geo_types::LineString {
    let coords = line
        .coords()
        .map(|c| {
            let (x, y) = c.x_y();
            coord! { x: x, y: y }
        })
        .collect::<Vec<geo_types::Coord>>();
    geo_types::LineString::new(coords)
}

fn polygon_from<P: PolygonTrait<T = f64>>(poly: &P) -> geo_types::Polygon {
    let exterior = match poly.exterior() {
        Some(ring) => line_string_from(&ring),
        None => geo_types::LineString::new(Vec::new()),
    };
    let interiors = poly
        .interiors()
        .map(|ring| line_string_from(&ring))
        .collect::<Vec<geo_types::LineString>>();
    geo_types::Polygon::new(exterior, interiors)
}

fn expand_line(bbox: &mut BoundingBox, line: &geo_types::LineString) {
    for coord in &line.0 {
        bbox.expand_to_include(coord.x, coord.y);
    }
}

fn expand_polygon(bbox: &mut BoundingBox, poly: &geo_types::Polygon) {
    expand_line(bbox, poly.exterior());
    for ring in poly.interiors() {
        expand_line(bbox, ring);
    }
}

/// A 2D bounding box. The empty box uses inverted bounds so that "empty" is
/// representable explicitly instead of through an `Option`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// The explicitly-empty bounding box.
    pub const EMPTY: Self = Self {
        min_x: 0.0,
        min_y: 0.0,
        max_x: -1.0,
        max_y: -1.0,
    };

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    /// Grow the box to cover the given coordinate. An empty box becomes the
    /// degenerate box at that coordinate.
    pub fn expand_to_include(&mut self, x: f64, y: f64) {
        if self.is_empty() {
            *self = Self::new(x, y, x, y);
        } else {
            self.min_x = self.min_x.min(x);
            self.min_y = self.min_y.min(y);
            self.max_x = self.max_x.max(x);
            self.max_y = self.max_y.max(y);
        }
    }
}
