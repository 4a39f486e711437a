use std::str::FromStr;

use crate::error::CodecError;
use crate::geometry::{BoundingBox, Geometry, GeometryValue, UNKNOWN_SRID};
use crate::sql::string_literal;
use geo_traits::{GeometryCollectionTrait, GeometryTrait};
use wkb::reader::Wkb;

// cf. https://libgeos.org/specifications/wkb/#extended-wkb
const EWKB_SRID_FLAG: u32 = 0x2000_0000;

/// Serialize a geometry as WKT, normalizing rings to line strings.
pub fn encode_wkt(geometry: &Geometry) -> Result<String, CodecError> {
    let geo = geometry.to_geo();
    let mut wkt = String::new();
    wkt::to_wkt::write_geometry(&mut wkt, &geo)
        .map_err(|err| CodecError::MalformedWkt(err.to_string()))?;
    Ok(wkt)
}

/// Encode a geometry as the SQL expression that constructs it in the
/// backend. Empty geometries encode to the SQL `NULL` literal. The SRID is
/// embedded in the constructor whenever it is known; the backend tags SRID
/// natively.
pub fn encode_sql(geometry: &Geometry, srid: i32) -> Result<String, CodecError> {
    if geometry.is_empty() {
        return Ok("NULL".to_string());
    }

    let wkt = encode_wkt(geometry)?;
    if srid >= 0 {
        Ok(format!("ST_GeomFromText({}, {srid})", string_literal(&wkt)))
    } else {
        Ok(format!("ST_GeomFromText({})", string_literal(&wkt)))
    }
}

/// Encode a geometry as WKB bytes, framed as EWKB with the SRID flag when
/// the SRID is known.
pub fn encode_ewkb(geometry: &Geometry, srid: i32) -> Result<Vec<u8>, CodecError> {
    let geo = geometry.to_geo();
    let mut body = Vec::new();
    wkb::writer::write_geometry(&mut body, &geo, &Default::default())?;

    if srid < 0 {
        return Ok(body);
    }

    if body.len() < 5 {
        return Err(CodecError::MalformedWkb(format!(
            "{} bytes is too short for a WKB header",
            body.len()
        )));
    }
    let little_endian = byte_order(body[0])?;
    let type_word = read_u32(&body[1..5], little_endian) | EWKB_SRID_FLAG;

    let mut framed = Vec::with_capacity(body.len() + 4);
    framed.push(body[0]);
    framed.extend_from_slice(&u32_bytes(type_word, little_endian));
    framed.extend_from_slice(&u32_bytes(srid as u32, little_endian));
    framed.extend_from_slice(&body[5..]);
    Ok(framed)
}

/// Per-worker geometry decoder.
///
/// Holds a reusable scratch buffer for EWKB deframing so that row-by-row
/// decoding does not reallocate. A decoder belongs to exactly one worker
/// task at a time; callers acquire one from the dialect facade and scope it
/// to their iteration instead of sharing it across threads.
#[derive(Debug)]
pub struct GeometryDecoder {
    force_2d: bool,
    scratch: Vec<u8>,
}

impl Default for GeometryDecoder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl GeometryDecoder {
    /// When `force_2d` is set, Z/M ordinates in the input are flattened to
    /// XY; otherwise such input is refused with
    /// [`CodecError::UnsupportedDimension`].
    pub fn new(force_2d: bool) -> Self {
        Self {
            force_2d,
            scratch: Vec::new(),
        }
    }

    /// Parse WKT into a geometry value. WKT carries no SRID, so the result
    /// is unreferenced.
    pub fn decode_wkt(&mut self, raw: &str) -> Result<GeometryValue, CodecError> {
        let wkt = wkt::Wkt::<f64>::from_str(raw)
            .map_err(|err| CodecError::MalformedWkt(err.to_string()))?;
        if !self.force_2d
            && let Some(tag) = extra_dimension_tag(&wkt)
        {
            return Err(CodecError::UnsupportedDimension { dimensions: tag });
        }
        Ok(GeometryValue::unreferenced(Geometry::from_geometry(&wkt)))
    }

    /// Parse WKB or EWKB bytes. An EWKB SRID frame is honored; plain WKB
    /// yields an unreferenced geometry.
    pub fn decode_ewkb(&mut self, raw: &[u8]) -> Result<GeometryValue, CodecError> {
        if raw.len() < 5 {
            return Err(CodecError::MalformedWkb(format!(
                "{} bytes is too short for a WKB header",
                raw.len()
            )));
        }

        let little_endian = byte_order(raw[0])?;
        let type_word = read_u32(&raw[1..5], little_endian);

        let (srid, body): (i32, &[u8]) = if type_word & EWKB_SRID_FLAG != 0 {
            if raw.len() < 9 {
                return Err(CodecError::MalformedWkb(format!(
                    "{} bytes is too short for an EWKB SRID frame",
                    raw.len()
                )));
            }
            let srid = read_u32(&raw[5..9], little_endian) as i32;

            self.scratch.clear();
            self.scratch.push(raw[0]);
            self.scratch
                .extend_from_slice(&u32_bytes(type_word & !EWKB_SRID_FLAG, little_endian));
            self.scratch.extend_from_slice(&raw[9..]);
            (srid, self.scratch.as_slice())
        } else {
            (UNKNOWN_SRID, raw)
        };

        let wkb = Wkb::try_new(body)?;
        if !self.force_2d && wkb.dimension() != wkb::reader::Dimension::Xy {
            return Err(CodecError::UnsupportedDimension {
                dimensions: format!("{:?}", wkb.dimension()),
            });
        }

        Ok(GeometryValue::new(Geometry::from_geometry(&wkb), srid))
    }

    /// Parse a WKT envelope/polygon into a bounding box. An empty input or
    /// an `EMPTY` geometry yields the explicitly-empty box, not an error.
    pub fn decode_envelope(&mut self, raw: &str) -> Result<BoundingBox, CodecError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(BoundingBox::EMPTY);
        }

        let wkt = wkt::Wkt::<f64>::from_str(trimmed)
            .map_err(|err| CodecError::MalformedWkt(err.to_string()))?;
        Ok(Geometry::from_geometry(&wkt).bounding_box())
    }
}

fn byte_order(marker: u8) -> Result<bool, CodecError> {
    match marker {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(CodecError::MalformedWkb(format!(
            "invalid byte order marker {other:#04x}"
        ))),
    }
}

fn read_u32(bytes: &[u8], little_endian: bool) -> u32 {
    let raw: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if little_endian {
        u32::from_le_bytes(raw)
    } else {
        u32::from_be_bytes(raw)
    }
}

fn u32_bytes(value: u32, little_endian: bool) -> [u8; 4] {
    if little_endian {
        value.to_le_bytes()
    } else {
        value.to_be_bytes()
    }
}

// Z/M tag of the first member carrying extra ordinates, recursing into
// collections so a tagged member cannot hide inside a 2D wrapper.
fn extra_dimension_tag<G: GeometryTrait<T = f64>>(geom: &G) -> Option<String> {
    use geo_traits::Dimensions;

    match geom.dim() {
        Dimensions::Xy | Dimensions::Unknown(2) => {}
        Dimensions::Xyz | Dimensions::Unknown(3) => return Some("Z".to_string()),
        Dimensions::Xym => return Some("M".to_string()),
        Dimensions::Xyzm | Dimensions::Unknown(4) => return Some("ZM".to_string()),
        other => return Some(format!("{other:?}")),
    }

    match geom.as_type() {
        geo_traits::GeometryType::GeometryCollection(collection) => collection
            .geometries()
            .find_map(|member| extra_dimension_tag(&member)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{GeometryDecoder, encode_ewkb, encode_sql, encode_wkt};
    use crate::error::CodecError;
    use crate::geometry::{BoundingBox, Geometry, UNKNOWN_SRID};
    use geo_types::{
        Geometry as Geo, GeometryCollection, LineString, MultiLineString, MultiPoint,
        MultiPolygon, Point, Polygon,
    };

    fn sample_geometries() -> Vec<Geometry> {
        let line = LineString::from(vec![(0.0, 0.0), (1.5, 1.0), (2.0, 0.5)]);
        let exterior = LineString::from(vec![
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 3.0),
            (0.0, 3.0),
            (0.0, 0.0),
        ]);
        let polygon = Polygon::new(exterior, vec![]);

        vec![
            Geometry::Point(Point::new(1.0, 2.0)),
            Geometry::LineString(line.clone()),
            Geometry::Polygon(polygon.clone()),
            Geometry::MultiPoint(MultiPoint::from(vec![
                Point::new(1.0, 1.0),
                Point::new(2.0, 2.0),
            ])),
            Geometry::MultiLineString(MultiLineString::new(vec![
                line.clone(),
                LineString::from(vec![(-1.0, -1.0), (-2.0, -3.0)]),
            ])),
            Geometry::MultiPolygon(MultiPolygon::new(vec![polygon.clone()])),
            Geometry::GeometryCollection(vec![
                Geometry::Point(Point::new(-1.0, -2.0)),
                Geometry::LineString(line),
                Geometry::Polygon(polygon),
            ]),
        ]
    }

    #[test]
    fn roundtrips_all_subtypes_through_wkt() -> Result<(), CodecError> {
        let mut decoder = GeometryDecoder::default();
        for geometry in sample_geometries() {
            let wkt = encode_wkt(&geometry)?;
            let decoded = decoder.decode_wkt(&wkt)?;
            assert_eq!(decoded.geometry, geometry, "text roundtrip of {wkt}");
            assert_eq!(decoded.srid, UNKNOWN_SRID);
        }
        Ok(())
    }

    #[test]
    fn roundtrips_all_subtypes_through_ewkb_with_srid() -> Result<(), CodecError> {
        let mut decoder = GeometryDecoder::default();
        for geometry in sample_geometries() {
            let bytes = encode_ewkb(&geometry, 4326)?;
            let decoded = decoder.decode_ewkb(&bytes)?;
            assert_eq!(decoded.geometry, geometry);
            assert_eq!(decoded.srid, 4326, "SRID survives the binary path");
        }
        Ok(())
    }

    #[test]
    fn plain_wkb_decodes_as_unreferenced() -> Result<(), CodecError> {
        let geometry = Geometry::Point(Point::new(7.0, -3.5));
        let bytes = encode_ewkb(&geometry, UNKNOWN_SRID)?;

        let mut decoder = GeometryDecoder::default();
        let decoded = decoder.decode_ewkb(&bytes)?;
        assert_eq!(decoded.geometry, geometry);
        assert_eq!(decoded.srid, UNKNOWN_SRID);
        Ok(())
    }

    #[test]
    fn linear_ring_encodes_as_line_string() -> Result<(), CodecError> {
        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let wkt = encode_wkt(&Geometry::LinearRing(ring))?;
        assert!(
            wkt.to_ascii_uppercase().starts_with("LINESTRING"),
            "expected a LINESTRING fragment, got {wkt}"
        );
        Ok(())
    }

    #[test]
    fn empty_geometry_encodes_to_sql_null() -> Result<(), CodecError> {
        let empty = Geometry::LineString(LineString::new(Vec::new()));
        assert_eq!(encode_sql(&empty, 4326)?, "NULL");
        Ok(())
    }

    #[test]
    fn sql_literal_embeds_srid() -> Result<(), CodecError> {
        let fragment = encode_sql(&Geometry::Point(Point::new(1.0, 2.0)), 4326)?;
        assert!(fragment.starts_with("ST_GeomFromText('POINT"), "{fragment}");
        assert!(fragment.ends_with(", 4326)"), "{fragment}");
        Ok(())
    }

    #[test]
    fn malformed_wkt_is_an_error_not_a_null() {
        let mut decoder = GeometryDecoder::default();
        let err = decoder
            .decode_wkt("POINT (1.0")
            .expect_err("malformed WKT must fail");
        assert!(matches!(err, CodecError::MalformedWkt(_)));
    }

    #[test]
    fn truncated_wkb_is_an_error() {
        let mut decoder = GeometryDecoder::default();

        let err = decoder.decode_ewkb(&[0x01, 0x01]).expect_err("too short");
        assert!(matches!(err, CodecError::MalformedWkb(_)));

        // SRID flag set but no SRID bytes present.
        let err = decoder
            .decode_ewkb(&[0x01, 0x01, 0x00, 0x00, 0x20])
            .expect_err("missing srid bytes");
        assert!(matches!(err, CodecError::MalformedWkb(_)));

        let err = decoder
            .decode_ewkb(&[0x07, 0x01, 0x00, 0x00, 0x00])
            .expect_err("bad byte order marker");
        assert!(matches!(err, CodecError::MalformedWkb(_)));
    }

    #[test]
    fn z_coordinates_flatten_by_default_but_fail_without_forcing() {
        let mut forcing = GeometryDecoder::new(true);
        let decoded = forcing
            .decode_wkt("POINT Z (1 2 3)")
            .expect("flattened to XY");
        assert_eq!(decoded.geometry, Geometry::Point(Point::new(1.0, 2.0)));

        let mut strict = GeometryDecoder::new(false);
        let err = strict
            .decode_wkt("POINT Z (1 2 3)")
            .expect_err("3D refused");
        assert!(matches!(err, CodecError::UnsupportedDimension { .. }));
    }

    #[test]
    fn z_coordinates_nested_in_a_collection_fail_without_forcing() {
        let mut strict = GeometryDecoder::new(false);
        let err = strict
            .decode_wkt("GEOMETRYCOLLECTION (POINT (0 0), POINT Z (1 2 3))")
            .expect_err("3D member refused");
        assert!(matches!(err, CodecError::UnsupportedDimension { .. }));

        let mut forcing = GeometryDecoder::new(true);
        let decoded = forcing
            .decode_wkt("GEOMETRYCOLLECTION (POINT Z (1 2 3))")
            .expect("flattened to XY");
        assert_eq!(
            decoded.geometry,
            Geometry::GeometryCollection(vec![Geometry::Point(Point::new(1.0, 2.0))])
        );
    }

    #[test]
    fn decodes_envelopes_and_empty_envelopes() -> Result<(), CodecError> {
        let mut decoder = GeometryDecoder::default();

        let bbox = decoder.decode_envelope("POLYGON ((0 0, 4 0, 4 3, 0 3, 0 0))")?;
        assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 4.0, 3.0));

        assert!(decoder.decode_envelope("POLYGON EMPTY")?.is_empty());
        assert!(decoder.decode_envelope("")?.is_empty());
        Ok(())
    }

    #[test]
    fn from_geometry_accepts_geo_types_geometries() {
        let geo = Geo::GeometryCollection(GeometryCollection::from(vec![Geo::Point(Point::new(
            1.0, 2.0,
        ))]));
        let geometry = Geometry::from_geometry(&geo);
        assert_eq!(
            geometry,
            Geometry::GeometryCollection(vec![Geometry::Point(Point::new(1.0, 2.0))])
        );
    }
}
