//! Geographic value types and pure geometry helpers
//!
//! Everything in here is stateless. The sync engine and the proximity tracker build on
//! these functions; hosts may also call them directly (e.g. to frame a path on screen).

use crate::{Error, Polyline, Result};
use geo::{Coord, Point};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Mean Earth radius used by [`haversine_distance`]
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Precomputed constant: 180.0 / EARTH_MERCATOR_MAX
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;

/// Precomputed constant: PI / EARTH_MERCATOR_MAX
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// A WGS84 position in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Project into Web Mercator meters
    #[inline]
    pub fn to_mercator(self) -> Point<f64> {
        wgs84_to_mercator(self.lat, self.lon)
    }

    /// Inverse of [`GeoPoint::to_mercator`]
    #[inline]
    pub fn from_mercator(point: Point<f64>) -> Self {
        let (lat, lon) = mercator_to_wgs84(point.x(), point.y());
        Self { lat, lon }
    }

    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        Coord {
            x: point.lon,
            y: point.lat,
        }
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(coord: Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

impl From<Point<f64>> for GeoPoint {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

/// Latitude/longitude extent of a region, in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionSpan {
    pub lat_delta: f64,
    pub lon_delta: f64,
}

impl RegionSpan {
    pub const fn new(lat_delta: f64, lon_delta: f64) -> Self {
        Self {
            lat_delta,
            lon_delta,
        }
    }
}

/// The geographic area a viewport shows: a center plus a span
///
/// A zero span is a degenerate but legal region covering a single point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct GeoRegion {
    pub center: GeoPoint,
    pub span: RegionSpan,
}

impl GeoRegion {
    /// Create a region, rejecting negative or non-finite spans
    pub fn new(center: GeoPoint, span: RegionSpan) -> Result<Self> {
        let valid = |delta: f64| delta.is_finite() && delta >= 0.0;
        if !valid(span.lat_delta) || !valid(span.lon_delta) {
            return Err(Error::InvalidSpan {
                lat_delta: span.lat_delta,
                lon_delta: span.lon_delta,
            });
        }
        if !center.is_finite() {
            return Err(Error::InvalidGeometry(format!(
                "non-finite region center ({}, {})",
                center.lat, center.lon
            )));
        }
        Ok(Self { center, span })
    }

    /// Smallest region containing every point
    ///
    /// A single point yields a zero-span region centered on it.
    pub fn bounding(points: &[GeoPoint]) -> Result<Self> {
        let Some(first) = points.first() else {
            return Err(Error::EmptyPoints);
        };

        let (mut south, mut north) = (first.lat, first.lat);
        let (mut west, mut east) = (first.lon, first.lon);
        for point in &points[1..] {
            south = south.min(point.lat);
            north = north.max(point.lat);
            west = west.min(point.lon);
            east = east.max(point.lon);
        }

        Self::new(
            GeoPoint::new((south + north) / 2.0, (west + east) / 2.0),
            RegionSpan::new(north - south, east - west),
        )
    }

    /// Bounding region grown by a proportional margin (`1.25` adds 25% of the span)
    pub fn bounding_with_margin(points: &[GeoPoint], margin: f64) -> Result<Self> {
        Self::bounding(points)?.scale(margin)
    }

    /// Multiply both span components by `factor`, keeping the center
    pub fn scale(&self, factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidScaleFactor(factor));
        }
        Ok(self.scaled(factor))
    }

    /// Scale with a factor the caller has already validated
    pub(crate) fn scaled(&self, factor: f64) -> Self {
        debug_assert!(factor > 0.0, "scale factor must be positive");
        Self {
            center: self.center,
            span: RegionSpan::new(self.span.lat_delta * factor, self.span.lon_delta * factor),
        }
    }

    /// Same span, moved to a new center
    pub fn with_center(&self, center: GeoPoint) -> Self {
        Self {
            center,
            span: self.span,
        }
    }

    #[inline]
    pub fn north(&self) -> f64 {
        self.center.lat + self.span.lat_delta / 2.0
    }

    #[inline]
    pub fn south(&self) -> f64 {
        self.center.lat - self.span.lat_delta / 2.0
    }

    #[inline]
    pub fn east(&self) -> f64 {
        self.center.lon + self.span.lon_delta / 2.0
    }

    #[inline]
    pub fn west(&self) -> f64 {
        self.center.lon - self.span.lon_delta / 2.0
    }

    /// Corners in NW, NE, SE, SW order
    pub fn corners(&self) -> [GeoPoint; 4] {
        [
            GeoPoint::new(self.north(), self.west()),
            GeoPoint::new(self.north(), self.east()),
            GeoPoint::new(self.south(), self.east()),
            GeoPoint::new(self.south(), self.west()),
        ]
    }

    /// Whether the point lies inside the region (edges included)
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.south()..=self.north()).contains(&point.lat)
            && (self.west()..=self.east()).contains(&point.lon)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for GeoRegion {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Parts {
            center: GeoPoint,
            span: RegionSpan,
        }

        let Parts { center, span } = Parts::deserialize(deserializer)?;
        GeoRegion::new(center, span).map_err(serde::de::Error::custom)
    }
}

/// How distances between a query point and a path are measured
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DistanceMetric {
    /// Euclidean distance in degree space (longitude as x, latitude as y)
    Planar,
    /// Projection in Web Mercator space, great-circle distance in meters
    #[default]
    Geodesic,
}

/// Nearest point of a polyline to some query point
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClosestPointResult {
    /// Projection of the query onto the nearest segment
    pub point: GeoPoint,
    /// Distance from the query to `point`, in the units of the metric used
    pub distance: f64,
    /// Index of the segment `(points[i], points[i + 1])` holding the projection
    pub segment_index: usize,
}

/// Closest point on `polyline` to `query`
///
/// Each segment is projected with a parameter clamped to `[0, 1]`, so the result never lies
/// beyond a segment's endpoints. Zero-length segments resolve to their shared endpoint. When
/// two segments are equally close the lower index wins.
pub fn closest_point(
    query: GeoPoint,
    polyline: &Polyline,
    metric: DistanceMetric,
) -> ClosestPointResult {
    #[cfg(feature = "profiling")]
    profiling::scope!("geometry::closest_point");

    let points = polyline.points();
    let (point, distance) = project_onto_segment(query, points[0], points[1], metric);
    let mut best = ClosestPointResult {
        point,
        distance,
        segment_index: 0,
    };

    for (segment_index, pair) in points.windows(2).enumerate().skip(1) {
        let (point, distance) = project_onto_segment(query, pair[0], pair[1], metric);
        // Strict comparison keeps the lowest index on ties
        if distance < best.distance {
            best = ClosestPointResult {
                point,
                distance,
                segment_index,
            };
        }
    }

    best
}

/// Project `query` onto the closed segment `start..end`
fn project_onto_segment(
    query: GeoPoint,
    start: GeoPoint,
    end: GeoPoint,
    metric: DistanceMetric,
) -> (GeoPoint, f64) {
    match metric {
        DistanceMetric::Planar => {
            let t = projection_parameter(query.into(), start.into(), end.into());
            let point = if t == 0.0 {
                start
            } else if t == 1.0 {
                end
            } else {
                GeoPoint::from(lerp(start.into(), end.into(), t))
            };
            (point, planar_distance(query, point))
        }
        DistanceMetric::Geodesic => {
            let (a, b) = (start.to_mercator().0, end.to_mercator().0);
            let t = projection_parameter(query.to_mercator().0, a, b);
            // Endpoints are returned verbatim to avoid Mercator round-trip drift
            let point = if t == 0.0 {
                start
            } else if t == 1.0 {
                end
            } else {
                GeoPoint::from_mercator(Point(lerp(a, b, t)))
            };
            (point, haversine_distance(query, point))
        }
    }
}

/// Parameter of the orthogonal projection of `q` onto `a..b`, clamped to `[0, 1]`
///
/// Degenerate segments (`a == b`) return `0.0`.
#[inline]
fn projection_parameter(q: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d = b - a;
    let length_sq = d.x * d.x + d.y * d.y;
    if length_sq == 0.0 {
        return 0.0;
    }
    let t = ((q.x - a.x) * d.x + (q.y - a.y) * d.y) / length_sq;
    t.clamp(0.0, 1.0)
}

#[inline]
fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

/// Euclidean distance in degree space
#[inline]
pub fn planar_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    (b.lon - a.lon).hypot(b.lat - a.lat)
}

/// Great-circle distance between two points in meters (Haversine formula)
#[inline]
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// Latitude is clamped to the representable range first.
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

    Point::new(x, y)
}

/// Convert Web Mercator (x, y) in meters to WGS84, returned as (latitude, longitude)
#[inline(always)]
pub fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x * X_TO_LON_FACTOR;
    let lat =
        (std::f64::consts::PI / 2.0 - 2.0 * ((-y * Y_TO_LAT_FACTOR).exp()).atan()).to_degrees();
    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(points: &[(f64, f64)]) -> Polyline {
        let points = points
            .iter()
            .map(|&(lat, lon)| GeoPoint::new(lat, lon))
            .collect();
        Polyline::new(points).unwrap()
    }

    fn on_closed_segment(p: GeoPoint, a: GeoPoint, b: GeoPoint) -> bool {
        let eps = 1e-9;
        let within = |v: f64, lo: f64, hi: f64| v >= lo.min(hi) - eps && v <= lo.max(hi) + eps;
        let cross = (b.lon - a.lon) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lon - a.lon);
        cross.abs() < 1e-9 && within(p.lat, a.lat, b.lat) && within(p.lon, a.lon, b.lon)
    }

    #[test]
    fn test_closest_point_interior_projection() {
        let line = path(&[(0.0, 0.0), (0.0, 10.0)]);
        let result = closest_point(GeoPoint::new(0.5, 5.0), &line, DistanceMetric::Planar);

        assert_eq!(result.segment_index, 0);
        assert!((result.point.lon - 5.0).abs() < 1e-12);
        assert!(result.point.lat.abs() < 1e-12);
        assert!((result.distance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_closest_point_is_clamped_to_segment() {
        let a = GeoPoint::new(1.0, 1.0);
        let b = GeoPoint::new(3.0, 4.0);
        let line = Polyline::new(vec![a, b]).unwrap();

        let queries = [
            GeoPoint::new(-10.0, -10.0),
            GeoPoint::new(50.0, 70.0),
            GeoPoint::new(2.0, 2.5),
            GeoPoint::new(0.0, 6.0),
            GeoPoint::new(4.0, -3.0),
        ];
        for query in queries {
            let result = closest_point(query, &line, DistanceMetric::Planar);
            assert!(
                on_closed_segment(result.point, a, b),
                "{query:?} projected off the segment to {:?}",
                result.point
            );
        }

        // Beyond an endpoint the projection is the endpoint itself
        let result = closest_point(GeoPoint::new(-10.0, -10.0), &line, DistanceMetric::Planar);
        assert_eq!(result.point, a);
        let result = closest_point(GeoPoint::new(50.0, 70.0), &line, DistanceMetric::Planar);
        assert_eq!(result.point, b);
    }

    #[test]
    fn test_closest_point_zero_length_segment() {
        let line = path(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]);
        let result = closest_point(GeoPoint::new(4.0, 5.0), &line, DistanceMetric::Planar);

        assert_eq!(result.point, GeoPoint::new(1.0, 1.0));
        assert!((result.distance - 5.0).abs() < 1e-12);
        assert_eq!(result.segment_index, 0);
        assert!(result.distance.is_finite());
    }

    #[test]
    fn test_closest_point_tie_prefers_lowest_segment() {
        // Two parallel segments equally far from the query
        let line = path(&[(1.0, 0.0), (1.0, 10.0), (-1.0, 10.0), (-1.0, 0.0)]);
        let result = closest_point(GeoPoint::new(0.0, 5.0), &line, DistanceMetric::Planar);

        assert_eq!(result.segment_index, 0);
        assert!((result.distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_closest_point_picks_nearest_segment() {
        let line = path(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
        let result = closest_point(GeoPoint::new(5.0, 9.0), &line, DistanceMetric::Planar);

        assert_eq!(result.segment_index, 1);
        assert!((result.distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_closest_point_geodesic_meters() {
        // Equator segment; 0.001 degrees of latitude is roughly 111 meters
        let line = path(&[(0.0, 0.0), (0.0, 0.01)]);
        let result = closest_point(GeoPoint::new(0.001, 0.005), &line, DistanceMetric::Geodesic);

        assert_eq!(result.segment_index, 0);
        assert!((result.point.lon - 0.005).abs() < 1e-9);
        assert!(result.point.lat.abs() < 1e-9);
        assert!((result.distance - 111.19).abs() < 0.5, "{}", result.distance);
    }

    #[test]
    fn test_closest_point_geodesic_endpoint_is_exact() {
        let start = GeoPoint::new(51.5074, -0.1278);
        let end = GeoPoint::new(51.5078, -0.1274);
        let line = Polyline::new(vec![start, end]).unwrap();

        let result = closest_point(GeoPoint::new(51.5, -0.2), &line, DistanceMetric::Geodesic);
        assert_eq!(result.point, start);
    }

    #[test]
    fn test_bounding_region() {
        let points = [
            GeoPoint::new(1.0, -2.0),
            GeoPoint::new(3.0, 4.0),
            GeoPoint::new(-1.0, 0.0),
        ];
        let region = GeoRegion::bounding(&points).unwrap();

        assert_eq!(region.center, GeoPoint::new(1.0, 1.0));
        assert_eq!(region.span, RegionSpan::new(4.0, 6.0));
        assert!(points.iter().all(|p| region.contains(*p)));
    }

    #[test]
    fn test_bounding_single_point_is_zero_span() {
        let region = GeoRegion::bounding(&[GeoPoint::new(2.0, 3.0)]).unwrap();
        assert_eq!(region.center, GeoPoint::new(2.0, 3.0));
        assert_eq!(region.span, RegionSpan::new(0.0, 0.0));
    }

    #[test]
    fn test_bounding_empty_fails() {
        assert_eq!(GeoRegion::bounding(&[]), Err(Error::EmptyPoints));
    }

    #[test]
    fn test_bounding_with_margin() {
        let points = [GeoPoint::new(0.0, 0.0), GeoPoint::new(4.0, 8.0)];
        let region = GeoRegion::bounding_with_margin(&points, 1.25).unwrap();

        assert_eq!(region.center, GeoPoint::new(2.0, 4.0));
        assert_eq!(region.span, RegionSpan::new(5.0, 10.0));
    }

    #[test]
    fn test_scale_inverse_reproduces_span() {
        let region =
            GeoRegion::new(GeoPoint::new(12.5, -3.25), RegionSpan::new(0.37, 1.9)).unwrap();
        for k in [1e-6, 0.1, 0.5, 1.0, 3.0, 10.0, 12345.678] {
            let back = region.scale(k).unwrap().scale(1.0 / k).unwrap();
            assert_eq!(back.center, region.center);
            assert!((back.span.lat_delta - region.span.lat_delta).abs() < 1e-12);
            assert!((back.span.lon_delta - region.span.lon_delta).abs() < 1e-12);
        }
    }

    #[test]
    fn test_scale_rejects_non_positive_factor() {
        let region = GeoRegion::new(GeoPoint::new(0.0, 0.0), RegionSpan::new(1.0, 1.0)).unwrap();
        assert_eq!(region.scale(0.0), Err(Error::InvalidScaleFactor(0.0)));
        assert_eq!(region.scale(-2.0), Err(Error::InvalidScaleFactor(-2.0)));
        assert!(region.scale(f64::NAN).is_err());
    }

    #[test]
    fn test_region_rejects_negative_span() {
        let result = GeoRegion::new(GeoPoint::new(0.0, 0.0), RegionSpan::new(-1.0, 1.0));
        assert!(matches!(result, Err(Error::InvalidSpan { .. })));
    }

    #[test]
    fn test_region_edges_and_corners() {
        let region = GeoRegion::new(GeoPoint::new(0.0, 0.0), RegionSpan::new(10.0, 20.0)).unwrap();
        assert_eq!(region.north(), 5.0);
        assert_eq!(region.south(), -5.0);
        assert_eq!(region.east(), 10.0);
        assert_eq!(region.west(), -10.0);
        assert_eq!(region.corners()[0], GeoPoint::new(5.0, -10.0));
        assert_eq!(region.corners()[2], GeoPoint::new(-5.0, 10.0));
        assert!(region.contains(GeoPoint::new(5.0, 10.0)));
        assert!(!region.contains(GeoPoint::new(5.1, 0.0)));
    }

    #[test]
    fn test_mercator_roundtrip() {
        let point = GeoPoint::new(51.5074, -0.1278);
        let back = GeoPoint::from_mercator(point.to_mercator());

        assert!((point.lat - back.lat).abs() < 1e-9);
        assert!((point.lon - back.lon).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_origin() {
        let point = wgs84_to_mercator(0.0, 0.0);
        assert!(point.x().abs() < 0.01);
        assert!(point.y().abs() < 0.01);
    }

    #[test]
    fn test_haversine_distance() {
        // One degree of longitude at the equator
        let d = haversine_distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 1.0, "{d}");
        assert_eq!(
            haversine_distance(GeoPoint::new(3.0, 4.0), GeoPoint::new(3.0, 4.0)),
            0.0
        );
    }

    #[test]
    fn test_coord_conversion_axes() {
        let coord: Coord<f64> = GeoPoint::new(2.0, 3.0).into();
        assert_eq!(coord, Coord { x: 3.0, y: 2.0 });
        assert_eq!(GeoPoint::from(Point::new(3.0, 2.0)), GeoPoint::new(2.0, 3.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_region_deserialize_rejects_negative_span() {
        let region = GeoRegion::new(GeoPoint::new(1.0, 2.0), RegionSpan::new(3.0, 4.0)).unwrap();
        let json = serde_json::to_string(&region).unwrap();
        assert_eq!(serde_json::from_str::<GeoRegion>(&json).unwrap(), region);

        let negative = r#"{"center": {"lat": 0.0, "lon": 0.0},
            "span": {"lat_delta": -5.0, "lon_delta": 1.0}}"#;
        assert!(serde_json::from_str::<GeoRegion>(negative).is_err());
    }
}
