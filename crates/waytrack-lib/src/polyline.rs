//! Path storage
//!
//! This module provides the `Polyline` struct: an immutable sequence of points with
//! precomputed metadata like its bounding region and length.

use crate::geometry::{self, ClosestPointResult, DistanceMetric, GeoPoint, GeoRegion};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered path of at least two points
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<GeoPoint>", into = "Vec<GeoPoint>")
)]
pub struct Polyline {
    /// Vertices in path order
    points: Vec<GeoPoint>,
    /// Precomputed bounding region
    bounding_region: GeoRegion,
    /// Cached total length in meters (computed once during construction)
    cached_length_meters: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Polyline {
    /// Create a new polyline
    ///
    /// Fails when fewer than two points are given or when a coordinate is not finite.
    /// Consecutive duplicate points are allowed; they form zero-length segments.
    pub fn new(points: Vec<GeoPoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::TooFewPoints {
                count: points.len(),
            });
        }

        if let Some((index, point)) = points.iter().enumerate().find(|(_, p)| !p.is_finite()) {
            return Err(Error::InvalidGeometry(format!(
                "point {index} is not finite: ({}, {})",
                point.lat, point.lon
            )));
        }

        let bounding_region = GeoRegion::bounding(&points)?;
        let cached_length_meters = points
            .windows(2)
            .map(|pair| geometry::haversine_distance(pair[0], pair[1]))
            .sum();

        tracing::debug!(
            points = points.len(),
            length_m = cached_length_meters,
            "Built polyline"
        );

        Ok(Self {
            points,
            bounding_region,
            cached_length_meters,
        })
    }

    /// All vertices in path order
    #[inline]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Number of segments (always `points().len() - 1`)
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.points.len() - 1
    }

    /// Smallest region containing the whole path
    #[inline]
    pub fn bounding_region(&self) -> GeoRegion {
        self.bounding_region
    }

    /// Region framing the path with a proportional margin around it
    pub fn framing_region(&self, margin: f64) -> Result<GeoRegion> {
        self.bounding_region.scale(margin)
    }

    /// Total great-circle length in meters
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn length_meters(&self) -> f64 {
        self.cached_length_meters
    }

    /// Closest point on this path to `query`; see [`geometry::closest_point`]
    #[inline]
    pub fn closest_point(&self, query: GeoPoint, metric: DistanceMetric) -> ClosestPointResult {
        geometry::closest_point(query, self, metric)
    }
}

impl TryFrom<Vec<GeoPoint>> for Polyline {
    type Error = Error;

    fn try_from(points: Vec<GeoPoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<Polyline> for Vec<GeoPoint> {
    fn from(polyline: Polyline) -> Self {
        polyline.points
    }
}
