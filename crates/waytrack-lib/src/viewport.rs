//! Viewports: a geographic region shown inside an on-screen pixel frame

use crate::geometry::{GeoPoint, GeoRegion};
use geo::{Coord, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rectangle in screen pixels; y grows downward
pub type PixelRect = Rect<f64>;

/// Map projection used to lay a region out over a pixel frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Projection {
    /// Latitude and longitude map linearly onto pixels
    Linear,
    /// Spherical Web Mercator, as used by slippy-map tiles
    #[default]
    WebMercator,
}

impl Projection {
    /// Planar coordinates where x grows east and y grows north
    #[inline]
    fn forward(self, point: GeoPoint) -> Coord<f64> {
        match self {
            Self::Linear => point.into(),
            Self::WebMercator => point.to_mercator().0,
        }
    }

    #[inline]
    fn inverse(self, coord: Coord<f64>) -> GeoPoint {
        match self {
            Self::Linear => coord.into(),
            Self::WebMercator => GeoPoint::from_mercator(coord.into()),
        }
    }
}

/// A region displayed inside a frame, with the projection between the two
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Viewport {
    region: GeoRegion,
    frame: PixelRect,
    projection: Projection,
}

/// Planar extent of the visible region
struct PlaneBounds {
    west: f64,
    north: f64,
    width: f64,
    height: f64,
}

impl Viewport {
    pub fn new(region: GeoRegion, frame: PixelRect, projection: Projection) -> Self {
        Self {
            region,
            frame,
            projection,
        }
    }

    #[inline]
    pub fn region(&self) -> GeoRegion {
        self.region
    }

    #[inline]
    pub fn frame(&self) -> PixelRect {
        self.frame
    }

    #[inline]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn set_region(&mut self, region: GeoRegion) {
        self.region = region;
    }

    pub fn set_frame(&mut self, frame: PixelRect) {
        self.frame = frame;
    }

    /// Whether the frame has been laid out with a non-empty area
    pub fn has_frame(&self) -> bool {
        self.frame.width() > 0.0 && self.frame.height() > 0.0
    }

    /// Whether a pixel lies inside the frame (edges included)
    pub fn contains_pixel(&self, pixel: Coord<f64>) -> bool {
        let (min, max) = (self.frame.min(), self.frame.max());
        (min.x..=max.x).contains(&pixel.x) && (min.y..=max.y).contains(&pixel.y)
    }

    fn plane_bounds(&self) -> PlaneBounds {
        let north_west = self
            .projection
            .forward(GeoPoint::new(self.region.north(), self.region.west()));
        let south_east = self
            .projection
            .forward(GeoPoint::new(self.region.south(), self.region.east()));
        PlaneBounds {
            west: north_west.x,
            north: north_west.y,
            width: south_east.x - north_west.x,
            height: north_west.y - south_east.y,
        }
    }

    /// Pixel position of a geographic point
    ///
    /// Returns `None` while the frame is empty. An axis along which the region has zero
    /// extent maps to the middle of the frame.
    pub fn to_pixel(&self, point: GeoPoint) -> Option<Coord<f64>> {
        if !self.has_frame() {
            return None;
        }
        let bounds = self.plane_bounds();
        let plane = self.projection.forward(point);
        let (min, center) = (self.frame.min(), self.frame.center());

        let x = if bounds.width > 0.0 {
            min.x + (plane.x - bounds.west) / bounds.width * self.frame.width()
        } else {
            center.x
        };
        let y = if bounds.height > 0.0 {
            min.y + (bounds.north - plane.y) / bounds.height * self.frame.height()
        } else {
            center.y
        };
        Some(Coord { x, y })
    }

    /// Geographic point under a pixel; `None` while the frame is empty
    pub fn to_geo(&self, pixel: Coord<f64>) -> Option<GeoPoint> {
        if !self.has_frame() {
            return None;
        }
        let bounds = self.plane_bounds();
        let min = self.frame.min();
        let plane = Coord {
            x: bounds.west + (pixel.x - min.x) / self.frame.width() * bounds.width,
            y: bounds.north - (pixel.y - min.y) / self.frame.height() * bounds.height,
        };
        Some(self.projection.inverse(plane))
    }

    /// Enclosing pixel rectangle of `region` as drawn in this viewport
    ///
    /// The four corners of the region are projected and their bounding rectangle returned.
    /// Returns `None` while the frame is empty.
    pub fn convert_region(&self, region: &GeoRegion) -> Option<PixelRect> {
        let mut corners = region.corners().into_iter();
        let first = self.to_pixel(corners.next()?)?;
        let (mut min, mut max) = (first, first);
        for corner in corners {
            let pixel = self.to_pixel(corner)?;
            min.x = min.x.min(pixel.x);
            min.y = min.y.min(pixel.y);
            max.x = max.x.max(pixel.x);
            max.y = max.y.max(pixel.y);
        }
        Some(Rect::new(min, max))
    }
}
