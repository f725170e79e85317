//! Overview/detail viewport synchronization
//!
//! [`ViewportSync`] owns a wide overview viewport and a zoomed detail viewport whose span is
//! `1 / ratio` of the overview's. It derives the [`CoverageMarker`], the detail footprint as
//! drawn on top of the overview.
//!
//! Regions only change through taps or through explicit host updates. Recomputing the marker
//! after a pan or zoom never writes back into either region, so panning the detail viewport
//! moves the marker and nothing else.

use crate::geometry::{GeoPoint, GeoRegion};
use crate::viewport::{PixelRect, Projection, Viewport};
use crate::{Error, Result};
use geo::{Coord, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the viewport pair
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncConfig {
    /// Overview span divided by detail span; must be greater than 1.
    /// Default: 10
    pub ratio: f64,
    /// Smallest marker width/height in pixels, so the marker stays visible and tappable
    /// even when the detail footprint projects to almost nothing.
    /// Default: 20
    pub min_marker_size: f64,
    /// Projection used by both viewports
    pub projection: Projection,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ratio: 10.0,
            min_marker_size: 20.0,
            projection: Projection::default(),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.ratio.is_finite() || self.ratio <= 1.0 {
            return Err(Error::InvalidRatio(self.ratio));
        }
        if !self.min_marker_size.is_finite() || self.min_marker_size < 0.0 {
            return Err(Error::InvalidMarkerSize(self.min_marker_size));
        }
        Ok(())
    }
}

/// Which of the two viewports an input refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ViewportRole {
    Overview,
    Detail,
}

/// The detail footprint as drawn on the overview
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoverageMarker {
    /// Detail region center
    pub position: GeoPoint,
    /// Detail region in overview pixels, each side floored at the minimum marker size
    pub bounds: PixelRect,
}

/// Keeps an overview and a detail viewport in a fixed scale relationship
#[derive(Debug, Clone)]
pub struct ViewportSync {
    overview: Viewport,
    detail: Viewport,
    config: SyncConfig,
    marker: CoverageMarker,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ViewportSync {
    /// Set up both viewports from the initial overview region
    ///
    /// The detail region shares the overview's center with its span divided by the ratio.
    pub fn new(
        initial_region: GeoRegion,
        overview_frame: PixelRect,
        detail_frame: PixelRect,
        config: SyncConfig,
    ) -> Result<Self> {
        config.validate()?;
        let overview = Viewport::new(initial_region, overview_frame, config.projection);
        let detail = Viewport::new(
            initial_region.scaled(1.0 / config.ratio),
            detail_frame,
            config.projection,
        );
        let marker = compute_marker(&overview, &detail, config.min_marker_size);
        Ok(Self {
            overview,
            detail,
            config,
            marker,
        })
    }

    /// React to a pan, zoom or frame change on either viewport
    ///
    /// Only the marker is recomputed; neither region is touched.
    pub fn on_viewport_changed(&mut self, which: ViewportRole) -> &CoverageMarker {
        tracing::trace!(?which, "Viewport changed");
        self.refresh_marker()
    }

    /// Handle a tap on one of the viewports
    ///
    /// - Overview: recenter the overview on the tapped point and drill the detail viewport
    ///   into it.
    /// - Detail: zoom the overview out to frame the detail footprint times the ratio. The
    ///   pixel is ignored.
    pub fn on_tap(&mut self, which: ViewportRole, pixel: Coord<f64>) -> Result<&CoverageMarker> {
        match which {
            ViewportRole::Overview => {
                if !self.overview.has_frame() {
                    return Err(Error::FrameNotLaidOut);
                }
                if !self.overview.contains_pixel(pixel) {
                    tracing::warn!(x = pixel.x, y = pixel.y, "Ignoring tap outside overview frame");
                    return Err(Error::TapOutsideFrame {
                        x: pixel.x,
                        y: pixel.y,
                    });
                }
                let target = self.overview.to_geo(pixel).ok_or(Error::FrameNotLaidOut)?;
                let overview_region = self.overview.region().with_center(target);
                self.overview.set_region(overview_region);
                self.detail
                    .set_region(overview_region.scaled(1.0 / self.config.ratio));
                tracing::debug!(lat = target.lat, lon = target.lon, "Drilled into overview tap");
            }
            ViewportRole::Detail => {
                let overview_region = self.detail.region().scaled(self.config.ratio);
                self.overview.set_region(overview_region);
                tracing::debug!(
                    lat = overview_region.center.lat,
                    lon = overview_region.center.lon,
                    "Zoomed overview out to detail footprint"
                );
            }
        }
        Ok(self.refresh_marker())
    }

    /// Apply a region change reported by the host (pan/zoom gesture)
    ///
    /// The marker is not refreshed; call [`ViewportSync::on_viewport_changed`] afterwards.
    pub fn set_region(&mut self, which: ViewportRole, region: GeoRegion) {
        self.viewport_mut(which).set_region(region);
    }

    /// Apply a frame change reported by the host (layout, rotation)
    ///
    /// The marker is not refreshed; call [`ViewportSync::on_viewport_changed`] afterwards.
    pub fn set_frame(&mut self, which: ViewportRole, frame: PixelRect) {
        self.viewport_mut(which).set_frame(frame);
    }

    fn viewport_mut(&mut self, which: ViewportRole) -> &mut Viewport {
        match which {
            ViewportRole::Overview => &mut self.overview,
            ViewportRole::Detail => &mut self.detail,
        }
    }

    fn refresh_marker(&mut self) -> &CoverageMarker {
        self.marker = compute_marker(&self.overview, &self.detail, self.config.min_marker_size);
        &self.marker
    }

    #[inline]
    pub fn overview(&self) -> &Viewport {
        &self.overview
    }

    #[inline]
    pub fn detail(&self) -> &Viewport {
        &self.detail
    }

    pub fn viewport(&self, which: ViewportRole) -> &Viewport {
        match which {
            ViewportRole::Overview => &self.overview,
            ViewportRole::Detail => &self.detail,
        }
    }

    #[inline]
    pub fn marker(&self) -> &CoverageMarker {
        &self.marker
    }

    #[inline]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

/// Derive the marker from the current viewport pair
///
/// Before the overview is laid out there is nothing to project onto, so the marker collapses
/// to the frame origin (and is then floored like any other).
fn compute_marker(overview: &Viewport, detail: &Viewport, min_size: f64) -> CoverageMarker {
    let detail_region = detail.region();
    let footprint = overview
        .convert_region(&detail_region)
        .unwrap_or_else(|| Rect::new(overview.frame().min(), overview.frame().min()));
    let bounds = floor_to_min_size(footprint, min_size);
    tracing::trace!(
        width = bounds.width(),
        height = bounds.height(),
        "Recomputed coverage marker"
    );
    CoverageMarker {
        position: detail_region.center,
        bounds,
    }
}

/// Grow each side of `rect` to at least `min_size`, keeping its center
fn floor_to_min_size(rect: PixelRect, min_size: f64) -> PixelRect {
    let center = rect.center();
    let half_width = rect.width().max(min_size) / 2.0;
    let half_height = rect.height().max(min_size) / 2.0;
    Rect::new(
        Coord {
            x: center.x - half_width,
            y: center.y - half_height,
        },
        Coord {
            x: center.x + half_width,
            y: center.y + half_height,
        },
    )
}
