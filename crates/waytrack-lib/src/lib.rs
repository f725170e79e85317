//! Waytrack Library - Core engines behind an overview/detail map UI
//!
//! This library holds the two stateful mechanisms of a mobile mapping screen. Platform
//! concerns (drawing, layout, gesture recognition, file loading) stay with the host, which
//! feeds notifications in and renders whatever comes out.
//!
//! # Architecture
//!
//! - **[`geometry`]**: Value types ([`GeoPoint`], [`GeoRegion`]) and pure helpers
//!   (closest point on a path, region scaling, Web Mercator conversion)
//! - **[`Polyline`]**: Immutable path with a cached bounding region and length
//! - **[`Viewport`]**: A geographic region shown inside an on-screen pixel frame
//! - **[`ViewportSync`]**: Keeps a wide overview and a zoomed detail viewport locked
//!   together and derives the [`CoverageMarker`] drawn on the overview
//! - **[`ProximityTracker`]**: Hysteresis state machine telling whether a moving point
//!   is on the path, fanning [`TrackingEvent`]s out to subscribers
//!
//! # Threading
//!
//! Every engine expects serialized access from one logical owner (a UI event loop). Hosts
//! delivering from several threads wrap each instance in a single `Mutex`.

pub mod geometry;
mod polyline;
mod subscription;
mod sync;
mod tracker;
mod viewport;

// Public API exports
pub use geometry::{ClosestPointResult, DistanceMetric, GeoPoint, GeoRegion, RegionSpan};
pub use polyline::Polyline;
pub use subscription::{SubscriptionHandle, Subscribers};
pub use sync::{CoverageMarker, SyncConfig, ViewportRole, ViewportSync};
pub use tracker::{
    LineStyle, LocationSample, ProximityTracker, TrackingEvent, TrackingPolicy, TrackingState,
};
pub use viewport::{PixelRect, Projection, Viewport};

/// Error types for the waytrack engines
///
/// Every variant is a caller contract violation reported at the call site. Nothing here is
/// transient or retryable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Polyline needs at least 2 points, got {count}")]
    TooFewPoints { count: usize },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("No points to bound")]
    EmptyPoints,

    #[error("Region span must be non-negative, got ({lat_delta}, {lon_delta})")]
    InvalidSpan { lat_delta: f64, lon_delta: f64 },

    #[error("Scale factor must be positive and finite, got {0}")]
    InvalidScaleFactor(f64),

    #[error("Tracking tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),

    #[error("Overview/detail ratio must be greater than 1, got {0}")]
    InvalidRatio(f64),

    #[error("Minimum marker size must be non-negative and finite, got {0}")]
    InvalidMarkerSize(f64),

    #[error("Tap at ({x}, {y}) lies outside the viewport frame")]
    TapOutsideFrame { x: f64, y: f64 },

    #[error("Viewport frame has not been laid out yet")]
    FrameNotLaidOut,
}

pub type Result<T> = std::result::Result<T, Error>;
