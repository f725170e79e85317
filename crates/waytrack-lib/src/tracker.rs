//! Polyline proximity tracking
//!
//! [`ProximityTracker`] decides whether a moving point is on a path. Every location sample is
//! projected onto the path; the distance is compared against a tolerance band with an
//! inclusive boundary, and crossings are reported to subscribers as [`TrackingEvent`]s.
//!
//! ```text
//!            enable(t)                     distance <= t
//! Disabled ───────────▶ Enabled{off} ─────────────────────▶ Enabled{on}
//!    ▲                      ▲        ◀─────────────────────      │
//!    │      disable()       │            distance > t             │
//!    └──────────────────────┴─────────────────────────────────────┘
//! ```

use crate::geometry::{ClosestPointResult, DistanceMetric, GeoPoint};
use crate::subscription::{SubscriptionHandle, Subscribers};
use crate::{Error, Polyline, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Whether tracking runs, and how far from the path still counts as "on" it
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackingPolicy {
    /// Start in the enabled state
    pub enabled: bool,
    /// Maximum distance from the path that is still on it, in the metric's units
    pub tolerance: f64,
    /// How distances are measured
    pub metric: DistanceMetric,
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            tolerance: 4.0,
            metric: DistanceMetric::Geodesic,
        }
    }
}

/// Tracker state; owned and mutated only by [`ProximityTracker`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackingState {
    Disabled,
    Enabled { on_path: bool },
}

/// A raw position fix from the location source
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationSample {
    pub position: GeoPoint,
    /// Horizontal accuracy in meters; gating on it is the host's job
    pub accuracy: f64,
}

impl LocationSample {
    pub const fn new(position: GeoPoint, accuracy: f64) -> Self {
        Self { position, accuracy }
    }
}

/// Events emitted by the tracker, in the order they happen
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackingEvent {
    /// The point crossed the tolerance band
    OnPathChanged {
        on_path: bool,
        closest: ClosestPointResult,
    },
    /// Still on the path, but the projected position moved
    PositionChanged(ClosestPointResult),
    /// Tracking was switched off
    TrackingDisabled,
}

/// Parameters for drawing the tracked path
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineStyle {
    /// Stroke width in the metric's units; matches the tolerance band
    pub width: f64,
}

/// Hysteresis state machine over the distance between a moving point and a path
#[derive(Debug)]
pub struct ProximityTracker {
    polyline: Polyline,
    policy: TrackingPolicy,
    state: TrackingState,
    /// Most recent sample, replayed when tracking is (re-)enabled
    last_sample: Option<LocationSample>,
    /// Most recent projection, used to suppress no-op position updates
    last_result: Option<ClosestPointResult>,
    subscribers: Subscribers<TrackingEvent>,
}

fn validate_tolerance(tolerance: f64) -> Result<()> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(Error::InvalidTolerance(tolerance));
    }
    Ok(())
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ProximityTracker {
    /// Create a tracker for `polyline`
    ///
    /// Starts `Enabled { on_path: false }` when `policy.enabled` is set, `Disabled` otherwise.
    pub fn new(polyline: Polyline, policy: TrackingPolicy) -> Result<Self> {
        validate_tolerance(policy.tolerance)?;
        let state = if policy.enabled {
            TrackingState::Enabled { on_path: false }
        } else {
            TrackingState::Disabled
        };
        Ok(Self {
            polyline,
            policy,
            state,
            last_sample: None,
            last_result: None,
            subscribers: Subscribers::new(),
        })
    }

    /// Feed a location sample
    ///
    /// The sample is always cached. While enabled it is evaluated against the path, and any
    /// resulting events are delivered before this returns.
    pub fn process_sample(&mut self, sample: LocationSample) {
        self.last_sample = Some(sample);
        self.evaluate(sample.position);
    }

    /// Turn tracking on, or update the tolerance if it already is
    ///
    /// The cached sample (if any) is re-evaluated against the new tolerance, which may itself
    /// emit [`TrackingEvent::OnPathChanged`].
    pub fn enable(&mut self, tolerance: f64) -> Result<()> {
        validate_tolerance(tolerance)?;
        self.policy.tolerance = tolerance;
        self.policy.enabled = true;
        if self.state == TrackingState::Disabled {
            tracing::debug!(tolerance, "Tracking enabled");
            self.state = TrackingState::Enabled { on_path: false };
        }
        if let Some(sample) = self.last_sample {
            self.evaluate(sample.position);
        }
        Ok(())
    }

    /// Turn tracking off, emitting [`TrackingEvent::TrackingDisabled`] once
    ///
    /// Does nothing when already disabled.
    pub fn disable(&mut self) {
        if self.state == TrackingState::Disabled {
            return;
        }
        tracing::debug!("Tracking disabled");
        self.state = TrackingState::Disabled;
        self.policy.enabled = false;
        self.subscribers.notify(&TrackingEvent::TrackingDisabled);
    }

    fn evaluate(&mut self, position: GeoPoint) {
        let TrackingState::Enabled { on_path } = self.state else {
            return;
        };

        let result = self.polyline.closest_point(position, self.policy.metric);
        let within = result.distance <= self.policy.tolerance;
        let previous = self.last_result.replace(result);
        tracing::trace!(
            distance = result.distance,
            segment = result.segment_index,
            within,
            "Evaluated sample"
        );

        let event = if within != on_path {
            tracing::debug!(on_path = within, distance = result.distance, "On-path changed");
            self.state = TrackingState::Enabled { on_path: within };
            Some(TrackingEvent::OnPathChanged {
                on_path: within,
                closest: result,
            })
        } else if on_path && previous.is_none_or(|previous| previous.point != result.point) {
            Some(TrackingEvent::PositionChanged(result))
        } else {
            None
        };

        if let Some(event) = event {
            self.subscribers.notify(&event);
        }
    }

    /// Closest point to an arbitrary location, without touching tracker state
    pub fn closest_to(&self, point: GeoPoint) -> ClosestPointResult {
        self.polyline.closest_point(point, self.policy.metric)
    }

    /// Last computed projection, or `None` if nothing was evaluated yet
    #[inline]
    pub fn current_closest_point(&self) -> Option<ClosestPointResult> {
        self.last_result
    }

    #[inline]
    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, TrackingState::Enabled { .. })
    }

    pub fn is_on_path(&self) -> bool {
        self.state == TrackingState::Enabled { on_path: true }
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.policy.tolerance
    }

    #[inline]
    pub fn policy(&self) -> TrackingPolicy {
        self.policy
    }

    #[inline]
    pub fn polyline(&self) -> &Polyline {
        &self.polyline
    }

    pub fn last_sample(&self) -> Option<LocationSample> {
        self.last_sample
    }

    /// The path is drawn exactly as wide as the on-path band
    pub fn line_style(&self) -> LineStyle {
        LineStyle {
            width: self.policy.tolerance,
        }
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionHandle
    where
        F: Fn(&TrackingEvent) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(observer)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.subscribers.unsubscribe(handle)
    }

    /// Registry handle, usable from inside an observer to (un)subscribe during delivery
    pub fn subscribers(&self) -> Subscribers<TrackingEvent> {
        self.subscribers.clone()
    }
}
