//! Waytrack Replay
//!
//! Plays the role of the mobile host: it loads a path, feeds recorded fixes through the
//! proximity tracker (enabling it once fixes get accurate enough), keeps the detail viewport
//! centered on the user, and logs every marker update and tracking event.

mod gpx_source;
mod logging;
mod settings;

use anyhow::Result;
use clap::Parser;
use geo::{Coord, Rect};
use settings::Settings;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use waytrack_lib::{
    CoverageMarker, PixelRect, ProximityTracker, SyncConfig, TrackingEvent, TrackingPolicy,
    ViewportRole, ViewportSync,
};

fn pixel_frame(width: u32, height: u32) -> PixelRect {
    Rect::new(
        Coord { x: 0.0, y: 0.0 },
        Coord {
            x: f64::from(width),
            y: f64::from(height),
        },
    )
}

fn log_marker(context: &str, marker: &CoverageMarker) {
    tracing::info!(
        context,
        lat = marker.position.lat,
        lon = marker.position.lon,
        x = marker.bounds.min().x,
        y = marker.bounds.min().y,
        width = marker.bounds.width(),
        height = marker.bounds.height(),
        "Coverage marker"
    );
}

fn main() -> Result<()> {
    logging::setup_logging();
    let settings = Settings::parse();

    let polyline = gpx_source::load_polyline(&settings.path)?;
    let samples = gpx_source::load_samples(&settings.samples, settings.meters_per_hdop)?;

    // === Dual viewports, framed around the whole path ===
    let mut sync = ViewportSync::new(
        polyline.framing_region(settings.margin)?,
        pixel_frame(settings.overview_width, settings.overview_height),
        pixel_frame(settings.detail_width, settings.detail_height),
        SyncConfig {
            ratio: settings.ratio,
            projection: settings.projection(),
            ..SyncConfig::default()
        },
    )?;
    log_marker("initial", sync.marker());

    // === Tracker, shared the way a multi-threaded host would hold it ===
    let policy = TrackingPolicy {
        enabled: false,
        tolerance: settings.tolerance,
        metric: settings.metric(),
    };
    let tracker = Arc::new(Mutex::new(ProximityTracker::new(polyline, policy)?));
    let event_count = Arc::new(AtomicUsize::new(0));
    {
        let tracker = tracker.lock().unwrap_or_else(|e| e.into_inner());
        tracing::info!(
            length_m = tracker.polyline().length_meters(),
            line_width = tracker.line_style().width,
            "Path ready"
        );
        let event_count = event_count.clone();
        tracker.subscribe(move |event| {
            event_count.fetch_add(1, Ordering::Relaxed);
            match event {
                TrackingEvent::OnPathChanged { on_path, closest } => tracing::info!(
                    on_path,
                    distance = closest.distance,
                    segment = closest.segment_index,
                    "User is {}",
                    if *on_path { "on the path" } else { "off the path" }
                ),
                TrackingEvent::PositionChanged(closest) => tracing::debug!(
                    lat = closest.point.lat,
                    lon = closest.point.lon,
                    distance = closest.distance,
                    "Position on path changed"
                ),
                TrackingEvent::TrackingDisabled => tracing::info!("Tracking disabled"),
            }
        });
    }

    for sample in &samples {
        {
            let mut tracker = tracker.lock().unwrap_or_else(|e| e.into_inner());
            if sample.accuracy < settings.accuracy_gate {
                tracker.enable(settings.tolerance)?;
            }
            tracker.process_sample(*sample);
        }

        // Follow the user with the detail viewport, as a pan gesture would
        let followed = sync.detail().region().with_center(sample.position);
        sync.set_region(ViewportRole::Detail, followed);
        let marker = *sync.on_viewport_changed(ViewportRole::Detail);
        tracing::trace!(lat = marker.position.lat, lon = marker.position.lon, "Marker moved");
    }

    // Tapping the detail viewport pulls the overview in around the last position
    log_marker("zoomed out", sync.on_tap(ViewportRole::Detail, Coord { x: 0.0, y: 0.0 })?);

    let mut tracker = tracker.lock().unwrap_or_else(|e| e.into_inner());
    let closest = tracker.current_closest_point();
    tracker.disable();
    tracing::info!(
        samples = samples.len(),
        events = event_count.load(Ordering::Relaxed),
        final_distance = closest.map(|c| c.distance),
        "Replay finished"
    );

    Ok(())
}
