//! GPX-backed collaborators: the path definition and the location source

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use waytrack_lib::{GeoPoint, LocationSample, Polyline};

fn read_gpx(path: &Path) -> Result<gpx::Gpx> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    gpx::read(BufReader::new(file)).with_context(|| format!("parsing {}", path.display()))
}

/// All track points of a GPX document, in file order
fn track_points(gpx: &gpx::Gpx) -> impl Iterator<Item = &gpx::Waypoint> {
    gpx.tracks
        .iter()
        .flat_map(|track| &track.segments)
        .flat_map(|segment| &segment.points)
}

/// Load every track point of `path` as one continuous polyline
pub fn load_polyline(path: &Path) -> Result<Polyline> {
    let gpx = read_gpx(path)?;
    let points: Vec<GeoPoint> = track_points(&gpx)
        .map(|waypoint| GeoPoint::from(waypoint.point()))
        .collect();
    tracing::info!(file = %path.display(), points = points.len(), "Loaded path");
    Polyline::new(points).with_context(|| format!("building path from {}", path.display()))
}

/// Load the track points of `path` as location samples
///
/// Accuracy is estimated from HDOP; fixes without it are treated as exact.
pub fn load_samples(path: &Path, meters_per_hdop: f64) -> Result<Vec<LocationSample>> {
    let gpx = read_gpx(path)?;
    let samples: Vec<LocationSample> = track_points(&gpx)
        .map(|waypoint| {
            let accuracy = waypoint.hdop.map_or(0.0, |hdop| hdop * meters_per_hdop);
            LocationSample::new(GeoPoint::from(waypoint.point()), accuracy)
        })
        .collect();
    tracing::info!(file = %path.display(), samples = samples.len(), "Loaded samples");
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpx::{Gpx, Track, TrackSegment, Waypoint};

    fn create_test_gpx() -> Gpx {
        let mut gpx = Gpx::default();
        let mut track = Track::default();
        let mut segment = TrackSegment::default();
        for i in 0..3 {
            let mut waypoint = Waypoint::new(geo::Point::new(-0.1278 + i as f64 * 0.0001, 51.5074));
            waypoint.hdop = Some(2.0);
            segment.points.push(waypoint);
        }
        track.segments.push(segment);
        gpx.tracks.push(track);
        gpx
    }

    #[test]
    fn test_track_points_order() {
        let gpx = create_test_gpx();
        let lons: Vec<f64> = track_points(&gpx).map(|w| w.point().x()).collect();
        assert_eq!(lons.len(), 3);
        assert!(lons.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_polyline(Path::new("/nonexistent/path.gpx")).is_err());
    }
}
