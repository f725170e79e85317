use clap::Parser;
use std::path::PathBuf;
use waytrack_lib::{DistanceMetric, Projection};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Waytrack Replay - Replays recorded GPX fixes against a GPX path
pub struct Settings {
    /// GPX file whose track points define the path to follow
    #[clap(short, long, value_name = "FILE")]
    pub path: PathBuf,

    /// GPX file whose track points are replayed as location samples
    #[clap(short, long, value_name = "FILE")]
    pub samples: PathBuf,

    /// On-path tolerance in meters (also the drawn path width)
    #[clap(short, long, default_value = "4.0")]
    pub tolerance: f64,

    /// Tracking is enabled once a fix is more accurate than this, in meters
    #[clap(long, default_value = "20.0")]
    pub accuracy_gate: f64,

    /// Meters of horizontal error per unit of HDOP when estimating a fix's accuracy
    #[clap(long, default_value = "5.0")]
    pub meters_per_hdop: f64,

    /// Overview span divided by detail span
    #[clap(short, long, default_value = "10.0")]
    pub ratio: f64,

    /// Proportional margin around the path for the initial overview region
    #[clap(long, default_value = "1.25")]
    pub margin: f64,

    /// Overview viewport width in pixels
    #[clap(long, default_value = "375")]
    pub overview_width: u32,

    /// Overview viewport height in pixels
    #[clap(long, default_value = "400")]
    pub overview_height: u32,

    /// Detail viewport width in pixels
    #[clap(long, default_value = "375")]
    pub detail_width: u32,

    /// Detail viewport height in pixels
    #[clap(long, default_value = "400")]
    pub detail_height: u32,

    /// Measure distances in degree space instead of meters
    #[clap(long, default_value = "false")]
    pub planar: bool,

    /// Lay viewports out linearly in latitude/longitude instead of Web Mercator
    #[clap(long, default_value = "false")]
    pub linear_projection: bool,
}

impl Settings {
    pub fn metric(&self) -> DistanceMetric {
        if self.planar {
            DistanceMetric::Planar
        } else {
            DistanceMetric::Geodesic
        }
    }

    pub fn projection(&self) -> Projection {
        if self.linear_projection {
            Projection::Linear
        } else {
            Projection::WebMercator
        }
    }
}
