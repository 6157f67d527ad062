pub mod geo;
pub mod link;
pub mod nmea;
pub mod runner;

pub use link::VehicleLink;
pub use nmea::TelemetryFrame;
pub use runner::{CancellationToken, LiveRunner, SampleFeed};
