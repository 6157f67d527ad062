pub mod runner;

pub use runner::{SimulationReport, SimulationRunner};
