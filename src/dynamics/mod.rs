pub mod kinematics;
pub mod model;
pub mod state;

pub use model::VehicleDynamicsModel;
pub use state::{wrap_pi, VehicleState};
