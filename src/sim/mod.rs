//! Simulator contract and the batch-shaped facade over simulator instances.

pub mod action;
pub mod error;
pub mod state;

mod batch;
mod graph_sim;
mod nested;
mod simulator;

pub use action::{PrimitiveAction, SimpleAction};
pub use batch::SimulatorBatch;
pub use error::SimError;
pub use graph_sim::{GraphSimulator, GraphSimulatorFactory};
pub use nested::{Batch, Nesting};
pub use simulator::{Simulator, SimulatorFactory};
pub use state::{CameraConfig, NavigableLocation, Pose, SimState, SimulatorSettings};
