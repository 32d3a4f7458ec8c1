//! Parameter store and simulation session state.

pub mod session;
pub mod store;

pub use session::{SessionState, SimulationSession};
pub use store::ParameterStore;
