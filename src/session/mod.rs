//! Interaction session — state machine plus the controller that drives it.

pub mod controller;
pub mod state;

pub use controller::{ControllerEvent, InteractionController};
pub use state::{new_shared_state, Phase, SessionState, SharedState};
