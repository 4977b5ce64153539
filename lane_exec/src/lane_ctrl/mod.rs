//! # Lane control module
//!
//! Lane control is responsible for keeping the robot laterally positioned against the painted
//! lane markings. Two independent estimators report the distance to the yellow and the white
//! marking. A fixed-priority fusion policy selects the reading which drives control for each
//! tick, the selected reading is turned into a signed error against the per-marking target
//! offset, and the error is passed through a PID regulator to produce a steering demand. The
//! magnitude of the error also modulates the forward speed demand, trading progress for
//! stability when the robot is far off the lane.
//!
//! The module does not publish anything itself, its demands are handed to the session manager
//! which enforces the output limits and the session duration budget.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod fusion;
pub mod params;
pub mod regulator;
pub mod speed;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use fusion::*;
pub use params::Params;
pub use regulator::*;
pub use speed::*;
pub use state::*;
