//! # Session manager module
//!
//! The session manager owns the operating episode of the controller. It governs the
//! idle → moving → stopped phase transitions, enforces the wall-clock duration budget, and
//! clamps every demand before it reaches the actuation boundary. The budget is a hard safety
//! and test-duration bound, independent of control quality: once it is spent the session stops
//! for good and only zero-velocity commands can come out.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::Params;
pub use state::*;
