//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuation command definitions consumed by the vehicle interface
pub mod act;

/// Lane observation definitions produced by the detection pipeline
pub mod obs;

/// Network module
pub mod net;
