//! Lane control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for lane control
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Params {

    /// Control mode, one of "p", "pd" or "pid".
    ///
    /// Unrecognised modes fall back to "p".
    pub mode: String,

    /// Steering proportional gain
    pub k_p: f64,

    /// Steering integral gain
    pub k_i: f64,

    /// Steering derivative gain
    pub k_d: f64,

    /// Target lateral offset to hold from the yellow marking.
    ///
    /// Units: meters. The yellow marking is normally on the robot's left, so
    /// a positive offset keeps the robot slightly to its right.
    pub yellow_target_offset_m: f64,

    /// Target lateral offset to hold from the white marking.
    ///
    /// Units: meters. The white marking is normally on the robot's right, so
    /// a negative offset keeps the robot slightly to its left.
    pub white_target_offset_m: f64,

    /// Minimum forward speed demand
    ///
    /// Units: meters/second
    pub min_speed_ms: f64,

    /// Maximum forward speed demand
    ///
    /// Units: meters/second
    pub max_speed_ms: f64
}
