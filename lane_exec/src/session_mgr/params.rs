//! Session manager parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the session manager
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Params {

    /// Wall-clock operating budget for the session. Once this much time has elapsed since the
    /// first command the session stops for good.
    ///
    /// Units: seconds
    pub session_duration_s: f64,

    /// Limit on the angular velocity demand, in either sign.
    ///
    /// Units: radians/second
    pub max_omega_rads: f64,

    /// The speed used for demands which do not specify one. Also the greatest speed that will
    /// ever be commanded.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64
}
