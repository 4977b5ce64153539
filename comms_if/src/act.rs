//! # Actuation Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command to the vehicle actuation interface.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum ActCmd {
    /// A velocity demand to be executed by the vehicle.
    #[structopt(name = "drive")]
    Drive {
        /// The forward speed of the vehicle in meters/second.
        ///
        /// Positive speeds are "forwards", negative speeds are "backwards"
        speed_ms: f64,

        /// The angular velocity of the vehicle in radians/second.
        ///
        /// Follows the right hand grip rule about the vehicle's Z+ (upwards) axis, so that a
        /// positive angular velocity turns the vehicle to the left, and a negative angular
        /// velocity turns it to the right.
        omega_rads: f64
    },

    /// The controller's session is over and no further commands will follow.
    ///
    /// This is distinct from a zero-velocity `Drive` so the vehicle interface can tell "parked
    /// at zero" apart from "controller finished".
    #[structopt(name = "end")]
    SessionEnd
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActCmd {
    /// A zero-velocity drive command, bringing the vehicle to a full stop.
    pub fn zero() -> Self {
        ActCmd::Drive {
            speed_ms: 0.0,
            omega_rads: 0.0
        }
    }
}
