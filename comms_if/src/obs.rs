//! # Lane Observation Messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single lane-marking distance estimate from the detection pipeline.
///
/// One of these is sent per sensor per processed frame, whether or not the
/// marking was actually found. When `detected` is false the distance fields
/// carry no meaning and must not be used.
#[derive(Serialize, Deserialize, Debug, Copy, Clone)]
pub struct LaneObservation {
    /// The marking which produced this observation.
    pub source: LaneSource,

    /// True if the marking was found in the frame.
    pub detected: bool,

    /// Signed lateral distance to the marking.
    ///
    /// Units: meters
    ///
    /// Follows the homography frame's y-axis from the robot's point of view,
    /// so positive distances are to the left of the robot and negative
    /// distances to the right.
    pub lateral_distance_m: f64,

    /// Distance to the marking along the robot's forward axis.
    ///
    /// Units: meters
    pub forward_distance_m: f64,

    /// Time at which the detection pipeline produced this estimate.
    pub timestamp: DateTime<Utc>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Source of a lane observation, one per painted marking color.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum LaneSource {
    /// The yellow centre-line marking, normally to the robot's left.
    Yellow,

    /// The white boundary marking, normally to the robot's right.
    White,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_obs_json_format() {
        let obs = LaneObservation {
            source: LaneSource::Yellow,
            detected: true,
            lateral_distance_m: 0.15,
            forward_distance_m: 0.25,
            timestamp: Utc::now(),
        };

        // The wire format must keep the field names, the detection pipeline
        // on the other side of the channel builds these by name.
        let json = serde_json::to_string(&obs).unwrap();
        assert!(json.contains("\"source\":\"Yellow\""));
        assert!(json.contains("lateral_distance_m"));

        let parsed: LaneObservation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.source, LaneSource::Yellow);
        assert!(parsed.detected);
        assert!((parsed.lateral_distance_m - 0.15).abs() < 1e-12);
    }
}
