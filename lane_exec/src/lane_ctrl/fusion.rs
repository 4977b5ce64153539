//! # Sensor fusion policy
//!
//! This module arbitrates between the two lane estimators. The yellow marking is authoritative
//! whenever it is detected and the white marking only drives control when the yellow is not
//! seen, so at most one reading ever feeds the regulator on a tick. Making the decision a value
//! rather than control flow keeps the priority rule testable on its own.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use comms_if::obs::LaneSource;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The error source driving control for a tick.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ActiveSource {
    /// Neither marking is detected. No control evaluation happens on such a tick, the last
    /// published command is implicitly held.
    None,

    /// The yellow marking drives control.
    Yellow,

    /// The white marking drives control.
    White
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ActiveSource {
    fn default() -> Self {
        ActiveSource::None
    }
}

impl ActiveSource {

    /// Apply the fixed priority rule to the current detection flags.
    pub fn select(yellow_detected: bool, white_detected: bool) -> Self {
        if yellow_detected {
            ActiveSource::Yellow
        }
        else if white_detected {
            ActiveSource::White
        }
        else {
            ActiveSource::None
        }
    }

    /// The lane source backing this decision, if any.
    pub fn source(&self) -> Option<LaneSource> {
        match self {
            ActiveSource::Yellow => Some(LaneSource::Yellow),
            ActiveSource::White => Some(LaneSource::White),
            ActiveSource::None => None
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_priority_rule() {
        // Yellow wins whenever it is detected, including simultaneous detections
        assert_eq!(ActiveSource::select(true, true), ActiveSource::Yellow);
        assert_eq!(ActiveSource::select(true, false), ActiveSource::Yellow);

        // White only drives when yellow is lost
        assert_eq!(ActiveSource::select(false, true), ActiveSource::White);

        // No detection, no evaluation
        assert_eq!(ActiveSource::select(false, false), ActiveSource::None);
    }

    #[test]
    fn test_source() {
        assert_eq!(ActiveSource::Yellow.source(), Some(LaneSource::Yellow));
        assert_eq!(ActiveSource::White.source(), Some(LaneSource::White));
        assert_eq!(ActiveSource::None.source(), None);
    }
}
