//! # Speed modulation
//!
//! Maps the magnitude of the control error onto a forward speed demand. The further the robot
//! is off the lane the slower it moves, trading progress for stability while the steering
//! regulator corrects.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use util::maths::{clamp, lin_map};

use super::Params;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The speed factor commanded at zero error.
const MAX_SPEED_FACTOR: f64 = 0.6;

/// Cap on the error magnitude's contribution to the speed factor. Errors beyond this all
/// command the same minimum factor.
const ERROR_FACTOR_LIMIT: f64 = 0.5;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the forward speed demand for the given control error.
///
/// The factor shrinks linearly with the error magnitude and is clamped so the demand always
/// lies within the `[min_speed_ms, max_speed_ms]` parameter bounds.
pub fn speed_demand_ms(error: f64, params: &Params) -> f64 {
    let speed_factor = clamp(
        &(MAX_SPEED_FACTOR - error.abs().min(ERROR_FACTOR_LIMIT)),
        &0f64,
        &MAX_SPEED_FACTOR
    );

    lin_map(
        (0f64, 1f64),
        (params.min_speed_ms, params.max_speed_ms),
        speed_factor
    )
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_params() -> Params {
        Params {
            min_speed_ms: 0.1,
            max_speed_ms: 0.3,
            ..Default::default()
        }
    }

    #[test]
    fn test_speed_bounds() {
        let params = test_params();

        // Perfectly on the lane, top of the factor range
        let best = speed_demand_ms(0.0, &params);
        assert!((best - (0.1 + 0.2 * 0.6)).abs() < 1e-12);

        // Huge errors saturate at the bottom of the factor range, never below min_speed
        let worst = speed_demand_ms(10.0, &params);
        assert!((worst - (0.1 + 0.2 * 0.1)).abs() < 1e-12);
        assert!(worst >= params.min_speed_ms);
        assert!(best <= params.max_speed_ms);
    }

    #[test]
    fn test_speed_monotonicity() {
        let params = test_params();

        // Speed never increases as the error magnitude grows
        let mut prev = speed_demand_ms(0.0, &params);
        for i in 1..100 {
            let error = i as f64 * 0.01;
            let speed = speed_demand_ms(error, &params);
            assert!(speed <= prev);
            assert!(speed >= params.min_speed_ms && speed <= params.max_speed_ms);

            // The sign of the error makes no difference
            assert_eq!(speed, speed_demand_ms(-error, &params));

            prev = speed;
        }
    }
}
