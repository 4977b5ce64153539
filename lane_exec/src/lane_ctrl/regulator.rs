//! # Lane regulator module
//!
//! This module provides the PID regulator used by LaneCtrl, including the lane error
//! calculation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;

// Internal
use comms_if::obs::{LaneObservation, LaneSource};

use super::Params;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Limit on the integral accumulation, in either sign.
///
/// A sustained one-sided error or a long sensor dropout must not wind the integral term up
/// beyond this bound.
const INTEGRAL_LIMIT: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID regulator over the lane lateral error.
#[derive(Debug, Serialize, Clone, Default)]
pub struct PidRegulator {
    /// Regulator mode
    mode: ControlMode,

    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: f64,

    /// The integral accumulation
    integral: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The terms a regulator applies to its error input.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Proportional control only
    P,

    /// Proportional and derivative control
    Pd,

    /// Proportional, integral and derivative control
    Pid
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ControlMode {
    fn default() -> Self {
        ControlMode::P
    }
}

impl ControlMode {
    /// Parse a mode string from the parameter file.
    ///
    /// Unknown mode strings fall back to P control, which is always safe to run, and raise a
    /// warning.
    pub fn from_param(mode: &str) -> Self {
        match mode {
            "p" => ControlMode::P,
            "pd" => ControlMode::Pd,
            "pid" => ControlMode::Pid,
            _ => {
                warn!("Unknown control mode {:?}, using P control", mode);
                ControlMode::P
            }
        }
    }
}

impl PidRegulator {

    /// Create a new regulator with the given mode and gains.
    pub fn new(mode: ControlMode, k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            mode,
            k_p, k_i, k_d,
            prev_error: 0f64,
            integral: 0f64
        }
    }

    /// Create a new regulator from the lane control parameters.
    pub fn from_params(params: &Params) -> Self {
        Self::new(
            ControlMode::from_param(&params.mode),
            params.k_p, params.k_i, params.k_d
        )
    }

    /// Get the value of the regulator for the given error.
    ///
    /// `dt_s` is the time since the previous control evaluation, as measured by the caller on
    /// its shared clock. Non-positive values (first sample, duplicate timestamps, clock steps)
    /// disable the derivative and integral updates for this call, leaving the proportional
    /// contribution only. The call always produces a usable output.
    pub fn get(&mut self, error: f64, dt_s: f64) -> f64 {
        match self.mode {
            ControlMode::P => self.get_p(error),
            ControlMode::Pd => self.get_pd(error, dt_s),
            ControlMode::Pid => self.get_pid(error, dt_s)
        }
    }

    /// The current integral accumulation, for monitoring.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Proportional control.
    fn get_p(&self, error: f64) -> f64 {
        self.k_p * error
    }

    /// Proportional-derivative control.
    fn get_pd(&mut self, error: f64, dt_s: f64) -> f64 {
        let deriv = match dt_s > 0f64 {
            true => (error - self.prev_error) / dt_s,
            false => 0f64
        };

        // The error bookkeeping happens even when the derivative is disabled, so the next valid
        // dt sees the latest error.
        self.prev_error = error;

        self.k_p * error + self.k_d * deriv
    }

    /// Full PID control.
    fn get_pid(&mut self, error: f64, dt_s: f64) -> f64 {
        let deriv = match dt_s > 0f64 {
            true => {
                // Accumulate and bound the integral
                self.integral += error * dt_s;
                self.integral = self.integral.clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);

                (error - self.prev_error) / dt_s
            },
            false => 0f64
        };

        self.prev_error = error;

        self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the control error for a detected observation.
///
/// The error is the signed difference between the measured lateral distance and the target
/// offset held from that marking. Shall only be called for observations with `detected` set,
/// undetected observations carry no usable distance.
pub fn lane_error(obs: &LaneObservation, params: &Params) -> f64 {
    let target_offset_m = match obs.source {
        LaneSource::Yellow => params.yellow_target_offset_m,
        LaneSource::White => params.white_target_offset_m
    };

    obs.lateral_distance_m - target_offset_m
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_p_control() {
        let mut reg = PidRegulator::new(ControlMode::P, 27.0, 0.1, 1.0);

        // An error of 0.05 m with the default gain gives 1.35 rad/s, within the actuation
        // limit of 5 rad/s
        assert_eq!(reg.get(0.05, 0.1), 27.0 * 0.05);

        // P control must not touch the regulator state
        assert_eq!(reg.integral, 0.0);
        assert_eq!(reg.prev_error, 0.0);
    }

    #[test]
    fn test_pid_integral_accumulation() {
        // Zero P and D gains isolate the integral term
        let mut reg = PidRegulator::new(ControlMode::Pid, 0.0, 0.1, 0.0);

        reg.get(0.1, 0.5);
        let out = reg.get(0.1, 0.5);

        // Two ticks of 0.1 error over 0.5 s each accumulate 0.1 of integral
        assert!((reg.integral - 0.1).abs() < 1e-12);
        assert!((out - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_anti_windup() {
        let mut reg = PidRegulator::new(ControlMode::Pid, 1.0, 1.0, 0.0);

        // A huge sustained error must leave the integral at the bound
        for _ in 0..100 {
            reg.get(50.0, 1.0);
            assert!(reg.integral <= 1.0);
        }
        assert_eq!(reg.integral, 1.0);

        // And the same on the negative side
        for _ in 0..100 {
            reg.get(-50.0, 1.0);
            assert!(reg.integral >= -1.0);
        }
        assert_eq!(reg.integral, -1.0);
    }

    #[test]
    fn test_non_positive_dt() {
        // With no prior accumulation a zero dt reduces the output to exactly the P term
        let mut reg = PidRegulator::new(ControlMode::Pid, 27.0, 0.1, 1.0);
        assert_eq!(reg.get(0.4, 0.0), 27.0 * 0.4);
        assert_eq!(reg.integral, 0.0);
        // The error is still recorded even though the derivative was disabled
        assert_eq!(reg.prev_error, 0.4);

        // With prior accumulation only the derivative contribution vanishes, the integral is
        // held at its last value rather than cleared
        reg.get(0.2, 0.5);
        let integral = reg.integral;
        assert!(integral > 0.0);

        assert_eq!(reg.get(0.6, -1.0), 27.0 * 0.6 + 0.1 * integral);
        assert_eq!(reg.integral, integral);
        assert_eq!(reg.prev_error, 0.6);

        // PD behaves the same way
        let mut reg = PidRegulator::new(ControlMode::Pd, 27.0, 0.0, 1.0);
        assert_eq!(reg.get(0.3, 0.0), 27.0 * 0.3);
        assert_eq!(reg.prev_error, 0.3);
    }

    #[test]
    fn test_pd_derivative() {
        let mut reg = PidRegulator::new(ControlMode::Pd, 0.0, 0.0, 2.0);

        reg.get(0.1, 0.5);

        // Error rose by 0.1 over 0.5 s, so the derivative is 0.2
        let out = reg.get(0.2, 0.5);
        assert!((out - 2.0 * 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_mode_fallback() {
        assert_eq!(ControlMode::from_param("p"), ControlMode::P);
        assert_eq!(ControlMode::from_param("pd"), ControlMode::Pd);
        assert_eq!(ControlMode::from_param("pid"), ControlMode::Pid);

        // Anything else falls back to P control
        assert_eq!(ControlMode::from_param("pdi"), ControlMode::P);
        assert_eq!(ControlMode::from_param(""), ControlMode::P);
    }

    #[test]
    fn test_lane_error_sign_conventions() {
        let params = Params {
            mode: "p".into(),
            yellow_target_offset_m: 0.10,
            white_target_offset_m: -0.10,
            ..Default::default()
        };

        let yellow_obs = LaneObservation {
            source: LaneSource::Yellow,
            detected: true,
            lateral_distance_m: 0.15,
            forward_distance_m: 0.3,
            timestamp: Utc::now()
        };
        assert!((lane_error(&yellow_obs, &params) - 0.05).abs() < 1e-12);

        let white_obs = LaneObservation {
            source: LaneSource::White,
            detected: true,
            lateral_distance_m: -0.15,
            forward_distance_m: 0.3,
            timestamp: Utc::now()
        };
        assert!((lane_error(&white_obs, &params) + 0.05).abs() < 1e-12);
    }
}
