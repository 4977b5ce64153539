//! Lane control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;
use log::debug;
use serde::Serialize;

// Internal
use comms_if::obs::{LaneObservation, LaneSource};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session
};

use super::{lane_error, speed_demand_ms, ActiveSource, Params, PidRegulator};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lane control module state
#[derive(Default)]
pub struct LaneCtrl {

    pub(crate) params: Params,

    /// The steering regulator
    regulator: PidRegulator,

    /// Latest observation recieved from the yellow estimator
    yellow_obs: Option<LaneObservation>,

    /// Latest observation recieved from the white estimator
    white_obs: Option<LaneObservation>,

    /// Instant of the previous control evaluation.
    ///
    /// This clock is shared between both sources so regulator state stays continuous when
    /// control switches from one marking to the other.
    last_eval_time: Option<Instant>,

    pub(crate) report: StatusReport,
    arch_report: Archiver
}

/// Input data to lane control: a single freshly arrived observation.
pub struct InputData {
    /// The observation triggering this tick
    pub obs: LaneObservation,

    /// Monotonic receipt time of the observation
    pub rx_time: Instant
}

/// A steering and speed demand for the session manager to publish.
#[derive(Clone, Copy, Serialize, Debug)]
pub struct VelDem {
    /// Angular velocity demand. Not yet limited, the session manager applies the actuation
    /// limit before publication.
    ///
    /// Units: radians/second
    pub omega_rads: f64,

    /// Forward speed demand, or `None` to let the session manager use its default.
    ///
    /// Units: meters/second
    pub speed_ms: Option<f64>
}

/// Status report for LaneCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// The source driving control this tick
    pub active_source: ActiveSource,

    /// True if this tick produced a demand
    pub evaluated: bool,

    /// The control error for this tick
    ///
    /// Units: meters
    pub error_m: f64,

    /// Time since the previous control evaluation
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Raw angular velocity demand
    ///
    /// Units: radians/second
    pub omega_dem_rads: f64,

    /// Forward speed demand
    ///
    /// Units: meters/second
    pub speed_dem_ms: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LaneCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LaneCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Could not create the status report archive: {0}")]
    ArchiveInitError(util::archive::Error)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for LaneCtrl {
    type InitData = &'static str;
    type InitError = LaneCtrlError;

    type InputData = InputData;
    type OutputData = Option<VelDem>;
    type StatusReport = StatusReport;
    type ProcError = LaneCtrlError;

    /// Initialise the LaneCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(LaneCtrlError::ParamLoadError(e))
        };

        // Initialise the regulator. An unknown mode string in the parameters is resolved here,
        // falling back to P control with a warning.
        self.regulator = PidRegulator::from_params(&self.params);

        // Initialise the archiver
        self.arch_report = Archiver::from_path(
            session, "lane_ctrl/status_report.csv"
        ).map_err(|e| LaneCtrlError::ArchiveInitError(e))?;

        Ok(())
    }

    /// Process a single observation tick.
    ///
    /// Processing involves:
    ///  1. Updating the arriving source's slot (an undetected observation only clears the
    ///     detection flag and never drives control).
    ///  2. Selecting the active source under the fixed fusion priority.
    ///  3. Computing the control error, steering demand and speed demand for the selected
    ///     reading.
    ///
    /// A tick with no active source produces no demand, so the previously published command is
    /// implicitly held.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        // Update the slot for the arriving source
        match input_data.obs.source {
            LaneSource::Yellow => self.yellow_obs = Some(input_data.obs),
            LaneSource::White => self.white_obs = Some(input_data.obs)
        }

        // An undetected arrival carries no usable distance, it must never reach the error
        // calculation
        if !input_data.obs.detected {
            return Ok((None, self.report))
        }

        // Fusion decision for this tick
        let active = ActiveSource::select(
            self.yellow_obs.map(|o| o.detected).unwrap_or(false),
            self.white_obs.map(|o| o.detected).unwrap_or(false)
        );
        self.report.active_source = active;

        // Get the driving observation. The selection above guarantees the slot is filled, but
        // validate rather than unwrap so a policy change can't panic the control loop.
        let obs = match active {
            ActiveSource::Yellow => match self.yellow_obs {
                Some(o) => o,
                None => return Ok((None, self.report))
            },
            ActiveSource::White => match self.white_obs {
                Some(o) => o,
                None => return Ok((None, self.report))
            },
            ActiveSource::None => return Ok((None, self.report))
        };

        // Calculate the control error
        let error_m = lane_error(&obs, &self.params);

        // Calculate dt on the shared clock. The first evaluation has no previous instant and
        // runs with the derivative and integral updates disabled. Instants are monotonic so dt
        // cannot go negative, a stepped clock shows up as a zero duration.
        let dt_s = match self.last_eval_time {
            Some(t0) => input_data.rx_time
                .checked_duration_since(t0)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0f64),
            None => 0f64
        };
        self.last_eval_time = Some(input_data.rx_time);

        // Pass the error through the regulator and modulate the speed
        let omega_dem_rads = self.regulator.get(error_m, dt_s);
        let speed_dem_ms = speed_demand_ms(error_m, &self.params);

        debug!(
            "LaneCtrl: source {:?}, error {:.4} m, dt {:.4} s, omega {:.4} rad/s, speed {:.3} m/s",
            active, error_m, dt_s, omega_dem_rads, speed_dem_ms
        );

        self.report.evaluated = true;
        self.report.error_m = error_m;
        self.report.dt_s = dt_s;
        self.report.omega_dem_rads = omega_dem_rads;
        self.report.speed_dem_ms = speed_dem_ms;

        Ok((
            Some(VelDem {
                omega_rads: omega_dem_rads,
                speed_ms: Some(speed_dem_ms)
            }),
            self.report
        ))
    }
}

impl Archived for LaneCtrl {
    fn write(&mut self) -> Result<(), util::archive::Error> {
        self.arch_report.serialise(self.report)
    }
}

impl LaneCtrl {

    /// Apply command line gain overrides on top of the loaded parameters.
    ///
    /// Must be called after `init` and before the first `proc`, as it rebuilds the regulator
    /// and discards any accumulated state.
    pub fn apply_gain_overrides(
        &mut self,
        k_p: Option<f64>,
        k_i: Option<f64>,
        k_d: Option<f64>
    ) {
        if k_p.is_none() && k_i.is_none() && k_d.is_none() {
            return
        }

        if let Some(k_p) = k_p {
            self.params.k_p = k_p;
        }
        if let Some(k_i) = k_i {
            self.params.k_i = k_i;
        }
        if let Some(k_d) = k_d {
            self.params.k_d = k_d;
        }

        self.regulator = PidRegulator::from_params(&self.params);

        log::info!(
            "Gain overrides applied: k_p = {}, k_i = {}, k_d = {}",
            self.params.k_p, self.params.k_i, self.params.k_d
        );
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::time::Duration;
    use chrono::Utc;

    use super::*;

    /// Build a LaneCtrl with the given mode, bypassing the parameter file.
    fn lane_ctrl(mode: &str) -> LaneCtrl {
        let params = Params {
            mode: mode.into(),
            k_p: 27.0,
            k_i: 0.1,
            k_d: 1.0,
            yellow_target_offset_m: 0.10,
            white_target_offset_m: -0.10,
            min_speed_ms: 0.1,
            max_speed_ms: 0.3
        };

        LaneCtrl {
            regulator: PidRegulator::from_params(&params),
            params,
            ..Default::default()
        }
    }

    fn obs(source: LaneSource, detected: bool, lateral_distance_m: f64) -> LaneObservation {
        LaneObservation {
            source,
            detected,
            lateral_distance_m,
            forward_distance_m: 0.25,
            timestamp: Utc::now()
        }
    }

    #[test]
    fn test_yellow_drives_control() {
        let mut lc = lane_ctrl("p");
        let t0 = Instant::now();

        let (dem, report) = lc.proc(&InputData {
            obs: obs(LaneSource::Yellow, true, 0.15),
            rx_time: t0
        }).unwrap();

        // 0.15 m measured against the 0.10 m offset gives a 0.05 m error and a 1.35 rad/s
        // demand under the default proportional gain
        let dem = dem.unwrap();
        assert_eq!(report.active_source, ActiveSource::Yellow);
        assert!((report.error_m - 0.05).abs() < 1e-12);
        assert!((dem.omega_rads - 1.35).abs() < 1e-12);

        // Speed comes from the modulator, not the default
        let speed = dem.speed_ms.unwrap();
        assert!(speed >= lc.params.min_speed_ms && speed <= lc.params.max_speed_ms);
    }

    #[test]
    fn test_white_drives_when_yellow_lost() {
        let mut lc = lane_ctrl("p");
        let t0 = Instant::now();

        // Yellow reports undetected, which must not produce a demand on its own
        let (dem, _) = lc.proc(&InputData {
            obs: obs(LaneSource::Yellow, false, 99.0),
            rx_time: t0
        }).unwrap();
        assert!(dem.is_none());

        // White then drives control with its own offset convention
        let (dem, report) = lc.proc(&InputData {
            obs: obs(LaneSource::White, true, -0.15),
            rx_time: t0 + Duration::from_millis(50)
        }).unwrap();

        assert_eq!(report.active_source, ActiveSource::White);
        assert!((report.error_m + 0.05).abs() < 1e-12);
        assert!((dem.unwrap().omega_rads + 1.35).abs() < 1e-12);
    }

    #[test]
    fn test_fusion_mutual_exclusion() {
        let mut lc = lane_ctrl("p");
        let t0 = Instant::now();

        // Yellow is detected at 0.15 m
        lc.proc(&InputData {
            obs: obs(LaneSource::Yellow, true, 0.15),
            rx_time: t0
        }).unwrap();

        // A wild white reading arrives while yellow is still detected. Yellow must keep
        // driving and the white value must have no effect on the output.
        let (dem, report) = lc.proc(&InputData {
            obs: obs(LaneSource::White, true, -37.0),
            rx_time: t0 + Duration::from_millis(50)
        }).unwrap();

        assert_eq!(report.active_source, ActiveSource::Yellow);
        assert!((report.error_m - 0.05).abs() < 1e-12);
        assert!((dem.unwrap().omega_rads - 1.35).abs() < 1e-12);
    }

    #[test]
    fn test_no_detection_no_mutation() {
        let mut lc = lane_ctrl("pid");
        let t0 = Instant::now();

        // Both estimators report undetected
        for (source, dt_ms) in vec![(LaneSource::Yellow, 0u64), (LaneSource::White, 10u64)] {
            let (dem, report) = lc.proc(&InputData {
                obs: obs(source, false, 1.0),
                rx_time: t0 + Duration::from_millis(dt_ms)
            }).unwrap();

            assert!(dem.is_none());
            assert!(!report.evaluated);
        }

        // Neither the regulator nor the shared clock may have moved
        assert_eq!(lc.regulator.integral(), 0.0);
        assert!(lc.last_eval_time.is_none());
    }

    #[test]
    fn test_shared_clock_across_sources() {
        let mut lc = lane_ctrl("pid");
        let t0 = Instant::now();

        // First evaluation comes from yellow with no previous instant, so no integral yet
        lc.proc(&InputData {
            obs: obs(LaneSource::Yellow, true, 0.20),
            rx_time: t0
        }).unwrap();
        assert_eq!(lc.regulator.integral(), 0.0);

        // Yellow drops out
        lc.proc(&InputData {
            obs: obs(LaneSource::Yellow, false, 0.0),
            rx_time: t0 + Duration::from_millis(100)
        }).unwrap();

        // White takes over half a second after the yellow evaluation. The dt is measured
        // against the yellow tick, the clock does not reset on the source switch.
        let (_, report) = lc.proc(&InputData {
            obs: obs(LaneSource::White, true, -0.05),
            rx_time: t0 + Duration::from_millis(500)
        }).unwrap();

        assert!((report.dt_s - 0.5).abs() < 1e-9);
        assert!((lc.regulator.integral() - 0.05 * 0.5).abs() < 1e-9);
    }
}
