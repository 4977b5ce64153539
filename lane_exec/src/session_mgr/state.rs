//! Session manager state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;
use log::info;
use serde::Serialize;

// Internal
use comms_if::act::ActCmd;
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session
};

use crate::lane_ctrl::VelDem;

use super::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Session manager module state
#[derive(Default)]
pub struct SessionMgr {

    pub(crate) params: Params,

    /// Executing phase
    phase: SessionPhase,

    /// Instant the first command was issued, starting the budget clock
    start_time: Option<Instant>,

    pub(crate) report: StatusReport,
    arch_report: Archiver
}

/// Input data to the session manager: a demand to be published.
pub struct InputData {
    /// The demand to publish
    pub dem: VelDem,

    /// Evaluation instant, measured against the session budget
    pub now: Instant
}

/// Output of session manager processing.
#[derive(Clone, Copy, Serialize, Debug, Default)]
pub struct OutputData {
    /// The command to publish
    pub cmd: Option<ActCmd>,

    /// Raised exactly once, on the tick the budget expires. The boundary must follow the
    /// zero-velocity command with the session end signal and stop publishing.
    pub end_of_session: bool
}

/// Status report for session manager processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// The session phase after this evaluation
    pub phase: SessionPhase,

    /// Session time elapsed at this evaluation
    ///
    /// Units: seconds
    pub elapsed_s: f64,

    /// True if the angular velocity demand was clamped
    pub omega_limited: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The phases of a session.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No command has been issued yet, the budget clock is not running.
    Idle,

    /// Commands are flowing and the budget clock is running.
    Moving,

    /// The budget is spent. Terminal, the session never leaves this phase.
    Stopped
}

/// Possible errors that can occur during SessionMgr operation.
#[derive(Debug, thiserror::Error)]
pub enum SessionMgrError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Could not create the status report archive: {0}")]
    ArchiveInitError(util::archive::Error)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Idle
    }
}

impl State for SessionMgr {
    type InitData = &'static str;
    type InitError = SessionMgrError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = SessionMgrError;

    /// Initialise the SessionMgr module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(SessionMgrError::ParamLoadError(e))
        };

        // Initialise the archiver
        self.arch_report = Archiver::from_path(
            session, "session_mgr/status_report.csv"
        ).map_err(|e| SessionMgrError::ArchiveInitError(e))?;

        Ok(())
    }

    /// Process a single demand.
    ///
    /// Processing involves:
    ///  1. Checking the budget clock, stopping the session for good once it expires.
    ///  2. Starting the budget clock if this is the first demand.
    ///  3. Clamping the angular velocity demand into the actuation limit.
    ///  4. Defaulting the speed demand when the requester left it unspecified.
    ///
    /// Once stopped, every call keeps producing the zero-velocity command whatever the demand,
    /// so anything reaching the boundary after expiry is safe by construction.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        // Elapsed time only accumulates once the first command has started the clock
        let elapsed_s = match self.start_time {
            Some(t0) => input_data.now
                .checked_duration_since(t0)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0f64),
            None => 0f64
        };
        self.report.elapsed_s = elapsed_s;

        // Already stopped: the phase is terminal and the output stays at zero
        if self.phase == SessionPhase::Stopped {
            self.report.phase = self.phase;

            return Ok((
                OutputData {
                    cmd: Some(ActCmd::zero()),
                    end_of_session: false
                },
                self.report
            ))
        }

        // Budget expiry stops the session for good. The end_of_session flag is raised on this
        // tick only.
        if elapsed_s >= self.params.session_duration_s {
            info!(
                "Session duration budget ({} s) spent, stopping",
                self.params.session_duration_s
            );

            self.phase = SessionPhase::Stopped;
            self.report.phase = self.phase;

            return Ok((
                OutputData {
                    cmd: Some(ActCmd::zero()),
                    end_of_session: true
                },
                self.report
            ))
        }

        // The first command starts the budget clock
        if self.phase == SessionPhase::Idle {
            info!("First command issued, session moving");

            self.phase = SessionPhase::Moving;
            self.start_time = Some(input_data.now);
        }
        self.report.phase = self.phase;

        // Clamp the steering demand to the actuation limit
        let omega_rads = input_data.dem.omega_rads
            .clamp(-self.params.max_omega_rads, self.params.max_omega_rads);
        if omega_rads != input_data.dem.omega_rads {
            self.report.omega_limited = true;
        }

        // Default the speed demand
        let speed_ms = match input_data.dem.speed_ms {
            Some(s) => s,
            None => self.params.max_speed_ms
        };

        Ok((
            OutputData {
                cmd: Some(ActCmd::Drive { speed_ms, omega_rads }),
                end_of_session: false
            },
            self.report
        ))
    }
}

impl Archived for SessionMgr {
    fn write(&mut self) -> Result<(), util::archive::Error> {
        self.arch_report.serialise(self.report)
    }
}

impl SessionMgr {
    /// The current session phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    /// Build a SessionMgr with the default bench parameters, bypassing the parameter file.
    fn session_mgr() -> SessionMgr {
        SessionMgr {
            params: Params {
                session_duration_s: 10.0,
                max_omega_rads: 5.0,
                max_speed_ms: 0.3
            },
            ..Default::default()
        }
    }

    fn dem(omega_rads: f64, speed_ms: Option<f64>) -> VelDem {
        VelDem { omega_rads, speed_ms }
    }

    #[test]
    fn test_first_command_starts_session() {
        let mut sm = session_mgr();
        let t0 = Instant::now();

        assert_eq!(sm.phase(), SessionPhase::Idle);

        let (out, report) = sm.proc(&InputData {
            dem: dem(1.0, Some(0.2)),
            now: t0
        }).unwrap();

        assert_eq!(sm.phase(), SessionPhase::Moving);
        assert_eq!(report.phase, SessionPhase::Moving);
        assert_eq!(out.cmd, Some(ActCmd::Drive { speed_ms: 0.2, omega_rads: 1.0 }));
        assert!(!out.end_of_session);
    }

    #[test]
    fn test_omega_clamping() {
        let mut sm = session_mgr();
        let t0 = Instant::now();

        // Over the positive limit
        let (out, report) = sm.proc(&InputData {
            dem: dem(7.5, Some(0.2)),
            now: t0
        }).unwrap();
        assert_eq!(out.cmd, Some(ActCmd::Drive { speed_ms: 0.2, omega_rads: 5.0 }));
        assert!(report.omega_limited);

        // Over the negative limit
        let (out, report) = sm.proc(&InputData {
            dem: dem(-100.0, Some(0.2)),
            now: t0 + Duration::from_millis(50)
        }).unwrap();
        assert_eq!(out.cmd, Some(ActCmd::Drive { speed_ms: 0.2, omega_rads: -5.0 }));
        assert!(report.omega_limited);

        // Within the limit, untouched
        let (out, report) = sm.proc(&InputData {
            dem: dem(1.35, Some(0.2)),
            now: t0 + Duration::from_millis(100)
        }).unwrap();
        assert_eq!(out.cmd, Some(ActCmd::Drive { speed_ms: 0.2, omega_rads: 1.35 }));
        assert!(!report.omega_limited);
    }

    #[test]
    fn test_speed_defaulting() {
        let mut sm = session_mgr();

        let (out, _) = sm.proc(&InputData {
            dem: dem(0.5, None),
            now: Instant::now()
        }).unwrap();

        // An unspecified speed gets the configured maximum
        assert_eq!(out.cmd, Some(ActCmd::Drive { speed_ms: 0.3, omega_rads: 0.5 }));
    }

    #[test]
    fn test_budget_expiry() {
        let mut sm = session_mgr();
        let t0 = Instant::now();

        // Start the session
        sm.proc(&InputData { dem: dem(1.0, Some(0.2)), now: t0 }).unwrap();

        // Just inside the budget, still moving
        let (out, _) = sm.proc(&InputData {
            dem: dem(1.0, Some(0.2)),
            now: t0 + Duration::from_secs_f64(9.99)
        }).unwrap();
        assert!(!out.end_of_session);
        assert_eq!(sm.phase(), SessionPhase::Moving);

        // Exactly on the budget, the session stops whatever the demand was
        let (out, report) = sm.proc(&InputData {
            dem: dem(4.2, Some(0.25)),
            now: t0 + Duration::from_secs_f64(10.0)
        }).unwrap();
        assert_eq!(out.cmd, Some(ActCmd::zero()));
        assert!(out.end_of_session);
        assert_eq!(report.phase, SessionPhase::Stopped);
        assert_eq!(sm.phase(), SessionPhase::Stopped);
    }

    #[test]
    fn test_stopped_is_terminal() {
        let mut sm = session_mgr();
        let t0 = Instant::now();

        sm.proc(&InputData { dem: dem(1.0, None), now: t0 }).unwrap();
        sm.proc(&InputData {
            dem: dem(1.0, None),
            now: t0 + Duration::from_secs(10)
        }).unwrap();
        assert_eq!(sm.phase(), SessionPhase::Stopped);

        // Every later call keeps producing the zero command, never re-enters moving, and the
        // end flag is never raised again
        for i in 0..5u64 {
            let (out, report) = sm.proc(&InputData {
                dem: dem(3.0, Some(0.2)),
                now: t0 + Duration::from_secs(11 + i)
            }).unwrap();

            assert_eq!(out.cmd, Some(ActCmd::zero()));
            assert!(!out.end_of_session);
            assert_eq!(report.phase, SessionPhase::Stopped);
            assert_eq!(sm.phase(), SessionPhase::Stopped);
        }
    }

    #[test]
    fn test_zero_budget_stops_before_moving() {
        let mut sm = session_mgr();
        sm.params.session_duration_s = 0.0;

        let (out, _) = sm.proc(&InputData {
            dem: dem(1.0, None),
            now: Instant::now()
        }).unwrap();

        // A zero budget never lets the session move at all
        assert_eq!(out.cmd, Some(ActCmd::zero()));
        assert!(out.end_of_session);
        assert_eq!(sm.phase(), SessionPhase::Stopped);
    }
}
