//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::{lane_ctrl, session_mgr};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    // LaneCtrl
    pub lane_ctrl: lane_ctrl::LaneCtrl,
    pub lane_ctrl_output: Option<lane_ctrl::VelDem>,
    pub lane_ctrl_status_rpt: lane_ctrl::StatusReport,

    // SessionMgr
    pub session_mgr: session_mgr::SessionMgr,
    pub session_mgr_output: session_mgr::OutputData,
    pub session_mgr_status_rpt: session_mgr::StatusReport,

    // Monitoring counters
    /// Number of observations recieved over the run
    pub num_obs: u64,

    /// Number of commands published over the run
    pub num_cmds: u64,

    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle.
    pub fn cycle_start(&mut self) {
        self.lane_ctrl_output = None;
        self.lane_ctrl_status_rpt = lane_ctrl::StatusReport::default();
        self.session_mgr_output = session_mgr::OutputData::default();
        self.session_mgr_status_rpt = session_mgr::StatusReport::default();
    }
}
