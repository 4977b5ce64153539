//! Main lane-following executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Observation acquisition from the two lane channels
//!         - Per observation, in arrival order:
//!             - Lane control processing (fusion, error, regulator, speed)
//!             - Session manager processing (budget, clamping)
//!             - Command publication
//!         - Cycle management
//!
//! Observations from the two channels may arrive in any interleaving, or not at all. Each one
//! is processed to completion before the next is considered, so all controller state is
//! accessed from this single thread only. The loop ends when the session manager signals that
//! the duration budget is spent, after which the session end signal is published and the
//! executable shuts down.
//!
//! # Modules
//!
//! All modules (e.g. `lane_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use lane_lib::{
    act_client::ActClient,
    data_store::DataStore,
    lane_ctrl,
    obs_client::ObsClient,
    session_mgr
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;
use color_eyre::{Report, eyre::WrapErr};

// Internal
use comms_if::{
    act::ActCmd,
    net::NetParams,
    obs::{LaneObservation, LaneSource}
};
use util::{
    archive::Archived,
    module::State,
    logger::{logger_init, LevelFilter},
    session::Session
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.05;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options for the executable.
///
/// The gains here override the values loaded from the parameter file, so tuning runs don't
/// need a file edit between attempts.
#[derive(Debug, StructOpt)]
#[structopt(name = "lane_exec", about = "Lane following controller executable")]
struct CliOptions {
    /// Override the proportional gain from the parameter file
    #[structopt(long)]
    kp: Option<f64>,

    /// Override the integral gain from the parameter file
    #[structopt(long)]
    ki: Option<f64>,

    /// Override the derivative gain from the parameter file
    #[structopt(long)]
    kd: Option<f64>
}

/// Summary of the run, saved into the session directory at shutdown.
#[derive(Debug, Serialize)]
struct RunSummary {
    num_cycles: u128,
    num_obs: u64,
    num_cmds: u64,
    final_phase: session_mgr::SessionPhase,
    wall_duration_s: f64
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "lane_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Lane Following Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- COMMAND LINE OPTIONS ----

    let cli_options = CliOptions::from_args();

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load(
        "net.toml"
    ).wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.lane_ctrl.init("lane_ctrl.toml", &session)
        .wrap_err("Failed to initialise LaneCtrl")?;
    ds.lane_ctrl.apply_gain_overrides(cli_options.kp, cli_options.ki, cli_options.kd);
    info!("LaneCtrl init complete");

    ds.session_mgr.init("session_mgr.toml", &session)
        .wrap_err("Failed to initialise SessionMgr")?;
    info!("SessionMgr init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let obs_client = ObsClient::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise the ObsClient")?;
    info!("ObsClient initialised");

    let mut act_client = ActClient::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise the ActClient")?;
    info!("ActClient initialised");

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let exec_start = Instant::now();
    let mut end_of_session = false;

    while !end_of_session {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start();

        // ---- OBSERVATION ACQUISITION ----

        // Drain both channels into arrival order. Alternating between the channels stops one
        // estimator starving the other within a cycle.
        let mut observations: Vec<LaneObservation> = Vec::new();

        loop {
            let mut got_any = false;

            for source in &[LaneSource::Yellow, LaneSource::White] {
                match obs_client.recv_observation(*source) {
                    Ok(Some(obs)) => {
                        observations.push(obs);
                        got_any = true;
                    },
                    Ok(None) => (),
                    Err(e) => warn!("Could not recieve {:?} observation: {}", source, e)
                }
            }

            if !got_any {
                break;
            }
        }

        // ---- CONTROL PROCESSING ----

        // Each observation runs through the full fusion → regulation → session pipeline before
        // the next is considered.
        for obs in observations.drain(..) {
            ds.num_obs += 1;
            let rx_time = Instant::now();

            // LaneCtrl processing
            let lane_ctrl_output = match ds.lane_ctrl.proc(
                &lane_ctrl::InputData { obs, rx_time }
            ) {
                Ok((o, r)) => {
                    ds.lane_ctrl_output = o;
                    ds.lane_ctrl_status_rpt = r;
                    o
                },
                Err(e) => {
                    warn!("Error during LaneCtrl processing: {}", e);
                    continue
                }
            };

            if let Err(e) = ds.lane_ctrl.write() {
                warn!("Could not archive LaneCtrl report: {}", e);
            }

            // A tick with no demand publishes nothing, the vehicle holds the last command.
            let dem = match lane_ctrl_output {
                Some(d) => d,
                None => continue
            };

            // SessionMgr processing
            let session_mgr_output = match ds.session_mgr.proc(
                &session_mgr::InputData { dem, now: rx_time }
            ) {
                Ok((o, r)) => {
                    ds.session_mgr_output = o;
                    ds.session_mgr_status_rpt = r;
                    o
                },
                Err(e) => {
                    warn!("Error during SessionMgr processing: {}", e);
                    continue
                }
            };

            if let Err(e) = ds.session_mgr.write() {
                warn!("Could not archive SessionMgr report: {}", e);
            }

            // Publish the command
            if let Some(cmd) = session_mgr_output.cmd {
                match act_client.send(&cmd) {
                    Ok(_) => ds.num_cmds += 1,
                    Err(e) => warn!("Could not publish command: {}", e)
                }
            }

            // On budget expiry publish the end-of-session signal and leave the loop. Nothing
            // may be published after this point, so any still-pending observations are simply
            // dropped.
            if session_mgr_output.end_of_session {
                match act_client.send(&ActCmd::SessionEnd) {
                    Ok(_) => info!("Session end signalled"),
                    Err(e) => warn!("Could not publish the session end signal: {}", e)
                }

                end_of_session = true;
                break;
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64()
                        - Duration::from_secs_f64(CYCLE_PERIOD_S).as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    // Save the run summary into the session directory
    session.save("run_summary.json", RunSummary {
        num_cycles: ds.num_cycles,
        num_obs: ds.num_obs,
        num_cmds: ds.num_cmds,
        final_phase: ds.session_mgr.phase(),
        wall_duration_s: (Instant::now() - exec_start).as_secs_f64()
    });

    info!("End of execution");

    session.exit();

    Ok(())
}
