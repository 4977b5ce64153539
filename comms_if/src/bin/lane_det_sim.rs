//! Synthetic lane observation publisher
//!
//! Stands in for the lane detection pipeline so the full control loop can be exercised on the
//! bench. The robot is simulated weaving slowly across the lane centre, and the white channel
//! can be made to drop out periodically to exercise the fusion fallback.

use comms_if::{
    net::{zmq, MonitoredSocket, SocketOptions},
    obs::{LaneObservation, LaneSource}
};
use chrono::Utc;
use structopt::StructOpt;

/// Command line options for the simulator.
#[derive(Debug, StructOpt)]
#[structopt(name = "lane_det_sim", about = "Synthetic lane observation publisher")]
struct CliOptions {
    /// Endpoint to publish yellow-lane observations on
    #[structopt(long, default_value = "tcp://*:5560")]
    yellow_endpoint: String,

    /// Endpoint to publish white-lane observations on
    #[structopt(long, default_value = "tcp://*:5561")]
    white_endpoint: String,

    /// Period between observation pairs in milliseconds
    #[structopt(long, default_value = "50")]
    period_ms: u64,

    /// Drop the white detection on every nth pair (0 disables dropouts)
    #[structopt(long, default_value = "4")]
    white_dropout: u64
}

fn main() -> Result<(), Box<dyn std::error::Error>> {

    let cli_options = CliOptions::from_args();

    // Create zmq context
    let ctx = zmq::Context::new();

    // Create socket options
    let yellow_socket_options = SocketOptions {
        bind: true,
        block_on_first_connect: false,
        ..Default::default()
    };
    let white_socket_options = SocketOptions {
        bind: true,
        block_on_first_connect: false,
        ..Default::default()
    };

    // Create the sockets
    let yellow_socket = MonitoredSocket::new(
        &ctx,
        zmq::PUB,
        yellow_socket_options,
        &cli_options.yellow_endpoint
    )?;
    let white_socket = MonitoredSocket::new(
        &ctx,
        zmq::PUB,
        white_socket_options,
        &cli_options.white_endpoint
    )?;

    println!(
        "Publishing lane observations on {} (yellow) and {} (white)",
        cli_options.yellow_endpoint,
        cli_options.white_endpoint
    );

    // Publish observation pairs
    let mut num_pairs: u64 = 0;
    loop {
        // The robot weaves slowly across the lane centre
        let weave_m = 0.05 * (num_pairs as f64 * 0.05).sin();

        let yellow_obs = LaneObservation {
            source: LaneSource::Yellow,
            detected: true,
            lateral_distance_m: 0.10 + weave_m,
            forward_distance_m: 0.25,
            timestamp: Utc::now()
        };

        let white_detected = cli_options.white_dropout == 0
            || num_pairs % cli_options.white_dropout != 0;
        let white_obs = LaneObservation {
            source: LaneSource::White,
            detected: white_detected,
            lateral_distance_m: -0.10 + weave_m,
            forward_distance_m: 0.25,
            timestamp: Utc::now()
        };

        // Send the observations
        for (socket, obs) in vec![(&yellow_socket, yellow_obs), (&white_socket, white_obs)] {
            let obs_str = serde_json::to_string(&obs)?;

            match socket.send(&obs_str, 0) {
                Ok(_) => (),
                Err(e) => println!("Failed to send observation: {}", e)
            }
        }

        num_pairs += 1;

        std::thread::sleep(std::time::Duration::from_millis(cli_options.period_ms));
    }
}
