//! Actuation command echo
//!
//! Subscribes to the actuation channel and prints every command, standing in for the vehicle
//! interface during bench tests. Exits once the controller signals the end of its session.

use comms_if::{
    act::ActCmd,
    net::{zmq, MonitoredSocket, SocketOptions}
};
use structopt::StructOpt;

/// Command line options for the echo.
#[derive(Debug, StructOpt)]
#[structopt(name = "act_echo", about = "Actuation command echo")]
struct CliOptions {
    /// Endpoint to read actuation commands from
    #[structopt(long, default_value = "tcp://localhost:5562")]
    act_endpoint: String
}

fn main() -> Result<(), Box<dyn std::error::Error>> {

    let cli_options = CliOptions::from_args();

    // Create context
    let ctx = zmq::Context::new();

    // Create socket options
    let socket_options = SocketOptions {
        block_on_first_connect: false,
        ..Default::default()
    };

    // Create socket
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::SUB,
        socket_options,
        &cli_options.act_endpoint
    )?;

    // Subscribe to everything on the channel
    socket.set_subscribe(b"")?;

    println!("Listening for actuation commands on {}", cli_options.act_endpoint);

    // Recieve commands from the controller
    loop {
        let msg = socket.recv_msg(0)?;

        let cmd: ActCmd = match msg.as_str() {
            Some(s) => match serde_json::from_str(s) {
                Ok(c) => c,
                Err(e) => {
                    println!("Could not parse command: {}", e);
                    continue;
                }
            },
            None => {
                println!("Got a non-UTF-8 message");
                continue;
            }
        };

        println!("Got command: {:?}", cmd);

        if let ActCmd::SessionEnd = cmd {
            println!("Session ended, exiting");
            break;
        }
    }

    Ok(())
}
