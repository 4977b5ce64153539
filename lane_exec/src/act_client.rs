//! # Actuation Client
//!
//! This module provides the networking abstractions to publish velocity commands to the vehicle
//! interface. The channel is one-way: commands are published and never acknowledged, any
//! transport failure is the boundary's concern and the control loop takes no retry action.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    act::ActCmd,
    net::{zmq, MonitoredSocket, SocketOptions, MonitoredSocketError, NetParams}
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Actuation client
pub struct ActClient {
    socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ActClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the command: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the command: {0}")]
    SerializationError(serde_json::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActClient {

    /// Create a new instance of the actuation client.
    ///
    /// This function will not block until the vehicle interface connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ActClientError> {
        // Create the socket options
        let socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            connect_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        // Create the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            socket_options,
            &params.act_endpoint
        ).map_err(|e| ActClientError::SocketError(e))?;

        // Create self
        Ok(Self {
            socket
        })
    }

    /// Publish a command to the vehicle interface.
    pub fn send(&mut self, cmd: &ActCmd) -> Result<(), ActClientError> {
        // Serialize the command
        let cmd_str = serde_json::to_string(cmd)
            .map_err(|e| ActClientError::SerializationError(e))?;

        // Send the command
        self.socket.send(&cmd_str, 0)
            .map_err(|e| ActClientError::SendError(e))
    }
}
