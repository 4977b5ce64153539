//! # Observation Client
//!
//! This module provides the networking abstractions to recieve lane observations from the
//! detection pipeline. Each lane color arrives on its own channel and either channel may stay
//! silent for any length of time, so all receives are non-blocking.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, SocketOptions, MonitoredSocketError, NetParams},
    obs::{LaneObservation, LaneSource}
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Observation client
pub struct ObsClient {
    yellow_socket: MonitoredSocket,

    white_socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ObsClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not recieve a message from the channel: {0}")]
    RecvError(zmq::Error),

    #[error("Could not parse the recieved observation: {0}")]
    ObsParseError(serde_json::Error),

    #[error("The channel sent a message which was not valid UTF-8")]
    NonUtf8Observation
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ObsClient {

    /// Create a new instance of the observation client.
    ///
    /// This function will not block waiting for the detection pipeline to come up.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ObsClientError> {
        // Create the socket options
        let yellow_socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            linger: 1,
            recv_timeout: 0,
            ..Default::default()
        };
        let white_socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            linger: 1,
            recv_timeout: 0,
            ..Default::default()
        };

        // Create the sockets
        let yellow_socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            yellow_socket_options,
            &params.yellow_obs_endpoint
        ).map_err(|e| ObsClientError::SocketError(e))?;
        let white_socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            white_socket_options,
            &params.white_obs_endpoint
        ).map_err(|e| ObsClientError::SocketError(e))?;

        // Subscribe to everything on both channels
        yellow_socket.set_subscribe(b"").map_err(|e| ObsClientError::SocketError(
            MonitoredSocketError::SocketOptionError("set_subscribe".into(), e)
        ))?;
        white_socket.set_subscribe(b"").map_err(|e| ObsClientError::SocketError(
            MonitoredSocketError::SocketOptionError("set_subscribe".into(), e)
        ))?;

        // Create self
        Ok(Self {
            yellow_socket,
            white_socket
        })
    }

    /// Recieve a single observation from the given source's channel.
    ///
    /// The protocol here is to call recv_observation in a loop until `Ok(None)` is returned,
    /// indicating that there are no more pending observations on the channel right now. The
    /// pipeline may of course send another one at any time.
    pub fn recv_observation(
        &self,
        source: LaneSource
    ) -> Result<Option<LaneObservation>, ObsClientError> {
        let socket = match source {
            LaneSource::Yellow => &self.yellow_socket,
            LaneSource::White => &self.white_socket
        };

        // Attempt to read a string from the socket
        let obs_str = match socket.recv_string(zmq::DONTWAIT) {
            // Valid message
            Ok(Ok(s)) => s,
            // Non UTF-8 message
            Ok(Err(_)) => return Err(ObsClientError::NonUtf8Observation),
            // No message pending
            Err(zmq::Error::EAGAIN) => return Ok(None),
            // Recieve error
            Err(e) => return Err(ObsClientError::RecvError(e))
        };

        // Parse the observation
        serde_json::from_str(&obs_str)
            .map_err(|e| ObsClientError::ObsParseError(e))
            .map(|o| Some(o))
    }
}
