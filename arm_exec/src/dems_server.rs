//! # Demands Server Module
//!
//! This module abstracts over the networking side of the arm executable. The server accepts
//! connections from clients such as the command line interface, allowing telecommands to be
//! received and responses returned.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
    tc::{ArmTc, ArmTcResponse},
};
use log::warn;

use crate::params::ArmExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the arm executable.
///
/// The server accepts connections from clients, allowing telecommands to be received and
/// responses returned. The underlying socket is a REP socket, so every accepted request must be
/// answered with exactly one response before the next can be read.
pub struct DemsServer {
    /// REP socket which accepts telecommands from clients
    tc_socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`DemsServer`]
#[derive(thiserror::Error, Debug)]
pub enum DemsServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send data to the client: {0}")]
    SendError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DemsServer {
    /// Create a new instance of the demands server.
    ///
    /// This function will not wait for a connection from a client before returning.
    pub fn new(params: &ArmExecParams) -> Result<Self, DemsServerError> {
        // Create the zmq context
        let ctx = zmq::Context::new();

        // Create the socket options. The recv timeout is kept well below the cycle period so
        // that an idle socket doesn't eat into the cycle budget.
        let tc_socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        // Create the socket
        let tc_socket = MonitoredSocket::new(&ctx, zmq::REP, tc_socket_options, &params.demands_endpoint)?;

        Ok(Self { tc_socket })
    }

    /// Retrieve a telecommand from a client.
    ///
    /// The user MUST call [`DemsServer::send_response`] at the earliest opportunity in order to
    /// notify the client.
    ///
    /// `None` is returned if no request arrived within the socket's receive timeout. Requests
    /// which cannot be parsed are answered immediately with an invalid response, and also return
    /// `None`.
    pub fn get_tc(&mut self) -> Option<ArmTc> {
        // Read from the socket
        let msg = self.tc_socket.recv_msg(0);

        match msg {
            Ok(m) => match ArmTc::from_json(m.as_str().unwrap_or("")) {
                Ok(tc) => Some(tc),
                Err(e) => {
                    warn!("Could not parse TC: {}", e);

                    // The request was accepted so the REP socket owes a reply
                    if let Err(e) = self.send_response(&ArmTcResponse::Invalid(format!("{}", e))) {
                        warn!("Could not send invalid TC response: {}", e);
                    }

                    None
                }
            },
            Err(_e) => None,
        }
    }

    /// Send a response to the client based on the received telecommand.
    pub fn send_response(&mut self, response: &ArmTcResponse) -> Result<(), DemsServerError> {
        // Serialize response
        let resp_str =
            serde_json::to_string(response).expect("Response serialization failed. This should not happen");

        // Send response
        match self.tc_socket.send(&resp_str, 0) {
            Ok(_) => Ok(()),
            Err(e) => Err(DemsServerError::SendError(e)),
        }
    }
}

impl From<MonitoredSocketError> for DemsServerError {
    fn from(e: MonitoredSocketError) -> Self {
        DemsServerError::SocketError(e)
    }
}
