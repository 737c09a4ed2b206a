//! Simple network server test
//!
//! Accepts arm telecommands and replies `Pong` to pings, `Ok` to anything else that parses.

use comms_if::{
    net::{MonitoredSocket, SocketOptions},
    tc::{ArmTc, ArmTcResponse},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create the context for zmq
    let ctx = zmq::Context::new();

    // Set the socket options
    let socket_options = SocketOptions {
        bind: true,
        block_on_first_connect: false,
        ..Default::default()
    };

    // Create the socket
    let socket = MonitoredSocket::new(&ctx, zmq::REP, socket_options, "tcp://*:5000")?;

    println!("Server running on port 5000");

    // Respond to client requests
    loop {
        // Wait for the client to send us a message
        let msg = socket.recv_msg(0)?;

        let response = match msg.as_str() {
            // If the client sent a valid message
            Some(r) => {
                println!("Received {:?}", r);

                match ArmTc::from_json(r) {
                    Ok(ArmTc::Ping) => ArmTcResponse::Pong,
                    Ok(_) => ArmTcResponse::Ok,
                    Err(e) => ArmTcResponse::Invalid(format!("{}", e)),
                }
            }
            None => {
                println!("Received no data");
                ArmTcResponse::Invalid("Empty message".into())
            }
        };

        // The REP socket must send exactly one reply per request
        socket.send(serde_json::to_string(&response)?.as_str(), 0)?;
    }
}
