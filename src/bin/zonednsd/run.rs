// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the `run` command (i.e., running the server).

use std::fmt::Write;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{debug, error, info, warn};
use signal_hook::consts::signal::{SIGINT, SIGTERM};

use zonedns::server::Server;
use zonedns::zone::Resolver;

use crate::args::RunArgs;
use crate::config;
use crate::forward::Forwarder;
use crate::zones;

/// The size of the buffer that queries are received into. Longer
/// queries are truncated.
const RECEIVE_BUFFER_SIZE: usize = 1024;

/// How long a receive may block before the loop checks whether it
/// should shut down.
const RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs the server.
pub fn run(args: RunArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    if let Err(e) = try_running(args) {
        let mut message = String::from("Failed to run:");
        for (i, cause) in e.chain().enumerate() {
            let _ = write!(message, "\n[{}] {}", i + 1, cause);
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
    info!("Exiting with success.");
}

fn try_running(run_args: RunArgs) -> Result<()> {
    info!(
        "zonedns daemon v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    // Get the configuration, either from the file system or from the
    // command line arguments, as appropriate.
    let config = if let Some(ref config_path) = run_args.config {
        info!("Loading the configuration from {}.", config_path.display());
        config::load_from_path(config_path).context("failed to load the configuration")?
    } else {
        info!("Loading the configuration from the command line.");
        config::load_from_args(run_args)
    };

    // Bind before loading zones so that we fail fast.
    let socket = UdpSocket::bind(config.bind)
        .with_context(|| format!("failed to bind a UDP socket to {}", config.bind))?;
    socket
        .set_read_timeout(Some(RECEIVE_TIMEOUT))
        .context("failed to set the socket's read timeout")?;

    info!("Loading zones from {}.", config.zones.display());
    let zones = zones::load(&config.zones).context("failed to load zones")?;
    let server = Server::new(Resolver::new(zones.map(Arc::new)));

    let forwarder = if config.forwarding.enabled {
        Some(Forwarder::from_config(&config.forwarding))
    } else {
        None
    };

    let shutting_down = set_up_signal_handling().context("failed to set up signal handling")?;

    info!("Set-up is complete; listening on {}.", config.bind);
    serve(&socket, &server, forwarder.as_ref(), &shutting_down)
        .context("failed to receive a query")?;
    info!("Received a termination signal; shutting down.");
    Ok(())
}

/// Registers SIGINT and SIGTERM handlers that set the returned flag.
fn set_up_signal_handling() -> Result<Arc<AtomicBool>> {
    let shutting_down = Arc::new(AtomicBool::new(false));
    for sig in &[SIGINT, SIGTERM] {
        // A second signal during shutdown exits immediately.
        signal_hook::flag::register_conditional_shutdown(*sig, 1, shutting_down.clone())?;
        signal_hook::flag::register(*sig, shutting_down.clone())?;
    }
    Ok(shutting_down)
}

/// Answers queries received on `socket`, one at a time, until
/// `shutting_down` is set.
fn serve(
    socket: &UdpSocket,
    server: &Server,
    forwarder: Option<&Forwarder>,
    shutting_down: &AtomicBool,
) -> io::Result<()> {
    let mut buf = [0; RECEIVE_BUFFER_SIZE];

    loop {
        if shutting_down.load(Ordering::Relaxed) {
            return Ok(());
        }

        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        if let Some(octets) = respond(&buf[..len], peer, server, forwarder) {
            // A failed send doesn't stop the server.
            if let Err(e) = socket.send_to(&octets, peer) {
                error!("Failed to send a response to {}: {}", peer, e);
            }
        }
    }
}

/// Produces the octets to send back for `query`, or [`None`] if the
/// query should be dropped.
fn respond(
    query: &[u8],
    peer: SocketAddr,
    server: &Server,
    forwarder: Option<&Forwarder>,
) -> Option<Vec<u8>> {
    let response = match server.build_message(query) {
        Ok(response) => response,
        Err(e) => {
            debug!("Dropping a malformed query from {}: {}", peer, e);
            return None;
        }
    };
    info!("Query from {} for {}.", peer, response.question.qname);

    if let Some(forwarder) = forwarder.filter(|_| response.should_forward()) {
        match forwarder.forward(query) {
            Ok(forwarded) => {
                match forwarded.rcode {
                    Some(rcode) => info!(
                        "Responding to {} with {} from upstream {}.",
                        peer,
                        rcode,
                        forwarder.upstream(),
                    ),
                    None => info!(
                        "Responding to {} with an undecodable response from upstream {}.",
                        peer,
                        forwarder.upstream(),
                    ),
                }
                return Some(forwarded.octets);
            }
            Err(e) => warn!(
                "Failed to forward the query for {} to {}: {}",
                response.question.qname,
                forwarder.upstream(),
                e,
            ),
        }
    }

    info!("Responding to {} with {}.", peer, response.rcode);
    Some(response.octets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use zonedns::message::{Header, Rcode};
    use zonedns::zone::{RecordEntry, Zone, ZoneTable};

    use zonedns::rr::Type;

    // ID 0x1234, RD set, one question for "www.example.com" IN A.
    const WWW_QUERY: &[u8] = b"\x12\x34\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
                               \x03www\x07example\x03com\x00\x00\x01\x00\x01";

    // ID 0x1234, RD set, one question for "nowhere" IN A.
    const NOWHERE_QUERY: &[u8] =
        b"\x12\x34\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\x07nowhere\x00\x00\x01\x00\x01";

    fn peer() -> SocketAddr {
        "127.0.0.1:5353".parse().unwrap()
    }

    fn server() -> Server {
        let mut zone = Zone::new("example.com");
        zone.insert_records(Type::A, vec![RecordEntry::new("@", 300_u32, "1.2.3.4")]);
        let table: ZoneTable = [zone].into_iter().collect();
        Server::new(Resolver::new(Some(Arc::new(table))))
    }

    fn rcode(octets: &[u8]) -> Rcode {
        Header::decode(octets).unwrap().flags.rcode
    }

    #[test]
    fn malformed_queries_are_dropped() {
        assert!(respond(b"\x12\x34", peer(), &server(), None).is_none());
    }

    #[test]
    fn local_answers_are_sent() {
        let octets = respond(WWW_QUERY, peer(), &server(), None).unwrap();
        assert_eq!(rcode(&octets), Rcode::NoError);
    }

    #[test]
    fn unknown_names_without_forwarder_get_nxdomain() {
        let octets = respond(NOWHERE_QUERY, peer(), &server(), None).unwrap();
        assert_eq!(rcode(&octets), Rcode::NameError);
    }

    #[test]
    fn unknown_names_are_forwarded() {
        let upstream = UdpSocket::bind("127.0.0.1:0").unwrap();
        let forwarder = Forwarder::new(upstream.local_addr().unwrap(), Duration::from_secs(5));
        let handle = thread::spawn(move || {
            let mut buf = [0; 512];
            let (len, src) = upstream.recv_from(&mut buf).unwrap();
            let mut response = buf[..len].to_vec();
            response[2] |= 0x80;
            response[3] = 0x80;
            upstream.send_to(&response, src).unwrap();
            response
        });

        let octets = respond(NOWHERE_QUERY, peer(), &server(), Some(&forwarder)).unwrap();
        let relayed = handle.join().unwrap();
        assert_eq!(octets, relayed);
        assert_eq!(rcode(&octets), Rcode::NoError);
    }

    #[test]
    fn failed_forwarding_falls_back_to_local_response() {
        let upstream = UdpSocket::bind("127.0.0.1:0").unwrap();
        let forwarder =
            Forwarder::new(upstream.local_addr().unwrap(), Duration::from_millis(100));
        let octets = respond(NOWHERE_QUERY, peer(), &server(), Some(&forwarder)).unwrap();
        assert_eq!(rcode(&octets), Rcode::NameError);
    }

    #[test]
    fn serve_stops_when_flagged() {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.set_read_timeout(Some(Duration::from_millis(10))).unwrap();
        let shutting_down = AtomicBool::new(true);
        serve(&socket, &server(), None, &shutting_down).unwrap();
    }
}
