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

//! Implements forwarding of queries to an upstream resolver.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use zonedns::message::{Header, Rcode};

use crate::config::ForwardingConfig;

/// The size of the buffer that upstream responses are received into.
/// Longer responses are truncated.
const RECEIVE_BUFFER_SIZE: usize = 1024;

/// Relays raw queries to an upstream resolver over UDP.
#[derive(Clone, Debug)]
pub struct Forwarder {
    upstream: SocketAddr,
    timeout: Duration,
}

/// A response relayed from the upstream resolver.
#[derive(Clone, Debug)]
pub struct Forwarded {
    /// The upstream's response, exactly as received.
    pub octets: Vec<u8>,

    /// The RCODE of the upstream's response, if its header could be
    /// decoded.
    pub rcode: Option<Rcode>,
}

impl Forwarder {
    /// Creates a `Forwarder` for `upstream`. Upstream responses are
    /// waited for at most `timeout`, which must not be zero.
    pub fn new(upstream: SocketAddr, timeout: Duration) -> Self {
        Self { upstream, timeout }
    }

    pub fn from_config(config: &ForwardingConfig) -> Self {
        Self::new(config.upstream, config.timeout())
    }

    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }

    /// Sends `query` to the upstream resolver and waits for its
    /// response. A fresh socket is used for each query.
    pub fn forward(&self, query: &[u8]) -> io::Result<Forwarded> {
        let local: SocketAddr = match self.upstream {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(self.upstream)?;
        socket.set_read_timeout(Some(self.timeout))?;
        socket.send(query)?;

        let mut buf = [0; RECEIVE_BUFFER_SIZE];
        let len = socket.recv(&mut buf)?;
        let octets = buf[..len].to_vec();
        let rcode = Header::decode(&octets).ok().map(|h| h.flags.rcode);
        Ok(Forwarded { octets, rcode })
    }
}
