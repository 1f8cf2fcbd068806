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

//! A small authoritative DNS responder.
//!
//! The library turns a raw DNS query into a wire-format response using
//! statically loaded zone data. The pieces, from the bottom up:
//!
//! * [`name`] encodes and decodes domain names;
//! * [`message`] reads and writes the fixed header and the question;
//! * [`zone`] holds the in-memory zone table and finds the zone and
//!   records that answer a question;
//! * [`rr`] serializes resolved records, including the SOA record
//!   used in the authority section; and
//! * [`server`] ties everything together in [`Server::build_message`].
//!
//! Network I/O, zone-file discovery on disk and forwarding to upstream
//! resolvers are left to the caller (see the `zonednsd` binary).
//!
//! [`Server::build_message`]: server::Server::build_message

pub mod class;
pub mod message;
pub mod name;
pub mod rr;
pub mod server;
mod util;
pub mod zone;
