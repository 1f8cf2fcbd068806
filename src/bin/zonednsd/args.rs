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

//! Implements command-line argument parsing.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// A small authoritative DNS server for JSON zone files
#[derive(Debug, Parser)]
#[command(author, version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the server
    Run(RunArgs),
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Set the configuration file to use
    #[arg(
        long,
        conflicts_with_all = ["bind", "zones", "upstream", "no_forward"],
        value_name = "FILE"
    )]
    pub config: Option<PathBuf>,

    /// Set the server bind IP address and port
    #[arg(long, value_name = "IP:PORT")]
    pub bind: Option<SocketAddr>,

    /// Set the directory to load *.zone files from
    #[arg(long, value_name = "DIR")]
    pub zones: Option<PathBuf>,

    /// Set the upstream resolver to forward unknown names to
    #[arg(long, value_name = "IP:PORT")]
    pub upstream: Option<SocketAddr>,

    /// Never forward queries upstream
    #[arg(long, conflicts_with = "upstream")]
    pub no_forward: bool,
}
