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

//! Implements the server configuration file.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use serde::Deserialize;

use crate::args::RunArgs;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the server configuration from the file given by `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let dir = match path.as_ref().parent() {
        Some(p) => p,
        None => return Err(anyhow!("the configuration file path has no parent")),
    };
    let raw_config = fs::read(path.as_ref()).context("failed to read the configuration file")?;
    let config = parse(&raw_config, dir).context("failed to parse the configuration file")?;
    log_config_summary(&config);
    Ok(config)
}

/// Parses a configuration file found in `dir`.
///
/// When loading the configuration from a file, a relative zone
/// directory is interpreted relative to the configuration file's
/// directory.
fn parse(raw_config: &[u8], dir: &Path) -> Result<Config> {
    let mut config: Config = toml::from_slice(raw_config)?;
    if config.zones.is_relative() {
        config.zones = dir.join(&config.zones);
    }
    if config.forwarding.timeout == 0 {
        return Err(anyhow!("the forwarding timeout must be at least 1 second"));
    }
    Ok(config)
}

/// Loads the server configuration from the parsed command line
/// arguments given by `args`.
pub fn load_from_args(args: RunArgs) -> Config {
    let config = Config {
        bind: args.bind.unwrap_or_else(default_bind),
        zones: args.zones.unwrap_or_else(default_zones),
        forwarding: ForwardingConfig {
            enabled: !args.no_forward,
            upstream: args.upstream.unwrap_or_else(default_upstream),
            timeout: default_timeout(),
        },
    };
    log_config_summary(&config);
    config
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let forwarding = if config.forwarding.enabled {
        format!(
            "to {} (timeout {} s)",
            config.forwarding.upstream, config.forwarding.timeout
        )
    } else {
        String::from("disabled")
    };
    debug!(
        "Configuration loaded:\n\
         Bind address:   {}\n\
         Zone directory: {}\n\
         Forwarding:     {}",
        config.bind,
        config.zones.display(),
        forwarding,
    );
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default = "default_zones")]
    pub zones: PathBuf,
    #[serde(default)]
    pub forwarding: ForwardingConfig,
}

const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_PORT: u16 = 53;

fn default_bind() -> SocketAddr {
    SocketAddr::new(DEFAULT_BIND_IP, DEFAULT_PORT)
}

fn default_zones() -> PathBuf {
    PathBuf::from("zones")
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION SECTION: FORWARDING                                  //
////////////////////////////////////////////////////////////////////////

/// The configuration for forwarding unknown names upstream.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_upstream")]
    pub upstream: SocketAddr,
    /// The receive timeout, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl ForwardingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            upstream: default_upstream(),
            timeout: default_timeout(),
        }
    }
}

const DEFAULT_UPSTREAM_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8));

fn default_enabled() -> bool {
    true
}

fn default_upstream() -> SocketAddr {
    SocketAddr::new(DEFAULT_UPSTREAM_IP, DEFAULT_PORT)
}

fn default_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse(b"", Path::new("/etc/zonedns")).unwrap();
        assert_eq!(config.bind, "127.0.0.1:53".parse().unwrap());
        assert_eq!(config.zones, Path::new("/etc/zonedns/zones"));
        assert!(config.forwarding.enabled);
        assert_eq!(config.forwarding.upstream, "8.8.8.8:53".parse().unwrap());
        assert_eq!(config.forwarding.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn file_values_are_used() {
        let raw = br#"
            bind = "[::1]:5353"
            zones = "/srv/zones"

            [forwarding]
            enabled = false
            upstream = "1.1.1.1:53"
            timeout = 2
        "#;
        let config = parse(raw, Path::new("/etc/zonedns")).unwrap();
        assert_eq!(config.bind, "[::1]:5353".parse().unwrap());
        assert_eq!(config.zones, Path::new("/srv/zones"));
        assert!(!config.forwarding.enabled);
        assert_eq!(config.forwarding.upstream, "1.1.1.1:53".parse().unwrap());
        assert_eq!(config.forwarding.timeout, 2);
    }

    #[test]
    fn bad_files_are_rejected() {
        let dir = Path::new("/etc/zonedns");
        assert!(parse(b"port = 53", dir).is_err());
        assert!(parse(b"[forwarding]\nretries = 3", dir).is_err());
        assert!(parse(b"bind = \"localhost\"", dir).is_err());
        assert!(parse(b"[forwarding]\ntimeout = 0", dir).is_err());
    }

    #[test]
    fn args_are_used() {
        let args = crate::args::Args::parse_from([
            "zonednsd",
            "run",
            "--zones",
            "here",
            "--upstream",
            "9.9.9.9:53",
        ]);
        let crate::args::Command::Run(run_args) = args.command;
        let config = load_from_args(run_args);
        assert_eq!(config.bind, default_bind());
        assert_eq!(config.zones, Path::new("here"));
        assert!(config.forwarding.enabled);
        assert_eq!(config.forwarding.upstream, "9.9.9.9:53".parse().unwrap());
    }
}
