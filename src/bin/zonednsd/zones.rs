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

//! Implements zone loading.

use std::fmt::Write;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use zonedns::zone::{Zone, ZoneTable};

/// The file extension of zone files.
const ZONE_FILE_EXTENSION: &str = "zone";

/// Loads every zone file in `dir`.
///
/// Files that fail to load are logged and skipped. If the directory
/// does not exist or no zone could be loaded, [`None`] is returned,
/// meaning that no zones are configured.
pub fn load(dir: &Path) -> Result<Option<ZoneTable>> {
    let paths = match zone_file_paths(dir) {
        Ok(paths) => paths,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("The zone directory {} does not exist.", dir.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to list the zone directory {}", dir.display()))
        }
    };

    let mut table = ZoneTable::new();
    let mut files_failed = 0;
    for path in paths {
        debug!("Loading a zone from {}.", path.display());
        match load_zone(&path) {
            Ok(zone) => {
                let origin = zone.origin().to_owned();
                if table.insert(zone).is_some() {
                    warn!(
                        "The zone {} in {} replaces one loaded earlier.",
                        origin,
                        path.display(),
                    );
                }
            }
            Err(e) => {
                let mut message = format!("Failed to load {}:", path.display());
                for (i, cause) in e.chain().enumerate() {
                    let _ = write!(message, "\n[{}] {}", i + 1, cause);
                }
                error!("{}", message);
                files_failed += 1;
            }
        }
    }

    if files_failed == 1 {
        error!("1 zone file failed to load.");
    } else if files_failed > 1 {
        error!("{} zone files failed to load.", files_failed);
    }

    if table.is_empty() {
        warn!("No zones were loaded from {}.", dir.display());
        Ok(None)
    } else {
        if table.len() == 1 {
            info!("Loaded 1 zone.");
        } else {
            info!("Loaded {} zones.", table.len());
        }
        Ok(Some(table))
    }
}

/// Lists the zone files in `dir`, sorted by path so that loading is
/// deterministic.
fn zone_file_paths(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |e| e == ZONE_FILE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Loads a single zone file.
fn load_zone(path: &Path) -> Result<Zone> {
    let octets = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Zone::from_json(&octets).with_context(|| format!("failed to parse {}", path.display()))
}
