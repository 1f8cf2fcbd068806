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

//! Implementation of zone and record lookup for incoming questions.
//!
//! Finding the zone for a QNAME is deliberately shallow. The QNAME is
//! first looked up verbatim as a zone origin. If that fails, exactly
//! one label is removed from the left and the remainder is tried. No
//! further ancestors are searched, so `www.example.com` finds the zone
//! `example.com` but `a.b.example.com` does not.
//!
//! Once the zone is known, its data for the queried type is looked up
//! by type alone. Record owners are not matched against the QNAME.

use std::fmt;
use std::sync::Arc;

use log::debug;

use super::{Zone, ZoneData, ZoneTable};
use crate::rr::Type;

/// Looks up zones and record data in a [`ZoneTable`] that is fixed
/// for the lifetime of the `Resolver`.
///
/// A `Resolver` without a table (see [`Resolver::without_zones`]) is
/// different from one with an empty table: the former fails every
/// lookup with [`LookupError::ServerError`].
#[derive(Clone, Debug)]
pub struct Resolver {
    zones: Option<Arc<ZoneTable>>,
}

impl Resolver {
    /// Creates a `Resolver` over `zones`. [`None`] means that no zones
    /// are configured.
    pub fn new(zones: Option<Arc<ZoneTable>>) -> Self {
        Self { zones }
    }

    /// Creates a `Resolver` with no zones configured.
    pub fn without_zones() -> Self {
        Self::new(None)
    }

    /// Returns the zone table, if there is one.
    pub fn zones(&self) -> Option<&ZoneTable> {
        self.zones.as_deref()
    }

    /// Finds the zone for `domain` as described in the
    /// [module documentation](self).
    pub fn find_zone(&self, domain: &str) -> Result<&Zone, LookupError> {
        let zones = self.zones.as_deref().ok_or(LookupError::ServerError)?;
        if let Some(zone) = zones.get(domain) {
            return Ok(zone);
        }
        let parent = domain.split_once('.').map_or("", |(_, rest)| rest);
        match zones.get(parent) {
            Some(zone) => {
                debug!("{} found in parent zone {}", domain, parent);
                Ok(zone)
            }
            None => Err(LookupError::NoDomainFound(parent.to_owned())),
        }
    }

    /// Looks up the data stored in `zone` for `rr_type`. A missing
    /// type is reported the same way as a missing domain.
    pub fn lookup_records(zone: &Zone, rr_type: Type) -> Result<&ZoneData, LookupError> {
        zone.get(rr_type)
            .ok_or_else(|| LookupError::NoDomainFound(zone.origin().to_owned()))
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// The ways a lookup can fail.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum LookupError {
    /// No zone (or no data of the requested type) exists for the
    /// given name.
    NoDomainFound(String),

    /// No zones are configured at all.
    ServerError,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoDomainFound(name) => write!(f, "no data found for {:?}", name),
            Self::ServerError => f.write_str("no zones configured"),
        }
    }
}

impl std::error::Error for LookupError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
