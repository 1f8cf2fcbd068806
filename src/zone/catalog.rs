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

//! Implementation of the [`ZoneTable`] structure.

use std::collections::HashMap;

use super::Zone;

/// A data structure containing all of the zones served by a server,
/// keyed by origin.
///
/// Origins are compared exactly, without case folding or trailing-dot
/// normalization. Finding the zone for a queried name is the
/// [`Resolver`](super::Resolver)'s job.
#[derive(Clone, Debug, Default)]
pub struct ZoneTable {
    zones: HashMap<String, Zone>,
}

impl ZoneTable {
    /// Creates a new, initially empty `ZoneTable`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `zone` to the table, replacing and returning the
    /// preexisting [`Zone`] with the same origin (if any).
    pub fn insert(&mut self, zone: Zone) -> Option<Zone> {
        self.zones.insert(zone.origin().to_owned(), zone)
    }

    /// Returns the zone whose origin is exactly `origin`.
    pub fn get(&self, origin: &str) -> Option<&Zone> {
        self.zones.get(origin)
    }

    /// Returns the number of zones in the table.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Iterates over the origins of the zones in the table, in no
    /// particular order.
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }
}

impl FromIterator<Zone> for ZoneTable {
    fn from_iter<I: IntoIterator<Item = Zone>>(iter: I) -> Self {
        let mut table = Self::new();
        for zone in iter {
            table.insert(zone);
        }
        table
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
