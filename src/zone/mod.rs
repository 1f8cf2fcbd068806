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

//! Implementation of DNS zone data structures, for keeping DNS zones
//! loaded in memory.

use std::collections::HashMap;
use std::fmt;

use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::rr::Type;

mod catalog;
mod error;
pub mod lookup;
pub use catalog::ZoneTable;
pub use error::LoadError;
pub use lookup::{LookupError, Resolver};

////////////////////////////////////////////////////////////////////////
// ZONES                                                              //
////////////////////////////////////////////////////////////////////////

/// A DNS zone loaded into memory.
///
/// A `Zone` is keyed by its origin and maps record types to their
/// [data](ZoneData): the SOA field set for [`Type::Soa`], and an
/// ordered list of [record entries](RecordEntry) for everything else.
/// Record values are stored as written and only interpreted when they
/// are encoded, so a zone may hold values that cannot be served.
///
/// Zones are usually built from JSON with [`Zone::from_json`], though
/// [`Zone::new`] together with [`Zone::insert_soa`] and
/// [`Zone::insert_records`] works as well.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    origin: String,
    data: HashMap<Type, ZoneData>,
}

impl Zone {
    /// Creates a new, empty `Zone` with the given origin.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: HashMap::new(),
        }
    }

    /// Parses a zone from its JSON representation.
    ///
    /// The document must be an object with a string `$origin` member.
    /// Other members starting with `$` are ignored. The `soa` member
    /// holds the SOA field set, and every other member named by the
    /// lowercase mnemonic of a known record type holds an array of
    /// `{"name", "ttl", "value"}` entries. Members naming anything else
    /// are skipped with a warning.
    pub fn from_json(octets: &[u8]) -> Result<Self, LoadError> {
        let object = match serde_json::from_slice::<Value>(octets).map_err(LoadError::Json)? {
            Value::Object(object) => object,
            _ => return Err(LoadError::NotAnObject),
        };
        Self::from_json_object(object)
    }

    fn from_json_object(mut object: Map<String, Value>) -> Result<Self, LoadError> {
        let origin = match object.remove("$origin") {
            Some(Value::String(origin)) => origin,
            Some(_) => return Err(LoadError::InvalidOrigin),
            None => return Err(LoadError::MissingOrigin),
        };

        let mut zone = Self::new(origin);
        for (key, value) in object {
            if key.starts_with('$') {
                continue;
            }
            match Type::from_zone_key(&key) {
                Some(Type::Soa) => {
                    let soa = serde_json::from_value(value).map_err(LoadError::InvalidSoa)?;
                    zone.insert_soa(soa);
                }
                Some(rr_type) => {
                    let entries = serde_json::from_value(value)
                        .map_err(|e| LoadError::InvalidRecords(rr_type, e))?;
                    zone.insert_records(rr_type, entries);
                }
                None => warn!(
                    "zone {}: skipping unrecognized member {:?}",
                    zone.origin, key
                ),
            }
        }
        Ok(zone)
    }

    /// Returns the zone's origin.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Sets the zone's SOA field set, returning the previous data
    /// stored for [`Type::Soa`] (if any).
    pub fn insert_soa(&mut self, soa: SoaFields) -> Option<ZoneData> {
        self.data.insert(Type::Soa, ZoneData::Soa(soa))
    }

    /// Sets the record entries for `rr_type`, returning the previous
    /// data stored for that type (if any).
    ///
    /// Entries stored under [`Type::Soa`] this way cannot be encoded;
    /// use [`Zone::insert_soa`] instead.
    pub fn insert_records(&mut self, rr_type: Type, entries: Vec<RecordEntry>) -> Option<ZoneData> {
        self.data.insert(rr_type, ZoneData::Records(entries))
    }

    /// Returns the data stored for `rr_type`.
    pub fn get(&self, rr_type: Type) -> Option<&ZoneData> {
        self.data.get(&rr_type)
    }

    /// Returns the zone's SOA field set, if it has one.
    pub fn soa(&self) -> Option<&SoaFields> {
        match self.get(Type::Soa) {
            Some(ZoneData::Soa(soa)) => Some(soa),
            _ => None,
        }
    }
}

/// The data stored in a [`Zone`] for one record type.
#[derive(Clone, Debug, PartialEq)]
pub enum ZoneData {
    Soa(SoaFields),
    Records(Vec<RecordEntry>),
}

////////////////////////////////////////////////////////////////////////
// RECORD DATA                                                        //
////////////////////////////////////////////////////////////////////////

/// The fields of a zone's SOA record, as defined by
/// [RFC 1035 § 3.3.13]. `ttl` is the TTL of the SOA record itself.
///
/// [RFC 1035 § 3.3.13]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.13
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SoaFields {
    pub mname: String,
    pub rname: String,
    pub serial: Scalar,
    pub refresh: Scalar,
    pub retry: Scalar,
    pub expire: Scalar,
    pub minimum: Scalar,
    #[serde(default)]
    pub ttl: Scalar,
}

/// One record of a non-SOA type in a [`Zone`].
///
/// The `value` is interpreted according to the record type when the
/// record is encoded: a dotted-quad address for A, a domain name for
/// NS and CNAME, `"<preference> <exchange>"` for MX, and free text for
/// TXT.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RecordEntry {
    #[serde(rename = "name")]
    pub owner: Owner,
    pub ttl: Scalar,
    pub value: String,
}

impl RecordEntry {
    pub fn new(owner: impl Into<Owner>, ttl: impl Into<Scalar>, value: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ttl: ttl.into(),
            value: value.into(),
        }
    }
}

/// The owner of a [`RecordEntry`], relative to the queried name.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(from = "String")]
pub enum Owner {
    /// The record is owned by the queried name itself. Written as `@`
    /// (or left empty) in zone files.
    Apex,

    /// The record is owned by the given sub-label(s) prepended to the
    /// queried name.
    Label(String),
}

impl From<String> for Owner {
    fn from(text: String) -> Self {
        if text.is_empty() || text == "@" {
            Self::Apex
        } else {
            Self::Label(text)
        }
    }
}

impl From<&str> for Owner {
    fn from(text: &str) -> Self {
        text.to_owned().into()
    }
}

/// A numeric field of a zone file, which may be written either as a
/// JSON number or as a string holding a number.
///
/// Conversion happens when the field is used, through
/// [`Scalar::to_u32`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// Converts the field to a `u32`, or returns [`None`] if it is not
    /// a non-negative integer in range. Surrounding whitespace in the
    /// string form is ignored.
    pub fn to_u32(&self) -> Option<u32> {
        match self {
            Self::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Self::Number(0.into())
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for Scalar {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Number(number) => fmt::Display::fmt(number, f),
            Self::Text(text) => write!(f, "{:?}", text),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
