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

//! Implementation of the [`LoadError`] type.

use std::fmt;

use crate::rr::Type;

/// An error signaling that a zone could not be built from its JSON
/// representation (see [`Zone::from_json`](super::Zone::from_json)).
#[derive(Debug)]
pub enum LoadError {
    /// The input is not valid JSON.
    Json(serde_json::Error),

    /// The top-level JSON value is not an object.
    NotAnObject,

    /// The `$origin` member is missing.
    MissingOrigin,

    /// The `$origin` member is not a string.
    InvalidOrigin,

    /// The `soa` member is not a valid SOA field set.
    InvalidSoa(serde_json::Error),

    /// The member for the given type is not an array of valid record
    /// entries.
    InvalidRecords(Type, serde_json::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Json(_) => f.write_str("zone is not valid JSON"),
            Self::NotAnObject => f.write_str("zone is not a JSON object"),
            Self::MissingOrigin => f.write_str("zone has no $origin"),
            Self::InvalidOrigin => f.write_str("zone $origin is not a string"),
            Self::InvalidSoa(_) => f.write_str("invalid soa member"),
            Self::InvalidRecords(rr_type, _) => {
                write!(f, "invalid {} member", rr_type.zone_key())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) | Self::InvalidSoa(e) | Self::InvalidRecords(_, e) => Some(e),
            _ => None,
        }
    }
}
