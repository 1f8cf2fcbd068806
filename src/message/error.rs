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

//! Implementation of the [`Error`] type for message decoding.

use std::fmt;

use crate::name;

/// An error signaling that a DNS message could not be decoded.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// The message is shorter than the 12-octet header.
    HeaderTooShort,

    /// The header's opcode is not one of the recognized values.
    InvalidOpcode(u8),

    /// The header's RCODE is not one of the recognized values.
    InvalidRcode(u8),

    /// The question's QNAME could not be decoded.
    InvalidQname(name::Error),

    /// The message ended in the middle of a fixed-size field.
    UnexpectedEomInField,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::HeaderTooShort => f.write_str("message is shorter than a DNS header"),
            Self::InvalidOpcode(raw) => write!(f, "opcode {} is not supported", raw),
            Self::InvalidRcode(raw) => write!(f, "RCODE {} is not supported", raw),
            Self::InvalidQname(ref e) => write!(f, "invalid QNAME: {}", e),
            Self::UnexpectedEomInField => f.write_str("unexpected end of message in field"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidQname(e) => Some(e),
            _ => None,
        }
    }
}

/// A type alias for [`Result`](std::result::Result) with the error type
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
