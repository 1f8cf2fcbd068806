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

//! Provides the [`Type`] enumeration for DNS RR types.

use std::fmt;
use std::str::FromStr;

use crate::util::Caseless;

////////////////////////////////////////////////////////////////////////
// RR TYPES                                                           //
////////////////////////////////////////////////////////////////////////

/// Represents the RR type of a DNS record.
///
/// An RR type is represented on the wire as an unsigned 16-bit integer.
/// Only the types below are recognized; of these, WKS and PTR have no
/// encoder and cannot be served (see [`encode_record`]).
///
/// [`encode_record`]: super::encode_record
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Type {
    A,
    Ns,
    Cname,
    Soa,
    Wks,
    Ptr,
    Mx,
    Txt,
}

impl Type {
    /// Every recognized type, in wire-value order.
    pub const ALL: [Type; 8] = [
        Self::A,
        Self::Ns,
        Self::Cname,
        Self::Soa,
        Self::Wks,
        Self::Ptr,
        Self::Mx,
        Self::Txt,
    ];

    /// Returns the key under which records of this type are stored in
    /// a zone: the lowercase mnemonic.
    pub fn zone_key(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::Ns => "ns",
            Self::Cname => "cname",
            Self::Soa => "soa",
            Self::Wks => "wks",
            Self::Ptr => "ptr",
            Self::Mx => "mx",
            Self::Txt => "txt",
        }
    }

    /// Finds the type whose [zone key](Type::zone_key) is exactly
    /// `key`. Unlike [`FromStr`], this is case-sensitive.
    pub fn from_zone_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.zone_key() == key)
    }
}

impl TryFrom<u16> for Type {
    type Error = IntoTypeError;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Self::A),
            2 => Ok(Self::Ns),
            5 => Ok(Self::Cname),
            6 => Ok(Self::Soa),
            11 => Ok(Self::Wks),
            12 => Ok(Self::Ptr),
            15 => Ok(Self::Mx),
            16 => Ok(Self::Txt),
            _ => Err(IntoTypeError(raw)),
        }
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        match rr_type {
            Type::A => 1,
            Type::Ns => 2,
            Type::Cname => 5,
            Type::Soa => 6,
            Type::Wks => 11,
            Type::Ptr => 12,
            Type::Mx => 15,
            Type::Txt => 16,
        }
    }
}

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = Caseless(text);
        Self::ALL
            .into_iter()
            .find(|t| Caseless(t.zone_key()) == text)
            .ok_or("unknown type")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::A => f.write_str("A"),
            Self::Ns => f.write_str("NS"),
            Self::Cname => f.write_str("CNAME"),
            Self::Soa => f.write_str("SOA"),
            Self::Wks => f.write_str("WKS"),
            Self::Ptr => f.write_str("PTR"),
            Self::Mx => f.write_str("MX"),
            Self::Txt => f.write_str("TXT"),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a 16-bit value is not a recognized RR type.
/// The rejected value is included.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct IntoTypeError(pub u16);

impl fmt::Display for IntoTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TYPE{} is not a supported RR type", self.0)
    }
}

impl std::error::Error for IntoTypeError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_round_trip() {
        for rr_type in Type::ALL {
            assert_eq!(Type::try_from(u16::from(rr_type)), Ok(rr_type));
        }
        assert_eq!(Type::try_from(28), Err(IntoTypeError(28)));
    }

    #[test]
    fn mnemonics_parse_caselessly() {
        assert_eq!("cname".parse::<Type>(), Ok(Type::Cname));
        assert_eq!("Mx".parse::<Type>(), Ok(Type::Mx));
        assert!("AAAA".parse::<Type>().is_err());
        for rr_type in Type::ALL {
            assert_eq!(rr_type.to_string().parse::<Type>(), Ok(rr_type));
        }
    }

    #[test]
    fn zone_keys_are_lowercase_and_exact() {
        assert_eq!(Type::Txt.zone_key(), "txt");
        assert_eq!(Type::from_zone_key("soa"), Some(Type::Soa));
        assert_eq!(Type::from_zone_key("SOA"), None);
        assert_eq!(Type::from_zone_key("aaaa"), None);
    }
}
