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

//! Serialization of zone data into on-the-wire resource records.
//!
//! Every record written here is owned by the question's QNAME, which
//! always sits at offset 12 of the message, right after the header.
//! The owner is therefore written as the compression pointer
//! [`QNAME_POINTER`], preceded by the entry's sub-label(s) when the
//! entry is not owned by the QNAME itself. Names inside RDATA are
//! written in record form (see [`name::encode_record_form`]).

use std::fmt;

use log::{debug, warn};

use super::Type;
use crate::class::Class;
use crate::name;
use crate::zone::{Owner, Scalar, SoaFields, Zone};

/// A compression pointer to offset 12, where the QNAME starts.
pub const QNAME_POINTER: [u8; 2] = [0xc0, 0x0c];

/// Length of an IPv4 address in octets.
const A_RDLENGTH: usize = 4;

/// The longest text a single TXT character-string can hold.
const MAX_TXT_LEN: usize = 255;

////////////////////////////////////////////////////////////////////////
// RECORD ENCODING                                                    //
////////////////////////////////////////////////////////////////////////

/// Encodes one record entry of type `rr_type` into a complete resource
/// record: owner, TYPE, CLASS (always IN), TTL, RDLENGTH and RDATA.
///
/// The `value` is interpreted according to `rr_type`:
///
/// * A: a dotted-quad IPv4 address;
/// * NS and CNAME: a domain name;
/// * MX: a preference and an exchange name, separated by whitespace;
/// * TXT: free text of at most 255 octets.
///
/// SOA records are not stored as entries; use [`encode_soa`]. WKS and
/// PTR are recognized but cannot be encoded.
pub fn encode_record(
    owner: &Owner,
    ttl: &Scalar,
    value: &str,
    rr_type: Type,
) -> Result<Vec<u8>, EncodeError> {
    let ttl = ttl.to_u32().ok_or(EncodeError::InvalidTtl)?;
    let rdata = encode_rdata(value, rr_type)?;

    let mut octets = Vec::new();
    if let Owner::Label(label) = owner {
        name::encode_record_form(label, &mut octets).map_err(EncodeError::InvalidName)?;
    }
    octets.extend_from_slice(&QNAME_POINTER);
    push_fixed_fields(&mut octets, rr_type, ttl, rdata.len())?;
    octets.extend_from_slice(&rdata);
    Ok(octets)
}

/// Encodes the RDATA of a non-SOA record.
fn encode_rdata(value: &str, rr_type: Type) -> Result<Vec<u8>, EncodeError> {
    let mut rdata = Vec::new();
    match rr_type {
        Type::A => {
            let parts: Vec<&str> = value.split('.').collect();
            if parts.len() != A_RDLENGTH {
                return Err(EncodeError::InvalidAddress);
            }
            for part in parts {
                let octet = part.parse::<u8>().or(Err(EncodeError::InvalidAddress))?;
                rdata.push(octet);
            }
        }
        Type::Ns | Type::Cname => {
            name::encode_record_form(value, &mut rdata).map_err(EncodeError::InvalidName)?;
        }
        Type::Mx => {
            let mut fields = value.split_whitespace();
            let (preference, exchange) = match (fields.next(), fields.next(), fields.next()) {
                (Some(preference), Some(exchange), None) => (preference, exchange),
                _ => return Err(EncodeError::InvalidMx),
            };
            let preference = preference.parse::<u16>().or(Err(EncodeError::InvalidMx))?;
            rdata.extend_from_slice(&preference.to_be_bytes());
            name::encode_record_form(exchange, &mut rdata).map_err(EncodeError::InvalidName)?;
        }
        Type::Txt => {
            let text = value.as_bytes();
            if text.len() > MAX_TXT_LEN {
                return Err(EncodeError::TextTooLong(text.len()));
            }
            rdata.push(text.len() as u8);
            rdata.extend_from_slice(text);
        }
        Type::Soa => return Err(EncodeError::DataMismatch(rr_type)),
        Type::Wks | Type::Ptr => return Err(EncodeError::Unsupported(rr_type)),
    }
    Ok(rdata)
}

/// Encodes a zone's SOA field set into a complete resource record.
/// The owner is always the bare QNAME pointer.
pub fn encode_soa(soa: &SoaFields) -> Result<Vec<u8>, EncodeError> {
    let ttl = soa.ttl.to_u32().ok_or(EncodeError::InvalidTtl)?;

    let mut rdata = Vec::new();
    name::encode_record_form(&soa.mname, &mut rdata).map_err(EncodeError::InvalidName)?;
    name::encode_record_form(&soa.rname, &mut rdata).map_err(EncodeError::InvalidName)?;
    for (field, value) in [
        ("serial", &soa.serial),
        ("refresh", &soa.refresh),
        ("retry", &soa.retry),
        ("expire", &soa.expire),
        ("minimum", &soa.minimum),
    ] {
        let value = value.to_u32().ok_or(EncodeError::InvalidInteger(field))?;
        rdata.extend_from_slice(&value.to_be_bytes());
    }

    let mut octets = QNAME_POINTER.to_vec();
    push_fixed_fields(&mut octets, Type::Soa, ttl, rdata.len())?;
    octets.extend_from_slice(&rdata);
    Ok(octets)
}

/// Encodes the authority section for an answer from `zone`: the zone's
/// SOA record.
///
/// Returns [`None`] if the question itself asked for the SOA record
/// (`qtype`), if the zone has no SOA data, or if the SOA data cannot
/// be encoded. The last case is logged but otherwise ignored.
pub fn encode_authority(zone: &Zone, qtype: Option<Type>) -> Option<Vec<u8>> {
    if qtype == Some(Type::Soa) {
        return None;
    }
    let soa = match zone.soa() {
        Some(soa) => soa,
        None => {
            debug!("zone {} has no SOA data; omitting authority", zone.origin());
            return None;
        }
    };
    match encode_soa(soa) {
        Ok(octets) => Some(octets),
        Err(e) => {
            warn!("omitting authority for zone {}: {}", zone.origin(), e);
            None
        }
    }
}

/// Writes TYPE, CLASS, TTL and RDLENGTH.
fn push_fixed_fields(
    octets: &mut Vec<u8>,
    rr_type: Type,
    ttl: u32,
    rdlength: usize,
) -> Result<(), EncodeError> {
    let rdlength = u16::try_from(rdlength).or(Err(EncodeError::RdataTooLong))?;
    octets.extend_from_slice(&u16::from(rr_type).to_be_bytes());
    octets.extend_from_slice(&u16::from(Class::In).to_be_bytes());
    octets.extend_from_slice(&ttl.to_be_bytes());
    octets.extend_from_slice(&rdlength.to_be_bytes());
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that zone data could not be encoded as a
/// resource record.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum EncodeError {
    /// The TTL is not an unsigned 32-bit integer.
    InvalidTtl,

    /// An A record value is not a dotted-quad IPv4 address.
    InvalidAddress,

    /// An MX record value is not a 16-bit preference followed by an
    /// exchange name.
    InvalidMx,

    /// A TXT record value is longer than 255 octets. The length is
    /// included.
    TextTooLong(usize),

    /// The named SOA field is not an unsigned 32-bit integer.
    InvalidInteger(&'static str),

    /// The RDATA is longer than 65,535 octets.
    RdataTooLong,

    /// A domain name could not be encoded.
    InvalidName(name::Error),

    /// Records of this type cannot be encoded.
    Unsupported(Type),

    /// The data stored for this type has the wrong shape.
    DataMismatch(Type),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidTtl => f.write_str("TTL is not an unsigned 32-bit integer"),
            Self::InvalidAddress => f.write_str("A record value is not an IPv4 address"),
            Self::InvalidMx => f.write_str("MX record value is not \"<preference> <exchange>\""),
            Self::TextTooLong(len) => write!(f, "TXT record value is {} octets long", len),
            Self::InvalidInteger(field) => {
                write!(f, "SOA {} is not an unsigned 32-bit integer", field)
            }
            Self::RdataTooLong => f.write_str("RDATA is longer than 65,535 octets"),
            Self::InvalidName(e) => write!(f, "invalid domain name: {}", e),
            Self::Unsupported(rr_type) => write!(f, "{} records are not supported", rr_type),
            Self::DataMismatch(rr_type) => write!(f, "{} data has the wrong shape", rr_type),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidName(e) => Some(e),
            _ => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
