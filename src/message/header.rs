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

//! Implementation of the [`Header`] and [`Flags`] types.

use super::constants::*;
use super::error::{Error, Result};
use super::{Opcode, Rcode};
use crate::util::read_u16;

////////////////////////////////////////////////////////////////////////
// FLAGS                                                              //
////////////////////////////////////////////////////////////////////////

/// The flags of a DNS message header, as laid out in the two octets
/// following the ID by [RFC 1035 § 4.1.1].
///
/// The three reserved Z bits are not represented: they are ignored on
/// decoding and always written as zero.
///
/// [RFC 1035 § 4.1.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Flags {
    pub qr: bool,
    pub opcode: Opcode,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub rcode: Rcode,
}

impl Flags {
    /// Decodes the two flag octets.
    pub fn decode(octets: [u8; 2]) -> Result<Self> {
        let raw_opcode = (octets[OPCODE_BYTE] & OPCODE_MASK) >> OPCODE_SHIFT;
        let raw_rcode = octets[RCODE_BYTE] & RCODE_MASK;
        Ok(Self {
            qr: octets[QR_BYTE] & QR_MASK != 0,
            opcode: Opcode::try_from(raw_opcode).map_err(|e| Error::InvalidOpcode(e.0))?,
            aa: octets[AA_BYTE] & AA_MASK != 0,
            tc: octets[TC_BYTE] & TC_MASK != 0,
            rd: octets[RD_BYTE] & RD_MASK != 0,
            ra: octets[RA_BYTE] & RA_MASK != 0,
            rcode: Rcode::try_from(raw_rcode).map_err(|e| Error::InvalidRcode(e.0))?,
        })
    }

    /// Encodes the flags into two octets.
    pub fn encode(&self) -> [u8; 2] {
        let mut octets = [0; 2];
        set_bit(&mut octets[QR_BYTE], QR_MASK, self.qr);
        octets[OPCODE_BYTE] |= (u8::from(self.opcode) << OPCODE_SHIFT) & OPCODE_MASK;
        set_bit(&mut octets[AA_BYTE], AA_MASK, self.aa);
        set_bit(&mut octets[TC_BYTE], TC_MASK, self.tc);
        set_bit(&mut octets[RD_BYTE], RD_MASK, self.rd);
        set_bit(&mut octets[RA_BYTE], RA_MASK, self.ra);
        octets[RCODE_BYTE] |= u8::from(self.rcode) & RCODE_MASK;
        octets
    }

    /// Derives the flags of a response to a query carrying these flags.
    ///
    /// Only the opcode is carried over. The response is always marked
    /// authoritative and untruncated, and recursion is neither desired
    /// nor available.
    pub fn response(&self, rcode: Rcode) -> Self {
        Self {
            qr: true,
            opcode: self.opcode,
            aa: true,
            tc: false,
            rd: false,
            ra: false,
            rcode,
        }
    }
}

fn set_bit(octet: &mut u8, mask: u8, value: bool) {
    if value {
        *octet |= mask;
    }
}

////////////////////////////////////////////////////////////////////////
// HEADER                                                             //
////////////////////////////////////////////////////////////////////////

/// The fixed 12-octet header of a DNS message.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Header {
    pub id: u16,
    pub flags: Flags,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    /// Decodes the header at the start of `octets`. Anything after the
    /// first 12 octets is ignored.
    pub fn decode(octets: &[u8]) -> Result<Self> {
        if octets.len() < HEADER_SIZE {
            return Err(Error::HeaderTooShort);
        }
        let field = |start: usize| read_u16(&octets[start..]).ok_or(Error::HeaderTooShort);
        Ok(Self {
            id: field(ID_START)?,
            flags: Flags::decode([octets[FLAGS_START], octets[FLAGS_START + 1]])?,
            qdcount: field(QDCOUNT_START)?,
            ancount: field(ANCOUNT_START)?,
            nscount: field(NSCOUNT_START)?,
            arcount: field(ARCOUNT_START)?,
        })
    }

    /// Encodes the header into its 12-octet wire form.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut octets = [0; HEADER_SIZE];
        octets[ID_START..ID_END].copy_from_slice(&self.id.to_be_bytes());
        octets[FLAGS_START..FLAGS_END].copy_from_slice(&self.flags.encode());
        octets[QDCOUNT_START..QDCOUNT_END].copy_from_slice(&self.qdcount.to_be_bytes());
        octets[ANCOUNT_START..ANCOUNT_END].copy_from_slice(&self.ancount.to_be_bytes());
        octets[NSCOUNT_START..NSCOUNT_END].copy_from_slice(&self.nscount.to_be_bytes());
        octets[ARCOUNT_START..ARCOUNT_END].copy_from_slice(&self.arcount.to_be_bytes());
        octets
    }

    /// Derives the header of the response to this query header.
    ///
    /// The ID is echoed and the flags are derived with
    /// [`Flags::response`]. The response always carries exactly one
    /// question and no additional records.
    pub fn response(&self, ancount: u16, rcode: Rcode, nscount: u16) -> Self {
        Self {
            id: self.id,
            flags: self.flags.response(rcode),
            qdcount: 1,
            ancount,
            nscount,
            arcount: 0,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
