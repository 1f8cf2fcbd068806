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

//! Implementation of types relating to DNS questions.

use std::fmt;

use super::error::{Error, Result};
use crate::class::Class;
use crate::name;
use crate::rr::Type;
use crate::util::read_u16;

////////////////////////////////////////////////////////////////////////
// QUESTIONS                                                          //
////////////////////////////////////////////////////////////////////////

/// The question of a DNS query.
///
/// Defined in [RFC 1035 § 4.1.2], a DNS question includes
///
/// * the QNAME, which is the domain name whose records are being
///   queried;
/// * the [QTYPE](Qtype), which specifies what types of records are
///   desired; and
/// * the [QCLASS](Qclass), which specifies which DNS class(es) to search.
///
/// Only one question per message is read. The QNAME is kept as
/// dot-separated text with its case preserved.
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    pub qname: String,
    pub qtype: Qtype,
    pub qclass: Qclass,
}

impl Question {
    /// Decodes a question from the start of `octets`, which should be
    /// the part of the message following the header.
    ///
    /// On success, also returns the number of octets consumed.
    pub fn decode(octets: &[u8]) -> Result<(Self, usize)> {
        let (qname, qname_end) = name::decode(octets, 0).map_err(Error::InvalidQname)?;
        let qtype = octets
            .get(qname_end..)
            .and_then(read_u16)
            .ok_or(Error::UnexpectedEomInField)?;
        let qclass = octets
            .get(qname_end + 2..)
            .and_then(read_u16)
            .ok_or(Error::UnexpectedEomInField)?;
        let question = Self {
            qname,
            qtype: qtype.into(),
            qclass: qclass.into(),
        };
        Ok((question, qname_end + 4))
    }

    /// Appends the wire form of the question to `out`. The QNAME is
    /// written in terminated (question) form.
    pub fn encode(&self, out: &mut Vec<u8>) -> std::result::Result<(), name::Error> {
        name::encode_question_form(&self.qname, out)?;
        out.extend_from_slice(&u16::from(self.qtype).to_be_bytes());
        out.extend_from_slice(&u16::from(self.qclass).to_be_bytes());
        Ok(())
    }

    /// Returns the record type asked for, or [`None`] if the QTYPE is
    /// not one of the recognized [`Type`]s.
    pub fn rr_type(&self) -> Option<Type> {
        Type::try_from(u16::from(self.qtype)).ok()
    }

    /// Returns the class asked for, or [`None`] if the QCLASS is not
    /// a recognized [`Class`].
    pub fn class(&self) -> Option<Class> {
        Class::try_from(u16::from(self.qclass)).ok()
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}

////////////////////////////////////////////////////////////////////////
// QTYPES                                                             //
////////////////////////////////////////////////////////////////////////

/// The QTYPE of a DNS [question](Question).
///
/// A QTYPE is represented on the wire as an unsigned 16-bit integer.
/// The raw value is kept so that it can be echoed in the response even
/// when it does not name a supported [`Type`]; see
/// [`Question::rr_type`].
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct Qtype(u16);

impl From<u16> for Qtype {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Qtype> for u16 {
    fn from(qtype: Qtype) -> Self {
        qtype.0
    }
}

impl From<Type> for Qtype {
    fn from(rr_type: Type) -> Self {
        Self(rr_type.into())
    }
}

impl fmt::Display for Qtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match Type::try_from(self.0) {
            Ok(rr_type) => fmt::Display::fmt(&rr_type, f),
            Err(_) => write!(f, "TYPE{}", self.0),
        }
    }
}

impl fmt::Debug for Qtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

////////////////////////////////////////////////////////////////////////
// QCLASSES                                                           //
////////////////////////////////////////////////////////////////////////

/// The QCLASS of a DNS [question](Question).
///
/// Like [`Qtype`], this wraps the raw 16-bit value; see
/// [`Question::class`].
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct Qclass(u16);

impl From<u16> for Qclass {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Qclass> for u16 {
    fn from(qclass: Qclass) -> Self {
        qclass.0
    }
}

impl From<Class> for Qclass {
    fn from(class: Class) -> Self {
        Self(class.into())
    }
}

impl fmt::Display for Qclass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match Class::try_from(self.0) {
            Ok(class) => fmt::Display::fmt(&class, f),
            Err(_) => write!(f, "CLASS{}", self.0),
        }
    }
}

impl fmt::Debug for Qclass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    const WWW_EXAMPLE_COM_A: &[u8] = b"\x03www\x07example\x03com\x00\x00\x01\x00\x01";

    #[test]
    fn decode_works() {
        let (question, len) = Question::decode(WWW_EXAMPLE_COM_A).unwrap();
        assert_eq!(question.qname, "www.example.com");
        assert_eq!(question.qtype, Type::A.into());
        assert_eq!(question.qclass, Class::In.into());
        assert_eq!(question.rr_type(), Some(Type::A));
        assert_eq!(question.class(), Some(Class::In));
        assert_eq!(len, WWW_EXAMPLE_COM_A.len());
    }

    #[test]
    fn encode_reverses_decode() {
        let (question, _) = Question::decode(WWW_EXAMPLE_COM_A).unwrap();
        let mut buf = Vec::new();
        question.encode(&mut buf).unwrap();
        assert_eq!(buf, WWW_EXAMPLE_COM_A);
    }

    #[test]
    fn unknown_type_and_class_decode_to_absence() {
        // QTYPE AAAA, QCLASS CH
        let octets = b"\x07example\x00\x00\x1c\x00\x03";
        let (question, _) = Question::decode(octets).unwrap();
        assert_eq!(question.rr_type(), None);
        assert_eq!(question.class(), None);

        let mut buf = Vec::new();
        question.encode(&mut buf).unwrap();
        assert_eq!(buf, octets);
    }

    #[test]
    fn decode_rejects_truncated_fields() {
        let short = &WWW_EXAMPLE_COM_A[..WWW_EXAMPLE_COM_A.len() - 1];
        assert_eq!(Question::decode(short), Err(Error::UnexpectedEomInField));
        let no_type = &WWW_EXAMPLE_COM_A[..WWW_EXAMPLE_COM_A.len() - 4];
        assert_eq!(Question::decode(no_type), Err(Error::UnexpectedEomInField));
    }

    #[test]
    fn decode_rejects_bad_names() {
        assert_eq!(
            Question::decode(b"\xc0\x0c\x00\x01\x00\x01"),
            Err(Error::InvalidQname(name::Error::CompressedName))
        );
        assert_eq!(
            Question::decode(b"\x05ab"),
            Err(Error::InvalidQname(name::Error::UnexpectedEom))
        );
    }

    #[test]
    fn display_uses_mnemonics() {
        let (question, _) = Question::decode(WWW_EXAMPLE_COM_A).unwrap();
        assert_eq!(question.to_string(), "www.example.com IN A");
        assert_eq!(Qtype::from(28).to_string(), "TYPE28");
        assert_eq!(Qclass::from(3).to_string(), "CLASS3");
    }
}
