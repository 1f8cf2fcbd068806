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

//! The processing logic of an authoritative DNS server.
//!
//! The [`Server`] structure is the heart of this module; see its
//! documentation for details.

use std::fmt;

use log::debug;

use crate::class::Class;
use crate::message::constants::HEADER_SIZE;
use crate::message::{self, Header, Question, Rcode};
use crate::rr::{encode_authority, encode_record, encode_soa, EncodeError, Type};
use crate::zone::{LookupError, Resolver, Zone, ZoneData};

////////////////////////////////////////////////////////////////////////
// SERVER PUBLIC API AND CORE MESSAGE-HANDLING LOGIC                  //
////////////////////////////////////////////////////////////////////////

/// An authoritative DNS server, abstracted from any underlying network
/// I/O provider.
///
/// The `Server` turns a raw DNS query into a raw response through
/// [`Server::build_message`]. A network I/O provider is responsible for
/// receiving queries, sending the responses back, and deciding whether
/// to forward a query upstream instead (see [`Response::should_forward`]).
///
/// Answers come from the zones of the server's [`Resolver`], which are
/// fixed for the lifetime of the `Server`.
#[derive(Clone, Debug)]
pub struct Server {
    resolver: Resolver,
}

impl Server {
    /// Creates a new `Server` that answers from `resolver`.
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// Returns the server's resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Builds the response to the DNS query `query`.
    ///
    /// An error is returned only if the header or question of the query
    /// cannot be decoded; such queries should be dropped. Otherwise a
    /// well-formed response is always produced, with the outcome of
    /// the lookup reflected in its RCODE:
    ///
    /// * NOERROR if the answer section was built, in which case the
    ///   zone's SOA record is added to the authority section (unless
    ///   the question asked for it);
    /// * NXDOMAIN if no zone or no records of the asked-for type exist;
    /// * SERVFAIL if no zones are configured at all; and
    /// * FORMERR if the QTYPE or QCLASS is unsupported, or the zone's
    ///   records could not be encoded.
    ///
    /// Only the first question of the query is read.
    pub fn build_message(&self, query: &[u8]) -> message::Result<Response> {
        let header = Header::decode(query)?;
        let (question, _) = Question::decode(&query[HEADER_SIZE..])?;
        let mut question_octets = Vec::new();
        question
            .encode(&mut question_octets)
            .map_err(message::Error::InvalidQname)?;

        let (answer_octets, ancount, rcode, authority) = match self.build_answer_section(&question)
        {
            Ok(answers) => {
                let authority = encode_authority(answers.zone, question.rr_type());
                (answers.octets, answers.count, Rcode::NoError, authority)
            }
            Err(e) => {
                debug!("{}: {}", question, e);
                (Vec::new(), 0, e.into(), None)
            }
        };
        let nscount = if authority.is_some() { 1 } else { 0 };

        let mut octets = header.response(ancount, rcode, nscount).encode().to_vec();
        octets.extend_from_slice(&question_octets);
        octets.extend_from_slice(&answer_octets);
        if let Some(authority) = authority {
            octets.extend_from_slice(&authority);
        }

        Ok(Response {
            octets,
            rcode,
            question,
            recursion_desired: header.flags.rd,
        })
    }

    /// Builds the answer section for `question`.
    ///
    /// The zone is found first, so an unknown name is reported as
    /// [`ProcessingError::NameError`] even if the QTYPE or QCLASS is
    /// unsupported. Answers are all-or-nothing: if any record fails to
    /// encode, none are returned.
    pub fn build_answer_section(&self, question: &Question) -> Result<Answers<'_>, ProcessingError> {
        let zone = self.resolver.find_zone(&question.qname)?;
        let rr_type = match (question.rr_type(), question.class()) {
            (Some(rr_type), Some(Class::In)) => rr_type,
            _ => return Err(ProcessingError::FormatError),
        };

        let (octets, count) = match (rr_type, Resolver::lookup_records(zone, rr_type)?) {
            (Type::Soa, ZoneData::Soa(soa)) => (encode_soa(soa)?, 1),
            (_, ZoneData::Records(entries)) if rr_type != Type::Soa => {
                let count = u16::try_from(entries.len()).or(Err(ProcessingError::FormatError))?;
                let mut octets = Vec::new();
                for entry in entries {
                    octets.extend(encode_record(
                        &entry.owner,
                        &entry.ttl,
                        &entry.value,
                        rr_type,
                    )?);
                }
                (octets, count)
            }
            _ => return Err(EncodeError::DataMismatch(rr_type).into()),
        };
        debug!("{}: {} answer(s) from zone {}", question, count, zone.origin());
        Ok(Answers {
            octets,
            count,
            zone,
        })
    }
}

/// The answer section built by [`Server::build_answer_section`].
#[derive(Clone, Debug)]
pub struct Answers<'a> {
    /// The encoded resource records.
    pub octets: Vec<u8>,

    /// The number of resource records in `octets`.
    pub count: u16,

    /// The zone the answers came from.
    pub zone: &'a Zone,
}

/// A response built by [`Server::build_message`].
#[derive(Clone, Debug)]
pub struct Response {
    /// The encoded response message.
    pub octets: Vec<u8>,

    /// The RCODE of the response.
    pub rcode: Rcode,

    /// The question of the query.
    pub question: Question,

    /// Whether the query had the RD (recursion desired) bit set.
    pub recursion_desired: bool,
}

impl Response {
    /// Returns whether the query should be forwarded to an upstream
    /// resolver instead of being answered with this response: the name
    /// was not found locally and the client asked for recursion.
    pub fn should_forward(&self) -> bool {
        self.rcode == Rcode::NameError && self.recursion_desired
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// The ways building an answer section can fail. Each maps to the
/// [`Rcode`] of the response.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProcessingError {
    NameError,
    ServerFailure,
    FormatError,
}

impl From<LookupError> for ProcessingError {
    fn from(error: LookupError) -> Self {
        match error {
            LookupError::NoDomainFound(_) => Self::NameError,
            LookupError::ServerError => Self::ServerFailure,
        }
    }
}

impl From<EncodeError> for ProcessingError {
    fn from(error: EncodeError) -> Self {
        debug!("failed to encode answer: {}", error);
        Self::FormatError
    }
}

impl From<ProcessingError> for Rcode {
    fn from(error: ProcessingError) -> Self {
        match error {
            ProcessingError::NameError => Rcode::NameError,
            ProcessingError::ServerFailure => Rcode::ServerFailure,
            ProcessingError::FormatError => Rcode::FormatError,
        }
    }
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NameError => f.write_str("name or type not found"),
            Self::ServerFailure => f.write_str("no zones configured"),
            Self::FormatError => f.write_str("cannot answer from zone data"),
        }
    }
}

impl std::error::Error for ProcessingError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::message::{Error, Flags, Opcode};
    use crate::name;
    use crate::zone::ZoneTable;

    const EXAMPLE_ZONE: &str = r#"{
        "$origin": "example.com",
        "soa": {
            "mname": "ns1.example.com.",
            "rname": "admin.example.com.",
            "serial": 2024010101,
            "refresh": 3600,
            "retry": 600,
            "expire": 604800,
            "minimum": 86400,
            "ttl": 3600
        },
        "a": [{"name": "@", "ttl": 300, "value": "1.2.3.4"}],
        "ns": [
            {"name": "@", "ttl": 300, "value": "ns1.example.com."},
            {"name": "@", "ttl": 300, "value": "ns2.example.com."}
        ]
    }"#;

    fn server_for(zones: &[&str]) -> Server {
        let table: ZoneTable = zones
            .iter()
            .map(|json| Zone::from_json(json.as_bytes()).unwrap())
            .collect();
        Server::new(Resolver::new(Some(Arc::new(table))))
    }

    fn example_server() -> Server {
        server_for(&[EXAMPLE_ZONE])
    }

    fn example_soa() -> Vec<u8> {
        let zone = Zone::from_json(EXAMPLE_ZONE.as_bytes()).unwrap();
        encode_soa(zone.soa().unwrap()).unwrap()
    }

    /// Builds a query with ID 0xbeef and the given RD bit and question.
    fn query(rd: bool, qname: &str, qtype: u16, qclass: u16) -> Vec<u8> {
        let flags: u8 = if rd { 0x01 } else { 0x00 };
        let mut octets = vec![0xbe, 0xef, flags, 0, 0, 1, 0, 0, 0, 0, 0, 0];
        name::encode_question_form(qname, &mut octets).unwrap();
        octets.extend_from_slice(&qtype.to_be_bytes());
        octets.extend_from_slice(&qclass.to_be_bytes());
        octets
    }

    fn question_len(qname: &str) -> usize {
        let mut octets = Vec::new();
        name::encode_question_form(qname, &mut octets).unwrap();
        octets.len() + 4
    }

    fn header_of(response: &Response) -> Header {
        Header::decode(&response.octets).unwrap()
    }

    #[test]
    fn a_query_works() {
        let q = query(true, "example.com", 1, 1);
        let response = example_server().build_message(&q).unwrap();
        assert_eq!(response.rcode, Rcode::NoError);

        let header = header_of(&response);
        assert_eq!(header.qdcount, 1);
        assert_eq!(header.ancount, 1);
        assert_eq!(header.nscount, 1);
        assert_eq!(header.arcount, 0);

        let answer_start = HEADER_SIZE + question_len("example.com");
        assert_eq!(&response.octets[HEADER_SIZE..answer_start], &q[HEADER_SIZE..]);
        assert_eq!(
            &response.octets[answer_start..answer_start + 16],
            b"\xc0\x0c\x00\x01\x00\x01\x00\x00\x01\x2c\x00\x04\x01\x02\x03\x04"
        );
        assert_eq!(&response.octets[answer_start + 16..], example_soa());
    }

    #[test]
    fn all_entries_are_answered() {
        let q = query(false, "example.com", 2, 1);
        let response = example_server().build_message(&q).unwrap();
        assert_eq!(response.rcode, Rcode::NoError);
        assert_eq!(header_of(&response).ancount, 2);
    }

    #[test]
    fn header_is_derived_from_query() {
        let mut q = query(true, "example.com", 1, 1);
        // Set the IQUERY opcode and the TC and RA bits.
        q[2] |= 0x0a;
        q[3] |= 0x80;
        let response = example_server().build_message(&q).unwrap();
        let header = header_of(&response);
        assert_eq!(header.id, 0xbeef);
        assert_eq!(
            header.flags,
            Flags {
                qr: true,
                opcode: Opcode::IQuery,
                aa: true,
                tc: false,
                rd: false,
                ra: false,
                rcode: Rcode::NoError,
            }
        );
        assert!(response.recursion_desired);
    }

    #[test]
    fn missing_type_is_name_error() {
        let q = query(true, "example.com", 15, 1);
        let response = example_server().build_message(&q).unwrap();
        assert_eq!(response.rcode, Rcode::NameError);
        let header = header_of(&response);
        assert_eq!(header.flags.rcode, Rcode::NameError);
        assert_eq!(header.ancount, 0);
        assert_eq!(header.nscount, 0);
        assert_eq!(response.octets.len(), HEADER_SIZE + question_len("example.com"));
        assert!(response.should_forward());
    }

    #[test]
    fn no_zones_is_server_failure() {
        let server = Server::new(Resolver::without_zones());
        for (qname, qtype) in [("example.com", 1), ("www.example.org", 6), ("", 2)] {
            let response = server.build_message(&query(true, qname, qtype, 1)).unwrap();
            assert_eq!(response.rcode, Rcode::ServerFailure);
            assert_eq!(header_of(&response).ancount, 0);
            assert!(!response.should_forward());
        }
    }

    #[test]
    fn one_level_subdomains_resolve() {
        let server = example_server();
        let response = server
            .build_message(&query(true, "www.example.com", 1, 1))
            .unwrap();
        assert_eq!(response.rcode, Rcode::NoError);
        assert_eq!(header_of(&response).ancount, 1);

        let response = server
            .build_message(&query(true, "a.b.example.com", 1, 1))
            .unwrap();
        assert_eq!(response.rcode, Rcode::NameError);
        assert_eq!(header_of(&response).ancount, 0);
    }

    #[test]
    fn soa_query_has_no_authority() {
        let response = example_server()
            .build_message(&query(false, "example.com", 6, 1))
            .unwrap();
        assert_eq!(response.rcode, Rcode::NoError);
        let header = header_of(&response);
        assert_eq!(header.ancount, 1);
        assert_eq!(header.nscount, 0);
        let answer_start = HEADER_SIZE + question_len("example.com");
        assert_eq!(&response.octets[answer_start..], example_soa());
    }

    #[test]
    fn zone_without_soa_has_no_authority() {
        let server = server_for(&[
            r#"{"$origin": "example.net", "a": [{"name": "@", "ttl": 1, "value": "10.0.0.1"}]}"#,
        ]);
        let response = server.build_message(&query(false, "example.net", 1, 1)).unwrap();
        assert_eq!(response.rcode, Rcode::NoError);
        assert_eq!(header_of(&response).nscount, 0);
    }

    #[test]
    fn txt_of_255_octets() {
        let zone = format!(
            r#"{{"$origin": "example.com", "txt": [{{"name": "@", "ttl": 1, "value": "{}"}}]}}"#,
            "t".repeat(255)
        );
        let server = server_for(&[zone.as_str()]);
        let response = server.build_message(&query(false, "example.com", 16, 1)).unwrap();
        assert_eq!(response.rcode, Rcode::NoError);
        let rdlength_start = HEADER_SIZE + question_len("example.com") + 10;
        assert_eq!(
            &response.octets[rdlength_start..rdlength_start + 2],
            b"\x01\x00"
        );
    }

    #[test]
    fn bad_zone_data_is_format_error() {
        let server = server_for(&[r#"{
            "$origin": "example.com",
            "soa": {"mname": "a", "rname": "b", "serial": 1, "refresh": 2,
                    "retry": 3, "expire": 4, "minimum": 5},
            "a": [
                {"name": "@", "ttl": 300, "value": "1.2.3.4"},
                {"name": "@", "ttl": "later", "value": "1.2.3.5"}
            ],
            "mx": [{"name": "@", "ttl": 300, "value": "mail.example.com."}],
            "ptr": [{"name": "@", "ttl": 300, "value": "example.com."}]
        }"#]);
        for qtype in [1, 15, 12] {
            let response = server.build_message(&query(false, "example.com", qtype, 1)).unwrap();
            assert_eq!(response.rcode, Rcode::FormatError);
            let header = header_of(&response);
            assert_eq!(header.ancount, 0);
            assert_eq!(header.nscount, 0);
            assert_eq!(response.octets.len(), HEADER_SIZE + question_len("example.com"));
        }
    }

    #[test]
    fn unsupported_qtype_and_qclass_are_format_errors() {
        let server = example_server();
        // AAAA
        let q = query(true, "example.com", 28, 1);
        let response = server.build_message(&q).unwrap();
        assert_eq!(response.rcode, Rcode::FormatError);
        assert_eq!(&response.octets[HEADER_SIZE..], &q[HEADER_SIZE..]);
        // CH
        let q = query(true, "example.com", 1, 3);
        let response = server.build_message(&q).unwrap();
        assert_eq!(response.rcode, Rcode::FormatError);
        assert_eq!(&response.octets[HEADER_SIZE..], &q[HEADER_SIZE..]);
        // An unknown name wins over an unsupported QTYPE.
        let response = server.build_message(&query(true, "example.org", 28, 1)).unwrap();
        assert_eq!(response.rcode, Rcode::NameError);
    }

    #[test]
    fn undecodable_queries_are_errors() {
        let server = example_server();
        let q = query(true, "example.com", 1, 1);
        assert_eq!(server.build_message(&q[..8]).unwrap_err(), Error::HeaderTooShort);
        assert_eq!(
            server.build_message(&q[..q.len() - 1]).unwrap_err(),
            Error::UnexpectedEomInField
        );
        let mut q = q;
        q[2] |= 0x78;
        assert_eq!(server.build_message(&q).unwrap_err(), Error::InvalidOpcode(15));
    }

    #[test]
    fn build_answer_section_reports_outcomes() {
        let server = example_server();
        let question = |qname: &str, qtype: u16| Question {
            qname: qname.to_owned(),
            qtype: qtype.into(),
            qclass: Class::In.into(),
        };

        let answers = server.build_answer_section(&question("example.com", 1)).unwrap();
        assert_eq!(answers.count, 1);
        assert_eq!(answers.zone.origin(), "example.com");
        assert_eq!(
            server.build_answer_section(&question("example.com", 15)).unwrap_err(),
            ProcessingError::NameError
        );
        assert_eq!(
            Server::new(Resolver::without_zones())
                .build_answer_section(&question("example.com", 1))
                .unwrap_err(),
            ProcessingError::ServerFailure
        );
        assert_eq!(Rcode::from(ProcessingError::FormatError), Rcode::FormatError);
    }
}
