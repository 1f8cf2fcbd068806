// Copyright 2021 Matthew Ingwersen.
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

//! Encoding and decoding of domain names.
//!
//! Domain names are handled as dot-separated text: labels are joined
//! with `.`, case is preserved, and there is no trailing dot for the
//! final (null) label. On the wire, [RFC 1035 § 3.1] represents a name
//! as a sequence of labels, each a length octet followed by that many
//! octets, ended by the zero-length null label.
//!
//! Two encoders are provided:
//!
//! * [`encode_question_form`] writes the full representation, null
//!   label included. It is used for the question section.
//! * [`encode_record_form`] writes each dot-separated label but does
//!   *not* append the null label. It is used for owner-name prefixes
//!   and for names inside RDATA. A name given with a trailing dot
//!   (e.g. `ns1.example.com.`) ends in an empty label, which is written
//!   as a zero length octet and therefore still comes out terminated.
//!
//! [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1

mod error;
pub use error::Error;

/// The maximum length of the on-the-wire representation of a domain
/// name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
pub const MAX_LABEL_LEN: usize = 63;

/// The two high bits of a length octet that mark a compression
/// pointer.
const POINTER_BITS: u8 = 0xc0;

////////////////////////////////////////////////////////////////////////
// DECODING                                                           //
////////////////////////////////////////////////////////////////////////

/// Decodes the uncompressed name that starts at index `start` of
/// `octets`.
///
/// On success, returns the dot-joined name and the index immediately
/// past the terminating null label. The root name decodes to the empty
/// string.
pub fn decode(octets: &[u8], start: usize) -> Result<(String, usize), Error> {
    let mut name = String::new();
    let mut offset = start;
    loop {
        let label_len = *octets.get(offset).ok_or(Error::UnexpectedEom)?;
        if label_len == 0 {
            return Ok((name, offset + 1));
        } else if label_len & POINTER_BITS == POINTER_BITS {
            return Err(Error::CompressedName);
        } else if label_len as usize > MAX_LABEL_LEN {
            return Err(Error::LabelTooLong);
        }

        let label_start = offset + 1;
        let label_end = label_start + label_len as usize;
        if label_end - start >= MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        }
        let label = octets
            .get(label_start..label_end)
            .ok_or(Error::UnexpectedEom)?;
        let label = std::str::from_utf8(label).map_err(|_| Error::InvalidUtf8)?;
        if !name.is_empty() {
            name.push('.');
        }
        name.push_str(label);
        offset = label_end;
    }
}

////////////////////////////////////////////////////////////////////////
// ENCODING                                                           //
////////////////////////////////////////////////////////////////////////

/// Appends the question-form encoding of `name` to `out`: every label,
/// then the null label.
///
/// One trailing dot is accepted and ignored, and the empty string is
/// the root name. Empty labels anywhere else are rejected, since they
/// would terminate the name early.
pub fn encode_question_form(name: &str, out: &mut Vec<u8>) -> Result<(), Error> {
    let name = name.strip_suffix('.').unwrap_or(name);
    let start = out.len();
    if !name.is_empty() {
        for label in name.split('.') {
            if label.is_empty() {
                out.truncate(start);
                return Err(Error::EmptyLabel);
            }
            if let Err(e) = push_label(label, out) {
                out.truncate(start);
                return Err(e);
            }
        }
    }
    out.push(0);
    if out.len() - start > MAX_WIRE_LEN {
        out.truncate(start);
        return Err(Error::NameTooLong);
    }
    Ok(())
}

/// Appends the record-form encoding of `name` to `out`: every
/// dot-separated label, *without* a null label at the end.
///
/// Empty labels are written as a zero length octet, so a trailing dot
/// produces a terminated name.
pub fn encode_record_form(name: &str, out: &mut Vec<u8>) -> Result<(), Error> {
    let start = out.len();
    for label in name.split('.') {
        if let Err(e) = push_label(label, out) {
            out.truncate(start);
            return Err(e);
        }
    }
    Ok(())
}

/// Writes a single label (length octet and data) to `out`.
fn push_label(label: &str, out: &mut Vec<u8>) -> Result<(), Error> {
    let len = label.len();
    if len > MAX_LABEL_LEN {
        Err(Error::LabelTooLong)
    } else {
        out.push(len as u8);
        out.extend_from_slice(label.as_bytes());
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    const WWW_EXAMPLE_COM: &[u8] = b"\x03www\x07example\x03com\x00";

    #[test]
    fn decode_works() {
        let (name, end) = decode(WWW_EXAMPLE_COM, 0).unwrap();
        assert_eq!(name, "www.example.com");
        assert_eq!(end, WWW_EXAMPLE_COM.len());
    }

    #[test]
    fn decode_respects_start_and_ignores_trailing_data() {
        let mut buf = b"\xff\xff".to_vec();
        buf.extend_from_slice(WWW_EXAMPLE_COM);
        buf.extend_from_slice(b"\x00\x01\x00\x01");
        let (name, end) = decode(&buf, 2).unwrap();
        assert_eq!(name, "www.example.com");
        assert_eq!(end, 2 + WWW_EXAMPLE_COM.len());
    }

    #[test]
    fn decode_preserves_case() {
        let (name, _) = decode(b"\x03WwW\x07ExAmPlE\x03cOm\x00", 0).unwrap();
        assert_eq!(name, "WwW.ExAmPlE.cOm");
    }

    #[test]
    fn decode_handles_root() {
        assert_eq!(decode(b"\x00", 0), Ok((String::new(), 1)));
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert_eq!(decode(b"", 0), Err(Error::UnexpectedEom));
        assert_eq!(decode(b"\x03ww", 0), Err(Error::UnexpectedEom));
        assert_eq!(decode(b"\x03www", 0), Err(Error::UnexpectedEom));
        assert_eq!(decode(b"\xc0\x0c", 0), Err(Error::CompressedName));
        assert_eq!(decode(b"\x40", 0), Err(Error::LabelTooLong));
        assert_eq!(decode(b"\x02\xff\xfe\x00", 0), Err(Error::InvalidUtf8));
    }

    #[test]
    fn decode_rejects_overlong_names() {
        let mut buf = Vec::new();
        for _ in 0..5 {
            buf.push(63);
            buf.extend_from_slice(&[b'a'; 63]);
        }
        buf.push(0);
        assert_eq!(decode(&buf, 0), Err(Error::NameTooLong));
    }

    #[test]
    fn question_form_round_trips() {
        let longest_label = "x".repeat(MAX_LABEL_LEN);
        let names = [
            "example.com",
            "www.example.com",
            "a.b.c.d.e.f",
            "xn--bcher-kva.example",
            longest_label.as_str(),
        ];
        for name in names {
            let mut buf = Vec::new();
            encode_question_form(name, &mut buf).unwrap();
            assert_eq!(decode(&buf, 0), Ok((name.to_owned(), buf.len())));
        }
    }

    #[test]
    fn question_form_is_terminated() {
        let mut buf = Vec::new();
        encode_question_form("www.example.com", &mut buf).unwrap();
        assert_eq!(buf, WWW_EXAMPLE_COM);
    }

    #[test]
    fn question_form_handles_root_and_trailing_dot() {
        let mut buf = Vec::new();
        encode_question_form("", &mut buf).unwrap();
        assert_eq!(buf, b"\x00");

        let mut buf = Vec::new();
        encode_question_form("www.example.com.", &mut buf).unwrap();
        assert_eq!(buf, WWW_EXAMPLE_COM);
    }

    #[test]
    fn question_form_rejects_bad_labels_without_writing() {
        let mut buf = b"\xaa".to_vec();
        assert_eq!(
            encode_question_form("a..b", &mut buf),
            Err(Error::EmptyLabel)
        );
        let long = format!("{}.com", "x".repeat(MAX_LABEL_LEN + 1));
        assert_eq!(
            encode_question_form(&long, &mut buf),
            Err(Error::LabelTooLong)
        );
        assert_eq!(buf, b"\xaa");
    }

    #[test]
    fn record_form_is_not_terminated() {
        let mut buf = Vec::new();
        encode_record_form("ns1.example.com", &mut buf).unwrap();
        assert_eq!(buf, b"\x03ns1\x07example\x03com");
    }

    #[test]
    fn record_form_with_trailing_dot_is_terminated() {
        let mut buf = Vec::new();
        encode_record_form("ns1.example.com.", &mut buf).unwrap();
        assert_eq!(buf, b"\x03ns1\x07example\x03com\x00");
    }

    #[test]
    fn record_form_rejects_long_labels() {
        let mut buf = Vec::new();
        let long = "y".repeat(MAX_LABEL_LEN + 1);
        assert_eq!(encode_record_form(&long, &mut buf), Err(Error::LabelTooLong));
        assert!(buf.is_empty());
    }
}
