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

//! Implementation of the [`Class`] type for DNS classes.

use std::fmt;
use std::str::FromStr;

use crate::util::Caseless;

/// Represents a class in the DNS.
///
/// A class is represented on the wire as an unsigned 16-bit integer.
/// This server only ever serves the Internet class, so the enumeration
/// is closed over [`IN`](Class::In); other wire values fail to convert
/// (see [`IntoClassError`]).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Class {
    In,
}

impl TryFrom<u16> for Class {
    type Error = IntoClassError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::In),
            _ => Err(IntoClassError),
        }
    }
}

impl From<Class> for u16 {
    fn from(class: Class) -> Self {
        match class {
            Class::In => 1,
        }
    }
}

impl FromStr for Class {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if Caseless(text) == Caseless("IN") {
            Ok(Self::In)
        } else {
            Err("unknown class")
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::In => f.write_str("IN"),
        }
    }
}

/// An error signaling that the provided value is not a supported
/// class.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct IntoClassError;

impl fmt::Display for IntoClassError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("not a supported class")
    }
}

impl std::error::Error for IntoClassError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_in_converts() {
        assert_eq!(Class::try_from(1), Ok(Class::In));
        assert_eq!(Class::try_from(3), Err(IntoClassError));
        assert_eq!(u16::from(Class::In), 1);
    }

    #[test]
    fn parses_and_displays() {
        let class: Class = "in".parse().unwrap();
        assert_eq!(class, Class::In);
        assert_eq!(class.to_string(), "IN");
        assert!("CH".parse::<Class>().is_err());
    }
}
