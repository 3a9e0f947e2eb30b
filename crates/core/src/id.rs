// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inline, `Copy`-able ID buffer and the `define_id!` macro that generates
//! strongly-typed entity identifiers on top of it.
//!
//! Every entity ID in this workspace is `prefix-<12 nanoid chars>`, stored
//! inline (no heap allocation, no `Arc`) so IDs can be freely copied across
//! mailboxes and event payloads.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

const NANOID_LEN: usize = 12;
const NANOID_ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b',
    'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u',
    'v', 'w', 'x', 'y', 'z', '_', '-',
];

/// An inline, fixed-capacity string buffer sized for `prefix-<12 chars>` IDs.
///
/// `Copy` so IDs can move through channels and event payloads without
/// allocation; degrades to heap-free `Display`/`Hash`/`Borrow<str>` just like
/// a `String` would.
#[derive(Clone, Copy)]
pub struct IdBuf {
    bytes: [u8; 23],
    len: u8,
}

impl IdBuf {
    pub fn new(s: &str) -> Self {
        let mut bytes = [0u8; 23];
        let len = s.len().min(23);
        bytes[..len].copy_from_slice(&s.as_bytes()[..len]);
        Self { bytes, len: len as u8 }
    }

    pub fn as_str(&self) -> &str {
        // Safe: only ever constructed from valid UTF-8 (`&str`) input.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for IdBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PartialEq for IdBuf {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
impl Eq for IdBuf {}

impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for IdBuf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IdBuf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(IdBuf::new(&s))
    }
}

/// Generate a random `prefix-<12 char>` id string using the workspace alphabet.
pub fn generate(prefix: &str) -> String {
    let suffix = nanoid::nanoid!(NANOID_LEN, &NANOID_ALPHABET);
    format!("{prefix}{suffix}")
}

/// Generate a newtype wrapping [`IdBuf`] with a fixed string prefix.
///
/// ```ignore
/// define_id! {
///     /// Unique identifier for an agent.
///     pub struct AgentId("agt-");
/// }
/// ```
///
/// A bare `pub struct Foo;` (no prefix literal) defaults the prefix to the
/// lowercased type name plus a dash, e.g. `JobId` -> `"jobid-"`.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:expr);
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name($crate::id::IdBuf);

        impl $name {
            /// Generate a fresh random id with this type's prefix.
            pub fn generate() -> Self {
                Self($crate::id::IdBuf::new(&$crate::id::generate($prefix)))
            }

            /// Wrap an existing string (e.g. one read back from storage) without
            /// re-deriving it. Does not validate the prefix.
            pub fn from_string(s: &str) -> Self {
                Self($crate::id::IdBuf::new(s))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0.as_str())
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::std::convert::Infallible;
            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                Ok(Self::from_string(s))
            }
        }

        impl ::std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(&s)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
