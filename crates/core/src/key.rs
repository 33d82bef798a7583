//! Object key construction
//!
//! The object store has no directories. Folders are modelled with key prefixes
//! joined by `/` and, optionally, a zero-length marker object at `<prefix>/`.

use std::fmt;

use crate::error::{Error, Result};

/// Target prefixes that mean "the root of the bucket"
pub const ROOT_SENTINELS: [&str; 4] = ["", ".", "/", "./"];

/// Check whether a target prefix is one of the root sentinels
pub fn is_root_sentinel(prefix: &str) -> bool {
    ROOT_SENTINELS.contains(&prefix)
}

/// Normalise a target prefix
///
/// Returns `None` when the prefix resolves to the bucket root. Empty segments
/// are dropped so joined keys never contain `//` or start with `/`.
pub fn normalize_prefix(prefix: &str) -> Option<String> {
    if is_root_sentinel(prefix) {
        return None;
    }
    let collapsed = prefix
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if is_root_sentinel(&collapsed) {
        None
    } else {
        Some(collapsed)
    }
}

/// Join a prefix and an entry name into an object key
pub fn join_key(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}/{name}"),
        _ => name.to_string(),
    }
}

/// Key of the directory marker object for a prefix
pub fn marker_key(prefix: &str) -> String {
    format!("{prefix}/")
}

/// Last path component of an object key
///
/// Used as the default local file name when downloading.
pub fn key_basename(key: &str) -> &str {
    key.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(key)
}

/// A byte range within an object
///
/// A `length` of zero reads to the end of the object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Whether this range covers the whole object
    pub fn is_full(&self) -> bool {
        self.offset == 0 && self.length == 0
    }

    /// Offset of the last byte, or `None` for an open-ended range
    pub fn last_byte(&self) -> Option<u64> {
        match self.length {
            0 => None,
            n => Some(self.offset.saturating_add(n - 1)),
        }
    }

    /// Reject a range that ends past the largest addressable offset
    pub fn validate(&self) -> Result<()> {
        if self.length > 0 && self.offset.checked_add(self.length - 1).is_none() {
            return Err(Error::InvalidInput(format!(
                "Byte range out of bounds: offset {} with length {}",
                self.offset, self.length
            )));
        }
        Ok(())
    }

    /// Value for the HTTP `Range` header, or `None` for the whole object
    pub fn to_header(&self) -> Option<String> {
        if self.is_full() {
            return None;
        }
        Some(self.to_string())
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_byte() {
            Some(last) => write!(f, "bytes={}-{last}", self.offset),
            None => write!(f, "bytes={}-", self.offset),
        }
    }
}
