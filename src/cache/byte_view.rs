//! Byte View Module
//!
//! Defines the immutable byte payload type handed out by the cache.

use std::fmt;
use std::sync::Arc;

use crate::cache::Weighted;

// == Byte View ==
/// An immutable view of cached bytes.
///
/// The payload is backed by a shared, immutable allocation, so cloning a
/// view is cheap and a caller can never mutate cached state through one.
/// Use [`ByteView::to_vec`] when an owned, independent copy is needed.
#[derive(Clone, PartialEq, Eq)]
pub struct ByteView {
    bytes: Arc<[u8]>,
}

impl ByteView {
    // == Length ==
    /// Returns the view's length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // == As Slice ==
    /// Borrows the underlying bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    // == To Vec ==
    /// Returns an owned, defensive copy of the bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

impl Weighted for ByteView {
    fn weight(&self) -> usize {
        self.len()
    }
}

// == Conversions ==
impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl From<&[u8]> for ByteView {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self {
            bytes: s.as_bytes().into(),
        }
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView({} bytes)", self.len())
    }
}
