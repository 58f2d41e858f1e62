//! Content versions for stored records, using BLAKE3.
//!
//! A version is the digest of the exact bytes held by the store. Writers
//! pass the version they read to
//! [`KeyValueStore::compare_and_swap`](crate::KeyValueStore::compare_and_swap),
//! which refuses the write if the stored bytes changed in between.

use std::fmt;

/// A 32-byte BLAKE3 digest of a stored value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version(pub [u8; 32]);

impl Version {
    /// Version of a stored byte string.
    pub fn of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
