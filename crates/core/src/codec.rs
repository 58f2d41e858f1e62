//! Stored record encodings.

use serde::{Deserialize, Serialize};

use crate::{ElectionRecord, Error};

/// How the election record is laid out in the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// JSON document with the `isvoted`/`candidates`/... field names.
    #[default]
    Json,
    /// CBOR with the same field names.
    Cbor,
}

impl Encoding {
    pub fn encode(self, record: &ElectionRecord) -> Result<Vec<u8>, Error> {
        match self {
            Encoding::Json => Ok(serde_json::to_vec(record)?),
            Encoding::Cbor => {
                let mut buf = Vec::new();
                ciborium::into_writer(record, &mut buf)?;
                Ok(buf)
            }
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<ElectionRecord, Error> {
        match self {
            Encoding::Json => Ok(serde_json::from_slice(bytes)?),
            Encoding::Cbor => Ok(ciborium::from_reader(bytes)?),
        }
    }
}
