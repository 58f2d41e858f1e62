//! Error types for ezballot-core.

use thiserror::Error;

use crate::policy::Privilege;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// No election record exists under the configured key.
    #[error("election record not initialized")]
    NotInitialized,

    /// The operation requires voting to be open.
    #[error("voting is not open")]
    VotingClosed,

    /// The caller is already on the voter roll.
    #[error("{0} is already registered as a voter")]
    AlreadyRegistered(String),

    /// The caller has already cast a ballot.
    #[error("{0} has already voted")]
    AlreadyVoted(String),

    /// The ballot names a candidate that never registered and write-ins are disabled.
    #[error("unknown candidate: {0}")]
    UnknownCandidate(String),

    /// The caller must be a registered voter to cast a ballot.
    #[error("{0} is not a registered voter")]
    NotRegistered(String),

    /// The access policy refused a privileged action.
    #[error("{caller} is not permitted to {action}")]
    Unauthorized { caller: String, action: Privilege },

    /// The caller identity could not be resolved.
    #[error("identity error: {0}")]
    Identity(String),

    /// The stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The stored record decoded but violates a record invariant.
    #[error("corrupt election record: {0}")]
    CorruptRecord(String),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Every compare-and-swap attempt lost to a concurrent writer.
    #[error("gave up after {attempts} conflicting writes")]
    Conflict { attempts: u32 },

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Errors raised by a [`KeyValueStore`](crate::KeyValueStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Internal store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<ciborium::ser::Error<std::io::Error>> for Error {
    fn from(e: ciborium::ser::Error<std::io::Error>) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<ciborium::de::Error<std::io::Error>> for Error {
    fn from(e: ciborium::de::Error<std::io::Error>) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}
