//! ezballot-core: a single-record election ledger.
//!
//! The whole election (voter roll, ballots, tallies and the open/closed
//! phase) lives in one record under one key of an external key-value store.
//! [`Election`] applies each operation as an atomic read-modify-write on that
//! record:
//! - `initialize`, `open_voting`, `publish_results` move between phases and
//!   are checked by an [`AccessPolicy`]
//! - `register_voter`, `register_candidate`, `cast_vote` mutate the roll and
//!   tallies while voting is open
//! - `list_voters`, `list_candidates`, `results` read it back

mod codec;
mod config;
mod error;
mod identity;
mod machine;
pub mod policy;
mod record;
mod store;
mod version;

pub use codec::Encoding;
pub use config::{CandidateListing, ElectionConfig};
pub use error::{Error, StoreError};
pub use identity::{EncodedIdentity, FixedIdentity, IdentityProvider};
pub use machine::{Election, ElectionSummary, Phase, Registrant, Tally};
pub use policy::{AccessPolicy, AdminList, AllowAll, Privilege};
pub use record::{ElectionRecord, Identity};
pub use store::{KeyValueStore, MemoryStore};
pub use version::Version;
