//! Election configuration.
//!
//! ```toml
//! record_key = "1"
//! encoding = "json"
//! allow_write_ins = true
//! require_registration = false
//! candidate_listing = "voter-sequence"
//! max_retries = 8
//! admins = []
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::Encoding;
use crate::policy::{AccessPolicy, AdminList, AllowAll};
use crate::Error;

/// What number `list_candidates` reports next to each candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateListing {
    /// The candidate's voter registration sequence number.
    #[default]
    VoterSequence,
    /// The candidate's current tally.
    VoteCount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionConfig {
    /// Store key holding the election record.
    pub record_key: String,

    /// Encoding used for the stored record.
    pub encoding: Encoding,

    /// Accept ballots for identities that never registered as candidates.
    pub allow_write_ins: bool,

    /// Only registered voters may cast ballots.
    pub require_registration: bool,

    pub candidate_listing: CandidateListing,

    /// Compare-and-swap attempts per operation before giving up.
    pub max_retries: u32,

    /// Identities allowed to initialize, open and publish. Empty means anyone.
    pub admins: Vec<String>,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            record_key: "1".to_string(),
            encoding: Encoding::Json,
            allow_write_ins: true,
            require_registration: false,
            candidate_listing: CandidateListing::VoterSequence,
            max_retries: 8,
            admins: Vec::new(),
        }
    }
}

impl ElectionConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.as_ref().display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content).map_err(|e| {
            Error::Config(format!("failed to write {}: {e}", path.as_ref().display()))
        })
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: ElectionConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.record_key.is_empty() {
            return Err(Error::Config("record_key must not be empty".into()));
        }
        if self.max_retries == 0 {
            return Err(Error::Config("max_retries must be at least 1".into()));
        }
        Ok(())
    }

    /// The access policy implied by `admins`.
    pub fn access_policy(&self) -> Box<dyn AccessPolicy> {
        if self.admins.is_empty() {
            Box::new(AllowAll)
        } else {
            Box::new(AdminList::new(self.admins.iter().cloned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Privilege;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ElectionConfig::from_toml_str("").unwrap();
        assert_eq!(config, ElectionConfig::default());
        assert_eq!(config.record_key, "1");
        assert!(config.allow_write_ins);
    }

    #[test]
    fn parse_full_document() {
        let config = ElectionConfig::from_toml_str(
            r#"
            record_key = "election-2026"
            encoding = "cbor"
            allow_write_ins = false
            require_registration = true
            candidate_listing = "vote-count"
            max_retries = 3
            admins = ["registrar"]
            "#,
        )
        .unwrap();

        assert_eq!(config.record_key, "election-2026");
        assert_eq!(config.encoding, Encoding::Cbor);
        assert!(!config.allow_write_ins);
        assert!(config.require_registration);
        assert_eq!(config.candidate_listing, CandidateListing::VoteCount);
        assert_eq!(config.max_retries, 3);

        let policy = config.access_policy();
        assert!(policy.authorize("registrar", Privilege::OpenVoting).is_ok());
        assert!(policy.authorize("alice", Privilege::OpenVoting).is_err());
    }

    #[test]
    fn rejects_zero_retries() {
        let err = ElectionConfig::from_toml_str("max_retries = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_unknown_encoding() {
        let err = ElectionConfig::from_toml_str(r#"encoding = "xml""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("election.toml");

        let config = ElectionConfig {
            admins: vec!["registrar".into()],
            encoding: Encoding::Cbor,
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(ElectionConfig::load(&path).unwrap(), config);
    }
}
