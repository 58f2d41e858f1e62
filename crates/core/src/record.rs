//! The election record.
//!
//! One record holds the whole election: roll, ballots, tallies and phase.
//! Field names on the wire are fixed so existing ledgers keep decoding.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Voter and candidate identity as resolved by the identity provider.
pub type Identity = String;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionRecord {
    /// Identities that have cast a ballot. Entries are never unset.
    #[serde(rename = "isvoted")]
    pub voted: BTreeMap<Identity, bool>,

    /// Candidate identity to tally.
    #[serde(rename = "candidates")]
    pub candidates: BTreeMap<Identity, u64>,

    /// Winner recorded by the last publish.
    #[serde(rename = "topcandidate")]
    pub top_candidate: String,

    #[serde(rename = "isvoteon")]
    pub voting_open: bool,

    /// Voter identity to registration sequence number, starting at 1.
    #[serde(rename = "voters")]
    pub voters: BTreeMap<Identity, u64>,

    #[serde(rename = "votercount")]
    pub voter_count: u64,

    /// Set once results have been published. Omitted while false.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub published: bool,
}

impl ElectionRecord {
    /// The zero record written by initialization.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_voter(&self, id: &str) -> bool {
        self.voters.contains_key(id)
    }

    pub fn is_candidate(&self, id: &str) -> bool {
        self.candidates.contains_key(id)
    }

    pub fn has_voted(&self, id: &str) -> bool {
        self.voted.get(id).copied().unwrap_or(false)
    }

    /// Registration sequence number of a voter.
    pub fn sequence_of(&self, id: &str) -> Option<u64> {
        self.voters.get(id).copied()
    }

    /// Add `id` to the voter roll with the next sequence number.
    pub fn enroll(&mut self, id: &str) -> Result<u64, Error> {
        if self.is_voter(id) {
            return Err(Error::AlreadyRegistered(id.to_string()));
        }
        let seq = self.voter_count + 1;
        self.voters.insert(id.to_string(), seq);
        self.voter_count = seq;
        Ok(seq)
    }

    /// Number of identities marked as having voted.
    pub fn ballots_cast(&self) -> u64 {
        self.voted.values().filter(|v| **v).count() as u64
    }

    /// Tallies ordered from first to last place.
    ///
    /// Higher counts come first. Equal counts fall back to registration
    /// order; identities that never registered as voters rank after all that
    /// did, alphabetically.
    pub fn ranking(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .candidates
            .iter()
            .map(|(id, count)| (id.as_str(), *count))
            .collect();
        ranked.sort_by(|(a, a_count), (b, b_count)| {
            b_count
                .cmp(a_count)
                .then_with(|| self.registration_key(a).cmp(&self.registration_key(b)))
        });
        ranked
    }

    /// The leading candidate, if any candidate has received a vote.
    pub fn winner(&self) -> Option<&str> {
        self.ranking()
            .into_iter()
            .next()
            .filter(|(_, count)| *count > 0)
            .map(|(id, _)| id)
    }

    fn registration_key<'a>(&self, id: &'a str) -> (u64, &'a str) {
        (self.sequence_of(id).unwrap_or(u64::MAX), id)
    }

    /// Validate the roll and tally invariants of a decoded record.
    pub fn check_invariants(&self) -> Result<(), Error> {
        if self.voters.len() as u64 != self.voter_count {
            return Err(Error::CorruptRecord(format!(
                "votercount is {} but {} voters are registered",
                self.voter_count,
                self.voters.len()
            )));
        }

        let mut seen = BTreeSet::new();
        for (id, seq) in &self.voters {
            if *seq == 0 || *seq > self.voter_count {
                return Err(Error::CorruptRecord(format!(
                    "voter {id} has sequence {seq} outside 1..={}",
                    self.voter_count
                )));
            }
            if !seen.insert(*seq) {
                return Err(Error::CorruptRecord(format!(
                    "sequence {seq} assigned more than once"
                )));
            }
        }

        let tallied = self
            .candidates
            .values()
            .try_fold(0u64, |acc, votes| acc.checked_add(*votes))
            .ok_or_else(|| Error::CorruptRecord("candidate tallies overflow".into()))?;
        let cast = self.ballots_cast();
        if tallied > cast {
            return Err(Error::CorruptRecord(format!(
                "{tallied} votes tallied but only {cast} ballots cast"
            )));
        }

        Ok(())
    }
}
