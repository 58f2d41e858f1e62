//! The election state machine.
//!
//! Every operation is a read → validate → mutate → write cycle on the single
//! election record. Writes go through the store's compare-and-swap; when a
//! concurrent writer wins, the whole cycle is rerun against the fresh record
//! so that preconditions are always checked against what is actually stored.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CandidateListing;
use crate::policy::{AccessPolicy, Privilege};
use crate::{ElectionConfig, ElectionRecord, Error, Identity, IdentityProvider, KeyValueStore, Version};

/// Coarse lifecycle position of the election.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// No record in the store.
    Uninitialized,
    /// Record exists, voting has not been opened.
    Created,
    /// Registrations and ballots are accepted.
    Open,
    /// Results have been published.
    Closed,
}

/// One row of a voter or candidate listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Registrant {
    #[serde(rename = "clientid")]
    pub id: Identity,
    #[serde(rename = "numid")]
    pub number: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub candidate: Identity,
    pub votes: u64,
}

/// Read-only snapshot of the outcome, available in every phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ElectionSummary {
    pub phase: Phase,
    pub top_candidate: String,
    pub voter_count: u64,
    pub ballots_cast: u64,
    /// Candidates from first to last place.
    pub tallies: Vec<Tally>,
}

/// The election state machine over a key-value store.
pub struct Election<S> {
    store: S,
    config: ElectionConfig,
    policy: Box<dyn AccessPolicy>,
}

impl<S: KeyValueStore> Election<S> {
    /// Create a state machine with the default configuration.
    pub fn new(store: S) -> Self {
        Self::assemble(store, ElectionConfig::default())
    }

    /// Create a state machine; the access policy follows `config.admins`.
    pub fn with_config(store: S, config: ElectionConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::assemble(store, config))
    }

    fn assemble(store: S, config: ElectionConfig) -> Self {
        let policy = config.access_policy();
        Self {
            store,
            config,
            policy,
        }
    }

    /// Replace the access policy.
    pub fn with_policy<P: AccessPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Phase control
    // -------------------------------------------------------------------------

    /// Write a fresh, empty election record.
    ///
    /// An existing record is overwritten without warning, discarding the
    /// whole election. Check [`Election::is_initialized`] first if that is
    /// not intended.
    pub fn initialize<I>(&self, caller: &I) -> Result<(), Error>
    where
        I: IdentityProvider + ?Sized,
    {
        let caller = caller.caller_identity()?;
        debug!(%caller, "initialize");
        self.policy.authorize(&caller, Privilege::Initialize)?;

        let bytes = self.config.encoding.encode(&ElectionRecord::new())?;
        self.store.put(&self.config.record_key, bytes)?;

        info!(key = %self.config.record_key, "election record initialized");
        Ok(())
    }

    /// Start accepting registrations and ballots.
    ///
    /// There is no phase check: this also reopens a published election.
    pub fn open_voting<I>(&self, caller: &I) -> Result<(), Error>
    where
        I: IdentityProvider + ?Sized,
    {
        let caller = caller.caller_identity()?;
        debug!(%caller, "open_voting");
        self.policy.authorize(&caller, Privilege::OpenVoting)?;

        self.transact("open_voting", |record| {
            record.voting_open = true;
            Ok(())
        })?;

        info!("voting opened");
        Ok(())
    }

    /// Tally the ballots, close voting and record the winner.
    ///
    /// Returns the winning identity, or an empty string if no candidate
    /// received a vote.
    pub fn publish_results<I>(&self, caller: &I) -> Result<Identity, Error>
    where
        I: IdentityProvider + ?Sized,
    {
        let caller = caller.caller_identity()?;
        debug!(%caller, "publish_results");
        self.policy.authorize(&caller, Privilege::PublishResults)?;

        let winner = self.transact("publish_results", |record| {
            ensure_open(record)?;
            let winner = record.winner().unwrap_or_default().to_string();
            record.voting_open = false;
            record.published = true;
            record.top_candidate = winner.clone();
            Ok(winner)
        })?;

        info!(%winner, "results published, voting closed");
        Ok(winner)
    }

    // -------------------------------------------------------------------------
    // Registration and voting
    // -------------------------------------------------------------------------

    /// Add the caller to the voter roll. Returns the assigned sequence number.
    pub fn register_voter<I>(&self, caller: &I) -> Result<u64, Error>
    where
        I: IdentityProvider + ?Sized,
    {
        let caller = caller.caller_identity()?;
        debug!(%caller, "register_voter");

        let seq = self.transact("register_voter", |record| {
            ensure_open(record)?;
            record.enroll(&caller)
        })?;

        info!(%caller, seq, "voter registered");
        Ok(seq)
    }

    /// Register the caller as a candidate, enrolling them as a voter first
    /// if needed. Re-registering resets the candidate's tally to zero.
    pub fn register_candidate<I>(&self, caller: &I) -> Result<Identity, Error>
    where
        I: IdentityProvider + ?Sized,
    {
        let caller = caller.caller_identity()?;
        debug!(%caller, "register_candidate");

        self.transact("register_candidate", |record| {
            ensure_open(record)?;
            if !record.is_voter(&caller) {
                let seq = record.enroll(&caller)?;
                debug!(%caller, seq, "candidate enrolled as voter");
            }
            record.candidates.insert(caller.clone(), 0);
            Ok(())
        })?;

        info!(%caller, "candidate registered");
        Ok(caller)
    }

    /// Record the caller's ballot for `candidate`.
    pub fn cast_vote<I>(&self, caller: &I, candidate: &str) -> Result<(), Error>
    where
        I: IdentityProvider + ?Sized,
    {
        let caller = caller.caller_identity()?;
        debug!(%caller, %candidate, "cast_vote");

        self.transact("cast_vote", |record| {
            ensure_open(record)?;
            if record.has_voted(&caller) {
                return Err(Error::AlreadyVoted(caller.clone()));
            }
            if self.config.require_registration && !record.is_voter(&caller) {
                return Err(Error::NotRegistered(caller.clone()));
            }
            if !self.config.allow_write_ins && !record.is_candidate(candidate) {
                return Err(Error::UnknownCandidate(candidate.to_string()));
            }

            *record.candidates.entry(candidate.to_string()).or_insert(0) += 1;
            record.voted.insert(caller.clone(), true);
            Ok(())
        })?;

        info!(%caller, "vote recorded");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Registered voters in registration order. Only while voting is open.
    pub fn list_voters(&self) -> Result<Vec<Registrant>, Error> {
        let record = self.open_record()?;

        let mut voters: Vec<Registrant> = record
            .voters
            .into_iter()
            .map(|(id, number)| Registrant { id, number })
            .collect();
        voters.sort_by_key(|r| r.number);
        Ok(voters)
    }

    /// Registered candidates. Only while voting is open.
    ///
    /// By default the number reported for each candidate is their voter
    /// sequence number (0 for write-ins), not their tally; see
    /// [`CandidateListing`].
    pub fn list_candidates(&self) -> Result<Vec<Registrant>, Error> {
        let record = self.open_record()?;

        let mut candidates: Vec<(u64, Registrant)> = record
            .candidates
            .iter()
            .map(|(id, votes)| {
                let seq = record.sequence_of(id);
                let number = match self.config.candidate_listing {
                    CandidateListing::VoterSequence => seq.unwrap_or(0),
                    CandidateListing::VoteCount => *votes,
                };
                let row = Registrant {
                    id: id.clone(),
                    number,
                };
                (seq.unwrap_or(u64::MAX), row)
            })
            .collect();
        candidates.sort_by(|(a_seq, a), (b_seq, b)| a_seq.cmp(b_seq).then_with(|| a.id.cmp(&b.id)));
        Ok(candidates.into_iter().map(|(_, row)| row).collect())
    }

    /// Outcome snapshot; unlike the listings this works in every phase.
    pub fn results(&self) -> Result<ElectionSummary, Error> {
        let record = self.record()?;
        let phase = phase_of(Some(&record));

        let tallies = record
            .ranking()
            .into_iter()
            .map(|(candidate, votes)| Tally {
                candidate: candidate.to_string(),
                votes,
            })
            .collect();

        Ok(ElectionSummary {
            phase,
            top_candidate: record.top_candidate.clone(),
            voter_count: record.voter_count,
            ballots_cast: record.ballots_cast(),
            tallies,
        })
    }

    pub fn phase(&self) -> Result<Phase, Error> {
        let loaded = self.load()?;
        Ok(phase_of(loaded.as_ref().map(|(record, _)| record)))
    }

    pub fn is_initialized(&self) -> Result<bool, Error> {
        Ok(self.store.get(&self.config.record_key)?.is_some())
    }

    /// The stored record.
    pub fn record(&self) -> Result<ElectionRecord, Error> {
        self.load()?
            .map(|(record, _)| record)
            .ok_or(Error::NotInitialized)
    }

    // -------------------------------------------------------------------------
    // Store access
    // -------------------------------------------------------------------------

    fn load(&self) -> Result<Option<(ElectionRecord, Version)>, Error> {
        let Some(bytes) = self.store.get(&self.config.record_key)? else {
            return Ok(None);
        };
        let record = self.config.encoding.decode(&bytes)?;
        record.check_invariants()?;
        Ok(Some((record, Version::of(&bytes))))
    }

    fn open_record(&self) -> Result<ElectionRecord, Error> {
        let record = self.record()?;
        ensure_open(&record)?;
        Ok(record)
    }

    /// Run `apply` against the stored record and write the result back,
    /// retrying from a fresh read when another writer got in first.
    fn transact<T, F>(&self, op: &'static str, mut apply: F) -> Result<T, Error>
    where
        F: FnMut(&mut ElectionRecord) -> Result<T, Error>,
    {
        let key = &self.config.record_key;

        for attempt in 1..=self.config.max_retries {
            let (mut record, version) = self.load()?.ok_or(Error::NotInitialized)?;
            let out = apply(&mut record)?;

            let bytes = self.config.encoding.encode(&record)?;
            if self.store.compare_and_swap(key, Some(version), bytes)? {
                return Ok(out);
            }
            warn!(op, attempt, %version, "election record changed underneath, retrying");
        }

        Err(Error::Conflict {
            attempts: self.config.max_retries,
        })
    }
}

fn ensure_open(record: &ElectionRecord) -> Result<(), Error> {
    if record.voting_open {
        Ok(())
    } else {
        Err(Error::VotingClosed)
    }
}

fn phase_of(record: Option<&ElectionRecord>) -> Phase {
    match record {
        None => Phase::Uninitialized,
        Some(r) if r.voting_open => Phase::Open,
        Some(r) if r.published => Phase::Closed,
        Some(_) => Phase::Created,
    }
}
