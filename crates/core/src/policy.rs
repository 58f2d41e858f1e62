//! Access control for phase-changing actions.
//!
//! Voter and candidate operations are open to any authenticated caller.
//! The actions in [`Privilege`] move the election between phases and pass
//! through an [`AccessPolicy`] first.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An action that changes the election phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Privilege {
    /// Create or reset the election record.
    Initialize,
    /// Start accepting registrations and ballots.
    OpenVoting,
    /// Tally, close voting and record the winner.
    PublishResults,
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Privilege::Initialize => "initialize the election",
            Privilege::OpenVoting => "open voting",
            Privilege::PublishResults => "publish results",
        };
        f.write_str(s)
    }
}

/// Decides whether a caller may perform a privileged action.
pub trait AccessPolicy: Send + Sync {
    fn authorize(&self, caller: &str, privilege: Privilege) -> Result<(), Error>;
}

/// Grants every privilege to every caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn authorize(&self, _caller: &str, _privilege: Privilege) -> Result<(), Error> {
        Ok(())
    }
}

/// Grants privileges only to a fixed set of administrator identities.
#[derive(Clone, Debug, Default)]
pub struct AdminList {
    admins: BTreeSet<String>,
}

impl AdminList {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, caller: &str) -> bool {
        self.admins.contains(caller)
    }
}

impl AccessPolicy for AdminList {
    fn authorize(&self, caller: &str, privilege: Privilege) -> Result<(), Error> {
        if self.contains(caller) {
            Ok(())
        } else {
            Err(Error::Unauthorized {
                caller: caller.to_string(),
                action: privilege,
            })
        }
    }
}
