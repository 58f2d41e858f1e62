//! Caller identity resolution.
//!
//! The ledger platform authenticates callers before an operation reaches the
//! state machine. Identities are taken as given; nothing here verifies them.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::Error;

/// Resolves the identity of the principal invoking the current operation.
pub trait IdentityProvider {
    fn caller_identity(&self) -> Result<String, Error>;
}

/// A plain string is its own identity.
impl IdentityProvider for str {
    fn caller_identity(&self) -> Result<String, Error> {
        Ok(self.to_string())
    }
}

impl IdentityProvider for String {
    fn caller_identity(&self) -> Result<String, Error> {
        Ok(self.clone())
    }
}

/// An identity that has already been decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedIdentity(pub String);

impl IdentityProvider for FixedIdentity {
    fn caller_identity(&self) -> Result<String, Error> {
        Ok(self.0.clone())
    }
}

/// A base64-encoded identity as handed over by the platform, e.g.
/// `x509::CN=alice,OU=client::CN=ca.org1.example.com` in standard base64.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedIdentity(pub String);

impl IdentityProvider for EncodedIdentity {
    fn caller_identity(&self) -> Result<String, Error> {
        let bytes = STANDARD
            .decode(self.0.trim())
            .map_err(|e| Error::Identity(format!("failed to base64 decode client id: {e}")))?;
        let id = String::from_utf8(bytes)
            .map_err(|e| Error::Identity(format!("client id is not utf-8: {e}")))?;
        if id.is_empty() {
            return Err(Error::Identity("empty client id".into()));
        }
        Ok(id)
    }
}
