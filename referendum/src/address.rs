use digest::Digest;
use sha2::Sha512;
use std::fmt;

/// Record key of the single-ballot layout
pub const LEGACY_RECORD_KEY: &str = "electionMetaData";

const RECORD_TAG: &str = "00";
const VOTER_TAG: &str = "01";

/// How ballot records and voter entries are laid out in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLayout {
    /// One ballot per store: the record lives under `electionMetaData`, each
    /// voter entry under the bare voter key.
    Legacy,

    /// Sawtooth-style 70 character hex addresses under a family prefix.
    /// Any number of ballots can share one store.
    Namespaced { family: String },
}

impl Default for KeyLayout {
    fn default() -> Self {
        KeyLayout::Legacy
    }
}

impl fmt::Display for KeyLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyLayout::Legacy => write!(f, "legacy"),
            KeyLayout::Namespaced { family } => write!(f, "namespaced({})", family),
        }
    }
}

impl KeyLayout {
    pub fn namespaced(family: impl Into<String>) -> Self {
        KeyLayout::Namespaced {
            family: family.into(),
        }
    }

    /// Key holding the serialized BallotRecord for `ballot`
    pub fn record_key(&self, ballot: &str) -> String {
        match self {
            KeyLayout::Legacy => LEGACY_RECORD_KEY.to_owned(),
            KeyLayout::Namespaced { family } => format!(
                "{}{}{}",
                family_prefix(family),
                RECORD_TAG,
                hash_hex(&[ballot.as_bytes()])
            ),
        }
    }

    /// Key whose presence marks `voter` as having voted on `ballot`
    pub fn voter_key(&self, ballot: &str, voter: &str) -> String {
        match self {
            KeyLayout::Legacy => voter.to_owned(),
            KeyLayout::Namespaced { family } => format!(
                "{}{}{}",
                family_prefix(family),
                VOTER_TAG,
                hash_hex(&[
                    &(ballot.len() as u64).to_be_bytes()[..],
                    ballot.as_bytes(),
                    voter.as_bytes(),
                ])
            ),
        }
    }
}

/// First 6 hex characters of SHA-512(family)
pub fn family_prefix(family: &str) -> String {
    let mut sha = Sha512::new();
    sha.update(family.as_bytes());
    hex::encode(&sha.finalize()[..3])
}

// 62 hex characters, so that prefix + tag + hash is 70
fn hash_hex(parts: &[&[u8]]) -> String {
    let mut sha = Sha512::new();
    for part in parts {
        sha.update(part);
    }
    let mut encoded = hex::encode(sha.finalize());
    encoded.truncate(62);
    encoded
}
