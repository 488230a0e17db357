use crate::*;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serializer};
use std::fmt;

/// A cast choice, normalized for counting
///
/// Only the literal strings "yes" and "no" count towards the tally. Any other
/// value is still recorded under the voter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
    Other(String),
}

impl Choice {
    /// Parse a raw choice, ignoring trailing newlines. Comparison is case-sensitive.
    pub fn parse(raw: &str) -> Self {
        match raw.trim_end_matches('\n') {
            "yes" => Choice::Yes,
            "no" => Choice::No,
            other => Choice::Other(other.to_owned()),
        }
    }

    pub fn is_counted(&self) -> bool {
        !matches!(self, Choice::Other(_))
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Choice::Yes => write!(f, "yes"),
            Choice::No => write!(f, "no"),
            Choice::Other(other) => write!(f, "{}", other),
        }
    }
}

/// Running yes/no counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub yes: u64,
    pub no: u64,
}

impl Tally {
    pub fn total(&self) -> u64 {
        self.yes.saturating_add(self.no)
    }
}

/// What `BallotRecord::record_vote` did with a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The tally and vote map were updated
    Counted,

    /// The choice does not count; the record is unchanged
    Uncounted,

    /// The voter is already in the vote map with this same choice
    AlreadyCounted,
}

/// Metadata and tally of one referendum (or district)
///
/// Field names on the wire match records written by the legacy chaincode, so
/// an existing `electionMetaData` entry decodes as-is. Records from the flat
/// variant carry no `Votes` map; they decode with an empty one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BallotRecord {
    #[serde(rename = "ReferendumName")]
    pub name: String,

    /// Parent referendum or district this ballot is grouped under
    #[serde(rename = "ParentReferendumName")]
    #[serde(default)]
    #[serde(serialize_with = "serialize_optional_name")]
    #[serde(deserialize_with = "deserialize_optional_name")]
    pub parent_name: Option<String>,

    #[serde(rename = "BlockchainID")]
    #[serde(default)]
    #[serde(serialize_with = "serialize_optional_name")]
    #[serde(deserialize_with = "deserialize_optional_name")]
    pub blockchain_id: Option<String>,

    #[serde(rename = "NoVotes")]
    pub no_votes: u64,

    #[serde(rename = "YesVotes")]
    pub yes_votes: u64,

    /// Counted votes, voter key -> "yes" | "no".
    ///
    /// Hashmaps are not allowed because their unstable ordering leads to non-determinism.
    #[serde(rename = "Votes")]
    #[serde(default)]
    pub votes: IndexMap<String, String>,
}

impl BallotRecord {
    /// Create a new record with a zero tally and no votes
    pub fn new(name: impl Into<String>, parent_name: Option<String>) -> Self {
        BallotRecord {
            name: name.into(),
            parent_name,
            blockchain_id: None,
            no_votes: 0,
            yes_votes: 0,
            votes: IndexMap::new(),
        }
    }

    pub fn tally(&self) -> Tally {
        Tally {
            yes: self.yes_votes,
            no: self.no_votes,
        }
    }

    /// Apply one vote to the tally
    ///
    /// Does not consult the voter entry in the store, that is the ledger's job.
    /// A voter already in the vote map may only repeat the same choice. On
    /// error the record is unchanged.
    pub fn record_vote(&mut self, voter_key: &str, choice: &Choice) -> Result<RecordOutcome, Error> {
        let normalized = choice.to_string();
        if let Some(existing) = self.votes.get(voter_key) {
            if *existing == normalized {
                return Ok(RecordOutcome::AlreadyCounted);
            }
            return Err(Error::AlreadyVoted(voter_key.to_owned()));
        }

        let counter = match choice {
            Choice::Yes => &mut self.yes_votes,
            Choice::No => &mut self.no_votes,
            Choice::Other(_) => return Ok(RecordOutcome::Uncounted),
        };
        match counter.checked_add(1) {
            Some(count) => *counter = count,
            None => return Err(Error::TallyOverflow(self.name.clone())),
        }
        self.votes.insert(voter_key.to_owned(), normalized);

        Ok(RecordOutcome::Counted)
    }

    /// Check that the counters agree with the vote map
    pub fn is_consistent(&self) -> bool {
        let yes = self.votes.values().filter(|v| *v == "yes").count() as u64;
        let no = self.votes.values().filter(|v| *v == "no").count() as u64;

        yes == self.yes_votes
            && no == self.no_votes
            && self.yes_votes.checked_add(self.no_votes) == Some(self.votes.len() as u64)
    }

    /// Pack into bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(Error::SerializationFailed)
    }

    /// Unpack from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).map_err(Error::DeserializationFailed)
    }
}

// The wire format writes "" for a missing name
fn serialize_optional_name<S: Serializer>(name: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(name.as_deref().unwrap_or(""))
}

fn deserialize_optional_name<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let name: Option<String> = Option::deserialize(d)?;
    Ok(name.filter(|n| !n.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_parsing() {
        assert_eq!(Choice::parse("yes"), Choice::Yes);
        assert_eq!(Choice::parse("no\n"), Choice::No);
        assert_eq!(Choice::parse("yes\n\n"), Choice::Yes);
        assert_eq!(Choice::parse("Yes"), Choice::Other("Yes".to_owned()));
        assert_eq!(Choice::parse(" no"), Choice::Other(" no".to_owned()));
        assert_eq!(Choice::parse("maybe\n"), Choice::Other("maybe".to_owned()));
        assert!(!Choice::parse("maybe").is_counted());
    }

    #[test]
    fn record_votes() {
        let mut record = BallotRecord::new("prop-7", None);

        assert_eq!(
            record.record_vote("alice", &Choice::Yes).unwrap(),
            RecordOutcome::Counted
        );
        assert_eq!(
            record.record_vote("bob", &Choice::No).unwrap(),
            RecordOutcome::Counted
        );
        assert_eq!(
            record
                .record_vote("carol", &Choice::Other("maybe".to_owned()))
                .unwrap(),
            RecordOutcome::Uncounted
        );
        assert_eq!(record.tally(), Tally { yes: 1, no: 1 });
        assert_eq!(record.tally().total(), 2);
        assert!(!record.votes.contains_key("carol"));

        // Same voter, same choice: an earlier write already counted it
        assert_eq!(
            record.record_vote("alice", &Choice::Yes).unwrap(),
            RecordOutcome::AlreadyCounted
        );

        // Same voter, different choice
        assert!(matches!(
            record.record_vote("alice", &Choice::No),
            Err(Error::AlreadyVoted(_))
        ));

        // Nor may it switch to an uncounted one
        assert!(matches!(
            record.record_vote("alice", &Choice::Other("maybe".to_owned())),
            Err(Error::AlreadyVoted(_))
        ));

        assert_eq!(record.tally(), Tally { yes: 1, no: 1 });
        assert!(record.is_consistent());
    }

    #[test]
    fn full_counter_is_an_error() {
        let mut record = BallotRecord::new("prop-7", None);
        record.yes_votes = u64::MAX;
        let before = record.clone();

        assert!(matches!(
            record.record_vote("alice", &Choice::Yes),
            Err(Error::TallyOverflow(_))
        ));
        assert_eq!(record, before);
        assert_eq!(record.tally().total(), u64::MAX);
        assert!(!record.is_consistent());

        assert_eq!(
            record.record_vote("bob", &Choice::No).unwrap(),
            RecordOutcome::Counted
        );
        assert_eq!(record.tally().total(), u64::MAX);
    }

    #[test]
    fn tampered_counters_are_inconsistent() {
        let mut record = BallotRecord::new("prop-7", None);
        record.record_vote("alice", &Choice::Yes).unwrap();
        record.no_votes += 1;
        assert!(!record.is_consistent());
    }

    #[test]
    fn wire_format() {
        let mut record = BallotRecord::new("district-9", Some("state-1".to_owned()));
        record.record_vote("alice", &Choice::Yes).unwrap();

        let json = String::from_utf8(record.to_bytes().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"ReferendumName":"district-9","ParentReferendumName":"state-1","BlockchainID":"","NoVotes":0,"YesVotes":1,"Votes":{"alice":"yes"}}"#
        );
        assert_eq!(BallotRecord::from_bytes(json.as_bytes()).unwrap(), record);
    }

    #[test]
    fn decodes_flat_records() {
        let raw = br#"{"ReferendumName":"prop-7","ParentReferendumName":"","BlockchainID":"","NoVotes":3,"YesVotes":4}"#;
        let record = BallotRecord::from_bytes(raw).unwrap();

        assert_eq!(record.name, "prop-7");
        assert_eq!(record.parent_name, None);
        assert_eq!(record.blockchain_id, None);
        assert_eq!(record.tally(), Tally { yes: 4, no: 3 });
        assert!(record.votes.is_empty());
    }

    #[test]
    fn rejects_malformed_records() {
        assert!(matches!(
            BallotRecord::from_bytes(b"not json"),
            Err(Error::DeserializationFailed(_))
        ));
        assert!(matches!(
            BallotRecord::from_bytes(br#"{"ReferendumName":"x","NoVotes":-1,"YesVotes":0}"#),
            Err(Error::DeserializationFailed(_))
        ));
    }
}
