use crate::*;
use tracing::{debug, info, warn};

/// The referendum tally ledger
///
/// Records at most one vote per voter key and keeps the ballot's yes/no
/// tally in step with the votes it has counted. All state lives in the
/// store; a VoteLedger caches nothing between calls.
///
/// The store offers no transactions. Under `Isolation::Unguarded` the
/// duplicate check, the tally update and the two writes are separate store
/// round trips with nothing in between, as the legacy chaincode does.
/// Under `Isolation::Serialized` the voter key is locked for the whole call
/// and the ballot record key from its read to its write, which only
/// protects callers sharing this VoteLedger.
#[derive(Debug)]
pub struct VoteLedger<S: Store> {
    store: S,
    config: LedgerConfig,
    locks: KeyLocks,
}

impl<S: Store> VoteLedger<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        VoteLedger {
            store,
            config,
            locks: KeyLocks::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create (or reset) a ballot with a zero tally and no votes
    ///
    /// This is destructive: an existing record for the ballot is overwritten
    /// and its tally is lost, while voter entries stay behind. Do not call it
    /// to re-open a ballot.
    pub fn initialize(&self, ballot_name: &str, parent_name: Option<&str>) -> Result<(), Error> {
        if ballot_name.is_empty() {
            return Err(Error::InvalidArgument(
                "ballot name must not be empty".to_owned(),
            ));
        }
        match (self.config.init_arity, parent_name) {
            (_, Some("")) => {
                return Err(Error::InvalidArgument(
                    "parent name must not be empty".to_owned(),
                ))
            }
            (InitArity::WithParent, None) => {
                return Err(Error::InvalidArgument(format!(
                    "ballot {} requires a parent name",
                    ballot_name
                )))
            }
            _ => {}
        }

        let record = BallotRecord::new(ballot_name, parent_name.map(str::to_owned));
        let packed = record.to_bytes()?;
        let address = self.config.key_layout.record_key(ballot_name);

        let _record_guard = self.guard(&address);
        self.store
            .put_state(&address, packed)
            .map_err(Error::StoreWriteFailed)?;

        info!(ballot = ballot_name, parent = ?parent_name, key = %address, "ballot initialized");
        Ok(())
    }

    /// Cast `raw_choice` for `voter_key` on `ballot`
    ///
    /// Trailing newlines are ignored when deciding whether the choice is
    /// "yes" or "no"; other values are stored but not counted. The voter
    /// entry keeps the raw choice.
    ///
    /// The record is written before the voter entry. If the voter entry
    /// write fails after a counted vote, the record already holds the voter
    /// in its vote map; casting the same choice again completes the vote
    /// without counting it twice.
    pub fn cast_vote(&self, ballot: &str, voter_key: &str, raw_choice: &str) -> Result<(), Error> {
        if voter_key.is_empty() {
            return Err(Error::InvalidArgument(
                "voter key must not be empty".to_owned(),
            ));
        }
        if raw_choice.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "empty choice for {}",
                voter_key
            )));
        }

        let record_address = self.config.key_layout.record_key(ballot);
        let voter_address = self.config.key_layout.voter_key(ballot, voter_key);
        if voter_address == record_address {
            return Err(Error::InvalidArgument(format!(
                "voter key {} collides with the ballot record",
                voter_key
            )));
        }

        let _voter_guard = self.guard(&voter_address);

        let existing = self
            .store
            .get_state(&voter_address)
            .map_err(Error::StoreReadFailed)?;
        if existing.is_some() {
            debug!(ballot, voter = voter_key, "rejecting duplicate vote");
            return Err(Error::AlreadyVoted(voter_key.to_owned()));
        }

        let choice = Choice::parse(raw_choice);

        let record_guard = self.guard(&record_address);
        let mut record = self.load_record(ballot, &record_address)?;
        match record.record_vote(voter_key, &choice)? {
            RecordOutcome::Counted => {}
            RecordOutcome::Uncounted => {
                debug!(ballot, voter = voter_key, choice = %choice, "choice is not counted")
            }
            RecordOutcome::AlreadyCounted => warn!(
                ballot,
                voter = voter_key,
                "vote already counted but voter entry missing, completing it"
            ),
        }

        let packed = record.to_bytes()?;
        self.store
            .put_state(&record_address, packed)
            .map_err(Error::StoreWriteFailed)?;
        drop(record_guard);

        self.store
            .put_state(&voter_address, raw_choice.as_bytes().to_vec())
            .map_err(Error::StoreWriteFailed)?;

        info!(
            ballot,
            voter = voter_key,
            choice = %choice,
            yes = record.yes_votes,
            no = record.no_votes,
            "vote recorded"
        );
        Ok(())
    }

    /// Get the raw choice stored for `voter_key`
    pub fn read_vote(&self, ballot: &str, voter_key: &str) -> Result<Vec<u8>, Error> {
        if voter_key.is_empty() {
            return Err(Error::InvalidArgument(
                "voter key must not be empty".to_owned(),
            ));
        }

        let address = self.config.key_layout.voter_key(ballot, voter_key);
        match self.store.get_state(&address) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(Error::vote_not_found(voter_key)),
            Err(err) => match self.config.read_errors {
                ReadErrors::Distinct => Err(Error::StoreReadFailed(err)),
                ReadErrors::Collapsed => {
                    warn!(ballot, voter = voter_key, error = %err, "state read failed");
                    Err(Error::vote_not_found(voter_key))
                }
            },
        }
    }

    /// Get the ballot record with its tally and counted votes
    pub fn read_ballot(&self, ballot: &str) -> Result<BallotRecord, Error> {
        let address = self.config.key_layout.record_key(ballot);
        self.load_record(ballot, &address)
    }

    fn load_record(&self, ballot: &str, address: &str) -> Result<BallotRecord, Error> {
        let packed = self
            .store
            .get_state(address)
            .map_err(Error::StoreReadFailed)?
            .ok_or_else(|| Error::LedgerUninitialized(ballot.to_owned()))?;

        BallotRecord::from_bytes(&packed)
    }

    fn guard(&self, key: &str) -> Option<KeyGuard<'_>> {
        match self.config.isolation {
            Isolation::Serialized => Some(self.locks.lock(key)),
            Isolation::Unguarded => None,
        }
    }
}
