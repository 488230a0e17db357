use crate::*;
use tracing::{debug, warn};

/// Routes named operations with positional string arguments to a VoteLedger
///
/// | function      | args                                  | result            |
/// |---------------|---------------------------------------|-------------------|
/// | `init`        | `[ballot]` or `[ballot, parent]`      | none              |
/// | `write`       | `[voter, choice]`                     | none              |
/// | `read`        | `[voter]`                             | raw stored bytes  |
/// | `tally`       | `[]`                                  | ballot record     |
/// | `dummy_query` | any                                   | none              |
/// | `error`       | any                                   | always fails      |
///
/// A handler is bound to one ballot: `write`, `read` and `tally` address
/// that ballot, while `init` creates whichever ballot its arguments name.
#[derive(Debug)]
pub struct LedgerHandler<S: Store> {
    ballot: String,
    ledger: VoteLedger<S>,
}

impl<S: Store> LedgerHandler<S> {
    pub fn new(ballot: impl Into<String>, ledger: VoteLedger<S>) -> Self {
        LedgerHandler {
            ballot: ballot.into(),
            ledger,
        }
    }

    pub fn ballot(&self) -> &str {
        &self.ballot
    }

    pub fn ledger(&self) -> &VoteLedger<S> {
        &self.ledger
    }

    /// Run `function` against the ledger
    pub fn invoke(&self, function: &str, args: &[String]) -> Result<Option<Vec<u8>>, Error> {
        debug!(function, ballot = %self.ballot, args = args.len(), "invoke is running");

        let result = match function {
            "init" => self.init(args).map(|_| None),
            "write" => self.write(args).map(|_| None),
            "read" => self.read(args).map(Some),
            "tally" => self.tally(args).map(Some),
            "dummy_query" => Ok(None),
            "error" => Err(Error::Diagnostic),
            other => Err(Error::UnknownFunction(other.to_owned())),
        };

        if let Err(err) = &result {
            warn!(function, ballot = %self.ballot, error = %err, "invocation failed");
        }
        result
    }

    fn init(&self, args: &[String]) -> Result<(), Error> {
        match self.ledger.config().init_arity {
            InitArity::NameOnly => match args.first() {
                Some(name) => self.ledger.initialize(name, None),
                None => Err(Error::arity(1)),
            },
            InitArity::WithParent => match args {
                [name, parent] => self.ledger.initialize(name, Some(parent.as_str())),
                _ => Err(Error::arity(2)),
            },
        }
    }

    fn write(&self, args: &[String]) -> Result<(), Error> {
        match args {
            [voter, choice] => self.ledger.cast_vote(&self.ballot, voter, choice),
            _ => Err(Error::InvalidArgument(
                "Incorrect number of arguments. Expecting 2. name of the variable and value to set"
                    .to_owned(),
            )),
        }
    }

    fn read(&self, args: &[String]) -> Result<Vec<u8>, Error> {
        match args {
            [voter] => self.ledger.read_vote(&self.ballot, voter),
            _ => Err(Error::InvalidArgument(
                "Incorrect number of arguments. Expecting name of the var to query".to_owned(),
            )),
        }
    }

    fn tally(&self, args: &[String]) -> Result<Vec<u8>, Error> {
        if !args.is_empty() {
            return Err(Error::arity(0));
        }
        self.ledger.read_ballot(&self.ballot)?.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    fn handler(config: LedgerConfig) -> LedgerHandler<MemStore> {
        LedgerHandler::new(
            "prop-7",
            VoteLedger::with_config(MemStore::default(), config),
        )
    }

    #[test]
    fn init_write_read() {
        let handler = handler(LedgerConfig::default());
        assert_eq!(handler.ballot(), "prop-7");

        assert_eq!(handler.invoke("init", &args(&["prop-7"])).unwrap(), None);
        assert_eq!(
            handler.invoke("write", &args(&["alice", "yes"])).unwrap(),
            None
        );
        assert_eq!(
            handler.invoke("read", &args(&["alice"])).unwrap(),
            Some(b"yes".to_vec())
        );

        let tally = handler.invoke("tally", &[]).unwrap().unwrap();
        let record = BallotRecord::from_bytes(&tally).unwrap();
        assert_eq!(record.tally(), Tally { yes: 1, no: 0 });
    }

    #[test]
    fn init_name_only_uses_first_argument() {
        let handler = handler(LedgerConfig::default());

        assert!(matches!(
            handler.invoke("init", &[]),
            Err(Error::InvalidArgument(_))
        ));
        handler
            .invoke("init", &args(&["prop-7", "ignored", "also ignored"]))
            .unwrap();

        let record = handler.ledger().read_ballot("prop-7").unwrap();
        assert_eq!(record.name, "prop-7");
        assert_eq!(record.parent_name, None);
    }

    #[test]
    fn init_with_parent_requires_two_arguments() {
        let handler = handler(LedgerConfig::default().with_init_arity(InitArity::WithParent));

        for bad in &[args(&[]), args(&["prop-7"]), args(&["prop-7", "d", "x"])] {
            match handler.invoke("init", bad) {
                Err(Error::InvalidArgument(msg)) => {
                    assert_eq!(msg, "Incorrect number of arguments. Expecting 2")
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
        assert!(matches!(
            handler.invoke("init", &args(&["prop-7", ""])),
            Err(Error::InvalidArgument(_))
        ));

        handler
            .invoke("init", &args(&["prop-7", "district-9"]))
            .unwrap();
        let record = handler.ledger().read_ballot("prop-7").unwrap();
        assert_eq!(record.parent_name.as_deref(), Some("district-9"));
    }

    #[test]
    fn wrong_arity() {
        let handler = handler(LedgerConfig::default());
        handler.invoke("init", &args(&["prop-7"])).unwrap();

        assert!(matches!(
            handler.invoke("write", &args(&["alice"])),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            handler.invoke("write", &args(&["alice", "yes", "no"])),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            handler.invoke("read", &[]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            handler.invoke("tally", &args(&["prop-7"])),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn diagnostic_and_unknown_functions() {
        let handler = handler(LedgerConfig::default());

        assert!(matches!(handler.invoke("error", &[]), Err(Error::Diagnostic)));
        assert_eq!(handler.invoke("dummy_query", &[]).unwrap(), None);
        match handler.invoke("delete", &args(&["alice"])) {
            Err(Error::UnknownFunction(name)) => assert_eq!(name, "delete"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn read_of_unknown_voter_returns_structured_error() {
        let handler = handler(LedgerConfig::default());
        handler.invoke("init", &args(&["prop-7"])).unwrap();

        let err = handler.invoke("read", &args(&["mallory"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"{"Error":"Failed to get vote for mallory"}"#
        );
    }
}
