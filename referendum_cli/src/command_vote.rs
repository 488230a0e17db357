use crate::{invoke, required, FileStore};
use referendum::{Choice, LedgerHandler};

pub fn command_vote(matches: &clap::ArgMatches, handler: &LedgerHandler<FileStore>) {
    let voter = required(matches, "vote", "VOTER");
    let choice = required(matches, "vote", "CHOICE");

    invoke(handler, "vote", "write", &[voter, choice]);

    if !Choice::parse(choice).is_counted() {
        eprintln!(
            "referendum vote: {:?} was recorded for {} but does not count towards the tally",
            choice, voter
        );
    }
}
