use crate::{invoke, print_bytes, required, FileStore};
use referendum::LedgerHandler;

pub fn command_read(matches: &clap::ArgMatches, handler: &LedgerHandler<FileStore>) {
    let voter = required(matches, "read", "VOTER");

    if let Some(vote) = invoke(handler, "read", "read", &[voter]) {
        print_bytes(&vote);
    }
}
