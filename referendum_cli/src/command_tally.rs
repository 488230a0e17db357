use crate::{fail, invoke, FileStore};
use referendum::{BallotRecord, LedgerHandler};
use tracing::warn;

pub fn command_tally(matches: &clap::ArgMatches, handler: &LedgerHandler<FileStore>) {
    let packed = invoke(handler, "tally", "tally", &[]).unwrap_or_default();
    let record =
        BallotRecord::from_bytes(&packed).unwrap_or_else(|e| fail("referendum tally", e));

    if !record.is_consistent() {
        warn!(
            ballot = %record.name,
            yes = record.yes_votes,
            no = record.no_votes,
            counted = record.votes.len(),
            "tally does not match the recorded votes"
        );
    }

    if matches.is_present("json") {
        let json = serde_json::to_string_pretty(&record)
            .unwrap_or_else(|e| fail("referendum tally", e));
        println!("{}", json);
        return;
    }

    match &record.parent_name {
        Some(parent) => println!("Ballot: {} ({})", record.name, parent),
        None => println!("Ballot: {}", record.name),
    }
    let tally = record.tally();
    println!("  yes:   {}", tally.yes);
    println!("  no:    {}", tally.no);
    println!("  total: {}", tally.total());
}
