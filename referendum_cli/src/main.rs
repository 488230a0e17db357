use clap::{App, AppSettings, Arg, SubCommand};
use num_enum::TryFromPrimitive;
use referendum::*;
use std::convert::TryFrom;
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod command_init;
mod command_invoke;
mod command_read;
mod command_tally;
mod command_vote;
mod file_store;

use command_init::command_init;
use command_invoke::command_invoke;
use command_read::command_read;
use command_tally::command_tally;
use command_vote::command_vote;
pub use file_store::*;

#[derive(TryFromPrimitive, PartialEq, Copy, Clone, Debug)]
#[repr(u8)]
enum Verbosity {
    Warn = 0,
    Info = 1,
    Debug = 2,
}

impl Verbosity {
    fn from_occurrences(occurrences: u64) -> Self {
        Verbosity::try_from(occurrences.min(2) as u8).unwrap_or(Verbosity::Debug)
    }

    fn directive(self) -> &'static str {
        match self {
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

fn main() {
    let matches = App::new("Referendum CLI")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Casts and tallies yes/no referendum votes in a local state file")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity (RUST_LOG takes precedence)"),
        )
        .arg(
            Arg::with_name("store")
                .long("store")
                .takes_value(true)
                .help("State file - can also be set with REFERENDUM_STORE"),
        )
        .arg(
            Arg::with_name("ballot")
                .long("ballot")
                .takes_value(true)
                .help("Ballot to vote on - can also be set with REFERENDUM_BALLOT"),
        )
        .arg(
            Arg::with_name("with-parent")
                .long("with-parent")
                .help("init takes exactly a ballot name and a parent name"),
        )
        .arg(
            Arg::with_name("serialized")
                .long("serialized")
                .help("Lock voter and ballot keys while a vote is cast"),
        )
        .arg(
            Arg::with_name("collapsed-read-errors")
                .long("collapsed-read-errors")
                .help("Report state read failures as missing votes"),
        )
        .arg(
            Arg::with_name("namespace")
                .long("namespace")
                .takes_value(true)
                .help("Use hashed addresses under this family name"),
        )
        .subcommand(
            SubCommand::with_name("init")
                .about("Create a ballot, or reset an existing one (its tally is lost)")
                .arg(Arg::with_name("NAME").index(1).required(true))
                .arg(
                    Arg::with_name("PARENT")
                        .index(2)
                        .required(false)
                        .help("Parent referendum or district"),
                ),
        )
        .subcommand(
            SubCommand::with_name("vote")
                .about("Cast a vote")
                .arg(Arg::with_name("VOTER").index(1).required(true))
                .arg(
                    Arg::with_name("CHOICE")
                        .index(2)
                        .required(true)
                        .help("yes or no; anything else is recorded but not counted"),
                ),
        )
        .subcommand(
            SubCommand::with_name("read")
                .about("Print the vote stored for a voter")
                .arg(Arg::with_name("VOTER").index(1).required(true)),
        )
        .subcommand(
            SubCommand::with_name("tally")
                .about("Print the ballot's tally")
                .arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("Print the full ballot record as JSON"),
                ),
        )
        .subcommand(
            SubCommand::with_name("invoke")
                .about("Call a ledger function by name")
                .arg(Arg::with_name("FUNCTION").index(1).required(true))
                .arg(Arg::with_name("ARGS").index(2).multiple(true)),
        )
        .get_matches();

    let verbosity = Verbosity::from_occurrences(matches.occurrences_of("v"));
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = LedgerConfig::from_env().unwrap_or_else(|e| fail("referendum", e));
    if matches.is_present("with-parent") {
        config = config.with_init_arity(InitArity::WithParent);
    }
    if matches.is_present("serialized") {
        config = config.with_isolation(Isolation::Serialized);
    }
    if matches.is_present("collapsed-read-errors") {
        config = config.with_read_errors(ReadErrors::Collapsed);
    }
    if let Some(family) = matches.value_of("namespace") {
        config = config.with_key_layout(KeyLayout::namespaced(family));
    }

    let env_store = std::env::var("REFERENDUM_STORE");
    let store_path = match matches.value_of("store") {
        Some(path) => path,
        None => env_store.as_deref().unwrap_or("./referendum.json"),
    };
    let store_path = expand(store_path);

    let env_ballot = std::env::var("REFERENDUM_BALLOT");
    let ballot = match matches.value_of("ballot") {
        Some(ballot) => ballot,
        None => env_ballot.as_deref().unwrap_or(LEGACY_RECORD_KEY),
    };

    let store = FileStore::open(&store_path).unwrap_or_else(|e| fail("referendum", e));
    info!(store = %store.path().display(), ballot, layout = %config.key_layout, "opened state file");
    let handler = LedgerHandler::new(ballot, VoteLedger::with_config(store, config));

    // Subcommands
    match matches.subcommand() {
        ("init", Some(matches)) => command_init(matches, &handler),
        ("vote", Some(matches)) => command_vote(matches, &handler),
        ("read", Some(matches)) => command_read(matches, &handler),
        ("tally", Some(matches)) => command_tally(matches, &handler),
        ("invoke", Some(matches)) => command_invoke(matches, &handler),
        (other, _) => fail("referendum", format!("unknown command {}", other)),
    }
}

/// Print `err` and exit with status 1
pub fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

/// Expand `~` and environment variables in a path
pub fn expand(input: &str) -> String {
    shellexpand::full(input)
        .unwrap_or_else(|e| fail("referendum", e))
        .into_owned()
}

/// Get a required positional argument
pub fn required<'a>(matches: &'a clap::ArgMatches, command: &str, name: &str) -> &'a str {
    matches
        .value_of(name)
        .unwrap_or_else(|| fail(&format!("referendum {}", command), format!("{} required", name)))
}

/// Run a ledger function, exiting on failure
pub fn invoke(
    handler: &LedgerHandler<FileStore>,
    command: &str,
    function: &str,
    args: &[&str],
) -> Option<Vec<u8>> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    handler
        .invoke(function, &args)
        .unwrap_or_else(|e| fail(&format!("referendum {}", command), e))
}

/// Write stored bytes to stdout as-is, ending with a newline
pub fn print_bytes(bytes: &[u8]) {
    let mut stdout = std::io::stdout();
    let mut res = stdout.write_all(bytes);
    if res.is_ok() && !bytes.ends_with(b"\n") {
        res = stdout.write_all(b"\n");
    }
    if let Err(e) = res {
        fail("referendum", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(Verbosity::from_occurrences(0), Verbosity::Warn);
        assert_eq!(Verbosity::from_occurrences(1), Verbosity::Info);
        assert_eq!(Verbosity::from_occurrences(2), Verbosity::Debug);
        assert_eq!(Verbosity::from_occurrences(7).directive(), "debug");
    }

    #[test]
    fn expand_leaves_plain_paths_alone() {
        assert_eq!(expand("./referendum.json"), "./referendum.json");
    }
}
