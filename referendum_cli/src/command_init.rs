use crate::{invoke, required, FileStore};
use referendum::{InitArity, LedgerHandler};

pub fn command_init(matches: &clap::ArgMatches, handler: &LedgerHandler<FileStore>) {
    let name = required(matches, "init", "NAME");

    let mut args = vec![name];
    if let Some(parent) = matches.value_of("PARENT") {
        if handler.ledger().config().init_arity == InitArity::NameOnly {
            eprintln!(
                "referendum init: ignoring parent {} (pass --with-parent to record it)",
                parent
            );
        }
        args.push(parent);
    }

    invoke(handler, "init", "init", &args);
    println!("Initialized ballot {}", name);
}
