use crate::{invoke, print_bytes, required, FileStore};
use referendum::LedgerHandler;

pub fn command_invoke(matches: &clap::ArgMatches, handler: &LedgerHandler<FileStore>) {
    let function = required(matches, "invoke", "FUNCTION");
    let args: Vec<&str> = matches.values_of("ARGS").map(|v| v.collect()).unwrap_or_default();

    if let Some(result) = invoke(handler, "invoke", function, &args) {
        print_bytes(&result);
    }
}
