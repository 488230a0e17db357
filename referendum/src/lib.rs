#[macro_use]
extern crate serde;

mod address;
mod config;
mod error;
mod handler;
mod ledger;
mod lock;
mod record;
mod store;

pub use address::*;
pub use config::*;
pub use error::*;
pub use handler::*;
pub use ledger::*;
pub use lock::*;
pub use record::*;
pub use store::*;
