use crate::*;
use std::env::var;
use std::fmt;
use std::str::FromStr;

/// How many arguments `init` takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitArity {
    /// One or more arguments; only the first (the ballot name) is used
    NameOnly,

    /// Exactly two arguments: ballot name and parent (district) name
    WithParent,
}

/// Isolation between concurrent CastVote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    /// Read-then-write with no isolation. Two concurrent votes by the same
    /// voter can both pass the duplicate check, and concurrent votes can
    /// overwrite each other's tally update.
    Unguarded,

    /// The voter key and the ballot record key are each locked from the
    /// first read until the last write.
    Serialized,
}

/// How ReadVote reports failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadErrors {
    /// A missing entry is `NotFound`, a failing store is `StoreReadFailed`
    Distinct,

    /// Both are `NotFound`, as the legacy chaincode reports them
    Collapsed,
}

macro_rules! config_enum {
    ($name:ident, $label:expr, $($variant:ident => $text:literal),+) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match self {
                    $($name::$variant => write!(f, "{}", $text),)+
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidConfig(format!(
                        "unknown {} {:?}",
                        $label, other
                    ))),
                }
            }
        }
    };
}

config_enum!(InitArity, "init arity", NameOnly => "name-only", WithParent => "with-parent");
config_enum!(Isolation, "isolation", Unguarded => "unguarded", Serialized => "serialized");
config_enum!(ReadErrors, "read error mode", Distinct => "distinct", Collapsed => "collapsed");

/// Behaviour switches for a VoteLedger
///
/// The default matches the legacy chaincode: one-argument `init`,
/// no isolation between votes, and the legacy single-ballot key layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub init_arity: InitArity,
    pub isolation: Isolation,
    pub read_errors: ReadErrors,
    pub key_layout: KeyLayout,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            init_arity: InitArity::NameOnly,
            isolation: Isolation::Unguarded,
            read_errors: ReadErrors::Distinct,
            key_layout: KeyLayout::Legacy,
        }
    }
}

impl LedgerConfig {
    /// Read overrides of the defaults from `REFERENDUM_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LedgerConfig::default();

        if let Some(val) = lookup("REFERENDUM_INIT_ARITY") {
            config.init_arity = val.parse()?;
        }
        if let Some(val) = lookup("REFERENDUM_ISOLATION") {
            config.isolation = val.parse()?;
        }
        if let Some(val) = lookup("REFERENDUM_READ_ERRORS") {
            config.read_errors = val.parse()?;
        }
        if let Some(family) = lookup("REFERENDUM_NAMESPACE") {
            if family.is_empty() {
                return Err(Error::InvalidConfig(
                    "REFERENDUM_NAMESPACE must not be empty".to_owned(),
                ));
            }
            config.key_layout = KeyLayout::namespaced(family);
        }

        Ok(config)
    }

    pub fn with_init_arity(mut self, init_arity: InitArity) -> Self {
        self.init_arity = init_arity;
        self
    }

    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_read_errors(mut self, read_errors: ReadErrors) -> Self {
        self.read_errors = read_errors;
        self
    }

    pub fn with_key_layout(mut self, key_layout: KeyLayout) -> Self {
        self.key_layout = key_layout;
        self
    }
}
