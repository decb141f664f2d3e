//! Error types shared by the accessors and coordinators

use thiserror::Error;

/// Broad classification of an [`Error`], used by callers that only care
/// whether a failure came from the remote side, from a payload that could not
/// be understood, or from a local precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Remote,
    Decode,
    Invariant,
    Config,
}

#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure (`status` is `None`) or a non-2xx response.
    #[error("{operation} failed{}: {message}", fmt_status(.status))]
    Remote {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("Could not decode {operation} response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("No default agent policy found for reassignment")]
    NoDefaultPolicy,

    #[error("Agent policy {0} is the default policy; its agents have no other policy to move to")]
    CannotDeleteDefaultPolicy(String),

    #[error("A shard ID requires an index name")]
    ShardWithoutIndex,

    #[error("An index name requires a shard ID")]
    IndexWithoutShard,

    #[error("Invalid allocation status: {0}. Must be one of: all, primaries, new_primaries, none")]
    InvalidAllocationStatus(String),

    #[error("Invalid setting type: {0}. Must be either 'transient' or 'persistent'")]
    InvalidSettingScope(String),

    #[error("Invalid policy ID '{id}': {reason}")]
    InvalidPolicyId { id: String, reason: String },

    #[error("Agent policy already exists: {0}")]
    PolicyExists(String),

    #[error("Agent policy not found: {0}")]
    PolicyNotFound(String),

    #[error("Package policy already exists: {0}")]
    PackagePolicyExists(String),

    #[error("Package policy not found: {0}")]
    PackagePolicyNotFound(String),

    #[error("Invalid ID '{0}': must be non-empty and must not be '.' or '..'")]
    InvalidResourceId(String),

    #[error("Invalid repository setting '{0}': expected key=value")]
    InvalidRepositorySetting(String),

    #[error("A rename pattern and a rename replacement must be given together")]
    IncompleteRename,

    #[error("Setting not found: {0}")]
    SettingNotFound(String),

    #[error("Invalid node name '{0}': must be non-empty and must not contain commas")]
    InvalidNodeName(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Remote { .. } => ErrorKind::Remote,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::NoDefaultPolicy
            | Error::CannotDeleteDefaultPolicy(_)
            | Error::ShardWithoutIndex
            | Error::IndexWithoutShard
            | Error::InvalidAllocationStatus(_)
            | Error::InvalidSettingScope(_)
            | Error::InvalidPolicyId { .. }
            | Error::PolicyExists(_)
            | Error::PolicyNotFound(_)
            | Error::PackagePolicyExists(_)
            | Error::PackagePolicyNotFound(_)
            | Error::InvalidResourceId(_)
            | Error::InvalidRepositorySetting(_)
            | Error::IncompleteRename
            | Error::SettingNotFound(_)
            | Error::InvalidNodeName(_) => ErrorKind::Invariant,
            Error::Config(_) | Error::Io(_) | Error::TomlDe(_) | Error::TomlSer(_) => {
                ErrorKind::Config
            }
        }
    }

    /// HTTP status of a remote rejection, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => *status,
            _ => None,
        }
    }

    pub(crate) fn transport(operation: &'static str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        Error::Remote {
            operation,
            status: None,
            message,
        }
    }

    pub(crate) fn decode(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Decode {
            operation,
            message: message.into(),
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
