//! Error taxonomy shared by the polling flows.
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Remote service an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Notion,
    OpenAi,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Service::Notion => "Notion",
            Service::OpenAi => "OpenAI",
        })
    }
}

/// Coarse classification used by the scheduler and the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Content,
    Unexpected,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to reach {service}: {source}")]
    Transport {
        service: Service,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} error {status}: {body}")]
    Status {
        service: Service,
        status: StatusCode,
        body: String,
    },
    #[error("record {page_id}: {reason}")]
    Content { page_id: String, reason: String },
    #[error("invalid {service} response: {source}")]
    Decode {
        service: Service,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Unexpected(String),
}

impl Error {
    pub fn content(page_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Content {
            page_id: page_id.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Configuration,
            Error::Transport { .. } | Error::Status { .. } => ErrorKind::Transport,
            Error::Content { .. } => ErrorKind::Content,
            Error::Decode { .. } | Error::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Transport and content failures are already logged and recovered from
    /// where they happen.
    pub fn is_handled(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Content)
    }
}
