use std::fmt;
use std::time::Duration;

use airview_proto::{ErrorMessage, FrameType};
use prost::Message;
use thiserror::Error;

use crate::ports::{DecodeError, LookupPurpose, OpenedFrame, ResolveError, TransportError};

/// Point in a list session where a fetch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Connect,
    Request,
    Header,
    /// Zero-based item index and the count the header declared
    Item { index: u64, total: u64 },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => write!(f, "alias resolution"),
            Stage::Connect => write!(f, "connect"),
            Stage::Request => write!(f, "list request"),
            Stage::Header => write!(f, "list header"),
            Stage::Item { index, total } => write!(f, "item {} of {}", index + 1, total),
        }
    }
}

/// Error reported by the message server in place of the frame we asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote {from} reported error {code}: {description}")]
pub struct RemoteError {
    pub code: u32,
    pub description: String,
    /// Address the error frame was sent from
    pub from: String,
}

impl RemoteError {
    pub fn from_frame(frame: &OpenedFrame) -> Result<Self, DecodeError> {
        let message = ErrorMessage::decode(frame.payload.as_slice()).map_err(|source| {
            DecodeError::Malformed {
                what: "error message",
                source,
            }
        })?;

        Ok(Self {
            code: message.code,
            description: message.description,
            from: frame.header.from.clone(),
        })
    }
}

/// Why a fetch produced no collection.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not resolve {alias} for {purpose}: {source}")]
    Resolution {
        alias: String,
        purpose: LookupPurpose,
        #[source]
        source: ResolveError,
    },

    #[error("transport failure during {stage}: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: TransportError,
    },

    #[error("could not decode {stage}: {source}")]
    Decode {
        stage: Stage,
        #[source]
        source: DecodeError,
    },

    #[error("expected type ({expected}), got type ({observed})")]
    Protocol {
        expected: FrameType,
        observed: FrameType,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{stage} timed out after {timeout:?}")]
    Timeout { stage: Stage, timeout: Duration },
}

impl FetchError {
    pub fn is_remote(&self) -> bool {
        matches!(self, FetchError::Remote(_))
    }

    /// Session stage the failure belongs to, where one is known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            FetchError::Resolution { .. } => Some(Stage::Resolve),
            FetchError::Transport { stage, .. }
            | FetchError::Decode { stage, .. }
            | FetchError::Timeout { stage, .. } => Some(*stage),
            FetchError::Protocol { .. } | FetchError::Remote(_) => None,
        }
    }
}
