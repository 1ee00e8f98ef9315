//! Capabilities the fetcher consumes.
//!
//! Directory lookups, the byte transport, frame verification and markup
//! rendering all live behind these traits so deployments can plug in real
//! signing/encryption and tests can script a session frame by frame.

use airview_proto::{FrameType, Header, TransferMessageList};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::Identity;

/// What an alias is being resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupPurpose {
    /// The message server that hands out the alias's mail
    Transfer,
    /// The identity the alias's mail is stored under
    Mail,
}

impl fmt::Display for LookupPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupPurpose::Transfer => write!(f, "transfer"),
            LookupPurpose::Mail => write!(f, "mail"),
        }
    }
}

/// A resolved network participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub alias: String,
    /// Identity fingerprint of the endpoint owner
    pub address: String,
    /// `host:port` of the message server
    pub location: String,
}

impl Endpoint {
    pub fn new(
        alias: impl Into<String>,
        address: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            address: address.into(),
            location: location.into(),
        }
    }
}

/// One undecoded frame as read off a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame(Vec<u8>);

impl RawFrame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A frame after verification/decryption.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedFrame {
    pub payload: Vec<u8>,
    pub frame_type: FrameType,
    pub header: Header,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no directory entry for alias '{0}'")]
    UnknownAlias(String),

    #[error("directory lookup failed: {0}")]
    Lookup(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {location}: {source}")]
    Connect {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed by peer")]
    Closed,

    #[error("frame does not start with the protocol prefix")]
    BadPrefix,

    #[error("frame of {len} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed {what}: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: prost::DecodeError,
    },

    #[error("frame has no header")]
    MissingHeader,

    #[error("frame addressed to {actual}, expected {expected}")]
    Misaddressed { expected: String, actual: String },
}

/// Maps an alias to the endpoint serving a given purpose.
#[async_trait]
pub trait AliasResolver: Send + Sync {
    async fn resolve(&self, alias: &str, purpose: LookupPurpose)
        -> Result<Endpoint, ResolveError>;
}

/// Opens sessions to message servers.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Session>, TransportError>;
}

/// One duplex connection. Frames come back strictly in order and there is no
/// way to peek: every `read_frame` consumes exactly the next frame.
#[async_trait]
pub trait Session: Send {
    /// Sign `request` as `sender` and send it to `recipient`.
    async fn send_signed(
        &mut self,
        request: &TransferMessageList,
        sender: &Identity,
        recipient: &Endpoint,
    ) -> Result<(), TransportError>;

    async fn read_frame(&mut self) -> Result<RawFrame, TransportError>;
}

/// Verifies (and, where applicable, decrypts) a raw frame for `receiver`.
///
/// `is_header` is set for the list header frame, which is a direct reply to
/// the receiver; item frames are stored mail relayed on the author's behalf.
pub trait FrameOpener: Send + Sync {
    fn reconstruct(
        &self,
        raw: &RawFrame,
        receiver: &Identity,
        is_header: bool,
    ) -> Result<OpenedFrame, DecodeError>;
}

/// Turns raw post markup into HTML. Must be pure.
pub trait MarkupRenderer: Send + Sync {
    fn render(&self, raw: &[u8]) -> String;
}
