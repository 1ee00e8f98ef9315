// airview-proto - Message-server wire protocol definitions
//
// Every frame on a session connection is an `Envelope`: a routing header, a
// type-tagged payload and an (optional) signature. Payloads are themselves
// protobuf messages whose schema is selected by the header's type code.
//
// The message structs are declared with prost's derive macro directly rather
// than generated from .proto files, so no protoc is needed at build time.

mod frame_type;
mod messages;

pub use frame_type::FrameType;
pub use messages::{
    Component, Envelope, ErrorMessage, Header, Mail, MessageList, TransferMessageList,
};

/// Two magic bytes that open every frame on the wire.
pub const FRAME_PREFIX: [u8; 2] = *b"AD";

/// Size of the fixed frame preamble: prefix plus big-endian u32 length.
pub const FRAME_PREAMBLE_LEN: usize = FRAME_PREFIX.len() + 4;

/// Largest envelope a peer may send in a single frame (4 MiB).
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Mail component carrying a post's title. Items without it are not posts.
pub const TITLE_COMPONENT: &str = "airdispat.ch/notes/title";

/// Mail component carrying a post's raw markup body.
pub const BODY_COMPONENT: &str = "airdispat.ch/notes/body";
