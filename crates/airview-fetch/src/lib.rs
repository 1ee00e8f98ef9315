// airview-fetch - Remote post retrieval
//
// `PostFetcher` drives one list session against an author's message server:
// resolve the alias, connect, send a signed list request, then read a header
// frame followed by exactly the number of item frames it declares. Frames are
// consumed strictly in order and any unexpected frame aborts the whole fetch.
//
// Everything the fetcher talks to is a port (see `ports`), with a reference
// implementation alongside:
// - AliasResolver   -> StaticDirectory
// - SessionTransport -> TcpTransport (length-prefixed protobuf envelopes)
// - FrameOpener     -> PlainFrameOpener
// - MarkupRenderer  -> MarkdownRenderer

mod directory;
mod error;
mod fetcher;
mod identity;
mod markup;
mod opener;
mod ports;
mod tcp;

pub use directory::StaticDirectory;
pub use error::{FetchError, RemoteError, Stage};
pub use fetcher::PostFetcher;
pub use identity::Identity;
pub use markup::MarkdownRenderer;
pub use opener::{seal_plain, PlainFrameOpener};
pub use ports::{
    AliasResolver, DecodeError, Endpoint, FrameOpener, LookupPurpose, MarkupRenderer,
    OpenedFrame, RawFrame, ResolveError, Session, SessionTransport, TransportError,
};
pub use tcp::{read_frame, write_frame, StreamSession, TcpTransport};
