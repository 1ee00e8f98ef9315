// TCP session transport
//
// Wire layout of one frame:
//   "AD" | u32 big-endian payload length | protobuf Envelope
//
// The same framing is used in both directions.

use std::time::{SystemTime, UNIX_EPOCH};

use airview_proto::{
    FrameType, Header, TransferMessageList, FRAME_PREAMBLE_LEN, FRAME_PREFIX, MAX_FRAME_BYTES,
};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::opener::seal_plain;
use crate::ports::{Endpoint, RawFrame, Session, SessionTransport, TransportError};
use crate::Identity;

/// Connects to message servers over plain TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

#[async_trait]
impl SessionTransport for TcpTransport {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Session>, TransportError> {
        let stream = TcpStream::connect(&endpoint.location)
            .await
            .map_err(|source| TransportError::Connect {
                location: endpoint.location.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;

        debug!(location = %endpoint.location, "connected to message server");
        Ok(Box::new(StreamSession::new(stream)))
    }
}

/// A session over any byte stream.
pub struct StreamSession<S> {
    stream: S,
}

impl<S> StreamSession<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> Session for StreamSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_signed(
        &mut self,
        request: &TransferMessageList,
        sender: &Identity,
        recipient: &Endpoint,
    ) -> Result<(), TransportError> {
        let header = Header {
            from: sender.address().to_string(),
            to: recipient.address.clone(),
            timestamp: unix_now(),
            message_type: FrameType::ListRequest.code().to_string(),
        };
        let frame = seal_plain(header, request);
        write_frame(&mut self.stream, frame.as_bytes()).await
    }

    async fn read_frame(&mut self) -> Result<RawFrame, TransportError> {
        read_frame(&mut self.stream).await.map(RawFrame::new)
    }
}

/// Write one length-prefixed frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_BYTES {
        return Err(TransportError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_BYTES,
        });
    }

    let mut preamble = [0u8; FRAME_PREAMBLE_LEN];
    preamble[..FRAME_PREFIX.len()].copy_from_slice(&FRAME_PREFIX);
    preamble[FRAME_PREFIX.len()..].copy_from_slice(&(payload.len() as u32).to_be_bytes());

    writer.write_all(&preamble).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut preamble = [0u8; FRAME_PREAMBLE_LEN];
    read_exact_or_closed(reader, &mut preamble).await?;

    if preamble[..FRAME_PREFIX.len()] != FRAME_PREFIX {
        return Err(TransportError::BadPrefix);
    }

    let len = u32::from_be_bytes([preamble[2], preamble[3], preamble[4], preamble[5]]) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(TransportError::FrameTooLarge {
            len,
            max: MAX_FRAME_BYTES,
        });
    }

    let mut payload = vec![0u8; len];
    read_exact_or_closed(reader, &mut payload).await?;
    Ok(payload)
}

async fn read_exact_or_closed<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => Err(TransportError::Closed),
        Err(err) => Err(TransportError::Io(err)),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameOpener, PlainFrameOpener};
    use prost::Message;
    use tokio::io::duplex;

    #[tokio::test]
    async fn frame_round_trip_over_stream() {
        let (mut client, mut server) = duplex(1024);

        write_frame(&mut client, b"hello").await.unwrap();
        write_frame(&mut client, b"").await.unwrap();

        assert_eq!(read_frame(&mut server).await.unwrap(), b"hello");
        assert!(read_frame(&mut server).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn preamble_layout() {
        let (mut client, mut server) = duplex(64);
        write_frame(&mut client, &[9, 9, 9]).await.unwrap();
        drop(client);

        let mut bytes = Vec::new();
        server.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(bytes, vec![b'A', b'D', 0, 0, 0, 3, 9, 9, 9]);
    }

    #[tokio::test]
    async fn bad_prefix_is_rejected() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[b'X', b'Y', 0, 0, 0, 1, 0]).await.unwrap();

        assert!(matches!(
            read_frame(&mut server).await,
            Err(TransportError::BadPrefix)
        ));
    }

    #[tokio::test]
    async fn oversized_length_is_rejected() {
        let (mut client, mut server) = duplex(64);
        let mut preamble = FRAME_PREFIX.to_vec();
        preamble.extend_from_slice(&u32::MAX.to_be_bytes());
        client.write_all(&preamble).await.unwrap();

        assert!(matches!(
            read_frame(&mut server).await,
            Err(TransportError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn eof_mid_frame_is_closed() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[b'A', b'D', 0, 0, 0, 10, 1, 2]).await.unwrap();
        drop(client);

        assert!(matches!(
            read_frame(&mut server).await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn send_signed_writes_list_request() {
        let (client, mut server) = duplex(1024);
        let mut session = StreamSession::new(client);
        let me = Identity::from_address("me");
        let server_endpoint = Endpoint::new("alice@example.com", "srv", "127.0.0.1:1");
        let request = TransferMessageList {
            since: 0,
            author: "alice01".to_string(),
        };

        session
            .send_signed(&request, &me, &server_endpoint)
            .await
            .unwrap();

        let raw = RawFrame::new(read_frame(&mut server).await.unwrap());
        let opened = PlainFrameOpener
            .reconstruct(&raw, &Identity::from_address("srv"), true)
            .unwrap();
        assert_eq!(opened.frame_type, FrameType::ListRequest);
        assert_eq!(opened.header.from, "me");
        assert!(opened.header.timestamp > 0);

        let decoded = TransferMessageList::decode(opened.payload.as_slice()).unwrap();
        assert_eq!(decoded, request);
    }

    #[tokio::test]
    async fn connect_failure_names_location() {
        // Bind then drop to get a port nobody is listening on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let location = listener.local_addr().unwrap().to_string();
        drop(listener);

        let endpoint = Endpoint::new("a@b", "x", location.clone());
        let err = TcpTransport.connect(&endpoint).await.err().unwrap();
        match err {
            TransportError::Connect { location: l, .. } => assert_eq!(l, location),
            other => panic!("unexpected error: {other}"),
        }
    }
}
