use airview_proto::{Envelope, FrameType, Header};
use prost::Message;

use crate::ports::{DecodeError, FrameOpener, OpenedFrame, RawFrame};
use crate::Identity;

/// Opens unsigned, unencrypted envelopes.
///
/// Header frames must be addressed to the receiver. Item frames are relayed
/// mail and keep whatever addressing the author gave them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFrameOpener;

impl FrameOpener for PlainFrameOpener {
    fn reconstruct(
        &self,
        raw: &RawFrame,
        receiver: &Identity,
        is_header: bool,
    ) -> Result<OpenedFrame, DecodeError> {
        let envelope =
            Envelope::decode(raw.as_bytes()).map_err(|source| DecodeError::Malformed {
                what: "envelope",
                source,
            })?;
        let header = envelope.header.ok_or(DecodeError::MissingHeader)?;

        if is_header && header.to != receiver.address() {
            return Err(DecodeError::Misaddressed {
                expected: receiver.address().to_string(),
                actual: header.to,
            });
        }

        Ok(OpenedFrame {
            frame_type: FrameType::from_code(&header.message_type),
            header,
            payload: envelope.payload,
        })
    }
}

/// Wrap `payload` in an unsigned envelope. Inverse of [`PlainFrameOpener`].
pub fn seal_plain<M: Message>(header: Header, payload: &M) -> RawFrame {
    let envelope = Envelope {
        header: Some(header),
        payload: payload.encode_to_vec(),
        signature: Vec::new(),
    };
    RawFrame::new(envelope.encode_to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use airview_proto::MessageList;

    fn header(to: &str, frame_type: FrameType) -> Header {
        Header {
            from: "server".to_string(),
            to: to.to_string(),
            timestamp: 1_700_000_000,
            message_type: frame_type.code().to_string(),
        }
    }

    #[test]
    fn opens_sealed_frame() {
        let me = Identity::from_address("me");
        let raw = seal_plain(
            header("me", FrameType::ListHeader),
            &MessageList { length: 4 },
        );

        let opened = PlainFrameOpener.reconstruct(&raw, &me, true).unwrap();
        assert_eq!(opened.frame_type, FrameType::ListHeader);
        assert_eq!(opened.header.from, "server");
        assert_eq!(
            MessageList::decode(opened.payload.as_slice()).unwrap().length,
            4
        );
    }

    #[test]
    fn header_must_be_addressed_to_receiver() {
        let me = Identity::from_address("me");
        let raw = seal_plain(
            header("someone-else", FrameType::ListHeader),
            &MessageList { length: 1 },
        );

        let err = PlainFrameOpener.reconstruct(&raw, &me, true).unwrap_err();
        assert!(matches!(err, DecodeError::Misaddressed { .. }));

        // Relayed items are not held to the receiver's address.
        assert!(PlainFrameOpener.reconstruct(&raw, &me, false).is_ok());
    }

    #[test]
    fn rejects_garbage_and_headerless_frames() {
        let me = Identity::from_address("me");

        let garbage = RawFrame::new(vec![0xff, 0xff, 0xff]);
        assert!(matches!(
            PlainFrameOpener.reconstruct(&garbage, &me, false),
            Err(DecodeError::Malformed { .. })
        ));

        let headerless = RawFrame::new(
            Envelope {
                header: None,
                payload: Vec::new(),
                signature: Vec::new(),
            }
            .encode_to_vec(),
        );
        assert!(matches!(
            PlainFrameOpener.reconstruct(&headerless, &me, false),
            Err(DecodeError::MissingHeader)
        ));
    }
}
