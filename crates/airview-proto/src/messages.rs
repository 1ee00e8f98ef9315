use prost::Message;

/// Routing header attached to every envelope.
#[derive(Clone, PartialEq, Message)]
pub struct Header {
    /// Address of the sending identity
    #[prost(string, tag = "1")]
    pub from: String,
    /// Address of the intended recipient
    #[prost(string, tag = "2")]
    pub to: String,
    /// Seconds since the Unix epoch
    #[prost(uint64, tag = "3")]
    pub timestamp: u64,
    /// Three-character type code, see [`crate::FrameType`]
    #[prost(string, tag = "4")]
    pub message_type: String,
}

/// One frame's worth of data.
#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub signature: Vec<u8>,
}

/// Request for every message a server holds for `author`.
#[derive(Clone, PartialEq, Message)]
pub struct TransferMessageList {
    /// Only return messages newer than this timestamp (0 = everything)
    #[prost(uint64, tag = "1")]
    pub since: u64,
    #[prost(string, tag = "2")]
    pub author: String,
}

/// Payload of a list header frame.
#[derive(Clone, PartialEq, Message)]
pub struct MessageList {
    /// Number of item frames that follow on the connection
    #[prost(uint64, tag = "1")]
    pub length: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct Component {
    #[prost(string, tag = "1")]
    pub type_name: String,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}

/// A stored mail item: a name plus typed components.
#[derive(Clone, PartialEq, Message)]
pub struct Mail {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub components: Vec<Component>,
}

impl Mail {
    pub fn has_component(&self, type_name: &str) -> bool {
        self.components.iter().any(|c| c.type_name == type_name)
    }

    /// Raw bytes of the first component with the given type, if any.
    pub fn raw_component(&self, type_name: &str) -> Option<&[u8]> {
        self.components
            .iter()
            .find(|c| c.type_name == type_name)
            .map(|c| c.data.as_slice())
    }

    /// Component data as text. Invalid UTF-8 is replaced lossily.
    pub fn string_component(&self, type_name: &str) -> Option<String> {
        self.raw_component(type_name)
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }

    pub fn with_component(mut self, type_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.components.push(Component {
            type_name: type_name.into(),
            data: data.into(),
        });
        self
    }
}

/// Payload of an `ERR` frame.
#[derive(Clone, PartialEq, Message)]
pub struct ErrorMessage {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(string, tag = "2")]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mail() -> Mail {
        Mail {
            name: "hello-world".to_string(),
            components: Vec::new(),
        }
        .with_component(crate::TITLE_COMPONENT, "Hello")
        .with_component(crate::BODY_COMPONENT, b"# Hi\n".to_vec())
    }

    #[test]
    fn mail_component_lookup() {
        let mail = sample_mail();
        assert!(mail.has_component(crate::TITLE_COMPONENT));
        assert!(!mail.has_component("airdispat.ch/notes/tags"));
        assert_eq!(
            mail.string_component(crate::TITLE_COMPONENT).as_deref(),
            Some("Hello")
        );
        assert_eq!(
            mail.raw_component(crate::BODY_COMPONENT),
            Some(b"# Hi\n".as_slice())
        );
        assert_eq!(mail.raw_component("missing"), None);
    }

    #[test]
    fn first_component_wins_on_duplicates() {
        let mail = sample_mail().with_component(crate::TITLE_COMPONENT, "Second");
        assert_eq!(
            mail.string_component(crate::TITLE_COMPONENT).as_deref(),
            Some("Hello")
        );
    }

    #[test]
    fn lossy_string_component() {
        let mail = Mail::default().with_component("t", vec![0x66, 0xff, 0x6f]);
        assert_eq!(mail.string_component("t").as_deref(), Some("f\u{fffd}o"));
    }

    #[test]
    fn envelope_decodes_what_it_encodes() {
        let envelope = Envelope {
            header: Some(Header {
                from: "aa".to_string(),
                to: "bb".to_string(),
                timestamp: 42,
                message_type: crate::FrameType::ITEM_CODE.to_string(),
            }),
            payload: sample_mail().encode_to_vec(),
            signature: Vec::new(),
        };

        let decoded = Envelope::decode(envelope.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, envelope);
        let mail = Mail::decode(decoded.payload.as_slice()).unwrap();
        assert_eq!(mail.name, "hello-world");
    }
}
