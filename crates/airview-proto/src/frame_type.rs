use std::fmt;

/// Type tag carried in a frame header.
///
/// Known tags map onto dedicated variants; anything else is kept verbatim so
/// protocol errors can report exactly what the remote sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// Remote error report (`ERR`)
    Error,
    /// Header frame declaring how many items follow (`MLI`)
    ListHeader,
    /// One stored mail item (`MAI`)
    Item,
    /// Outgoing request for a user's message list (`XFL`)
    ListRequest,
    Unknown(String),
}

impl FrameType {
    pub const ERROR_CODE: &'static str = "ERR";
    pub const LIST_HEADER_CODE: &'static str = "MLI";
    pub const ITEM_CODE: &'static str = "MAI";
    pub const LIST_REQUEST_CODE: &'static str = "XFL";

    pub fn from_code(code: &str) -> Self {
        match code {
            Self::ERROR_CODE => FrameType::Error,
            Self::LIST_HEADER_CODE => FrameType::ListHeader,
            Self::ITEM_CODE => FrameType::Item,
            Self::LIST_REQUEST_CODE => FrameType::ListRequest,
            other => FrameType::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            FrameType::Error => Self::ERROR_CODE,
            FrameType::ListHeader => Self::LIST_HEADER_CODE,
            FrameType::Item => Self::ITEM_CODE,
            FrameType::ListRequest => Self::LIST_REQUEST_CODE,
            FrameType::Unknown(code) => code,
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
