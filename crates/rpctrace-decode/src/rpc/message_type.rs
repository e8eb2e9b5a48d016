/// Binary RPC message type (first byte of every message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    RequestJsonArgs,
    RequestJsonArgsWithCancellation,
    RequestMixedArgs,
    RequestMixedArgsWithCancellation,
    Acknowledged,
    Cancel,
    ReplyOkEmpty,
    ReplyOkVsBuffer,
    ReplyOkJson,
    ReplyOkJsonWithBuffers,
    ReplyErrError,
    ReplyErrEmpty,
    Unknown(u8),
}

impl MessageType {
    /// Map a wire code to a message type. Unmapped codes are kept.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::RequestJsonArgs,
            2 => Self::RequestJsonArgsWithCancellation,
            3 => Self::RequestMixedArgs,
            4 => Self::RequestMixedArgsWithCancellation,
            5 => Self::Acknowledged,
            6 => Self::Cancel,
            7 => Self::ReplyOkEmpty,
            8 => Self::ReplyOkVsBuffer,
            9 => Self::ReplyOkJson,
            10 => Self::ReplyOkJsonWithBuffers,
            11 => Self::ReplyErrError,
            12 => Self::ReplyErrEmpty,
            other => Self::Unknown(other),
        }
    }

    /// Wire code for this message type.
    pub fn code(self) -> u8 {
        match self {
            Self::RequestJsonArgs => 1,
            Self::RequestJsonArgsWithCancellation => 2,
            Self::RequestMixedArgs => 3,
            Self::RequestMixedArgsWithCancellation => 4,
            Self::Acknowledged => 5,
            Self::Cancel => 6,
            Self::ReplyOkEmpty => 7,
            Self::ReplyOkVsBuffer => 8,
            Self::ReplyOkJson => 9,
            Self::ReplyOkJsonWithBuffers => 10,
            Self::ReplyErrError => 11,
            Self::ReplyErrEmpty => 12,
            Self::Unknown(code) => code,
        }
    }

    /// Label printed for this message type.
    pub fn label(self) -> &'static str {
        match self {
            Self::RequestJsonArgs | Self::RequestJsonArgsWithCancellation => "req-json-args",
            Self::RequestMixedArgs | Self::RequestMixedArgsWithCancellation => "req-mixed-args",
            Self::Acknowledged => "ack",
            Self::Cancel => "cancel",
            Self::ReplyOkEmpty => "rep-ok-empty",
            Self::ReplyOkVsBuffer => "rep-ok-vsbuff",
            Self::ReplyOkJson => "rep-ok-json",
            Self::ReplyOkJsonWithBuffers => "rep-ok-json-buffs",
            Self::ReplyErrError | Self::ReplyErrEmpty => "rep-err",
            Self::Unknown(_) => "UNEXPECTED",
        }
    }

    /// Request variants whose caller may cancel them.
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            Self::RequestJsonArgsWithCancellation | Self::RequestMixedArgsWithCancellation
        )
    }
}
