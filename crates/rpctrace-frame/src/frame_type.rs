//! Outer frame type codes.
//!
//! Only [`FrameType::Regular`] carries an inner-protocol payload. Every other
//! type is reported as a label and never decoded further.

use std::fmt;

/// Type code of an outer frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    None,
    Regular,
    Control,
    Ack,
    Disconnect,
    ReplayRequest,
    PauseWriting,
    ResumeWriting,
    KeepAlive,
    /// A code this decoder does not know. The raw value is kept for display.
    Unknown(u8),
}

impl FrameType {
    /// Map a wire code to a frame type.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Regular,
            2 => Self::Control,
            3 => Self::Ack,
            5 => Self::Disconnect,
            6 => Self::ReplayRequest,
            7 => Self::PauseWriting,
            8 => Self::ResumeWriting,
            9 => Self::KeepAlive,
            other => Self::Unknown(other),
        }
    }

    /// The wire code of this frame type.
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Regular => 1,
            Self::Control => 2,
            Self::Ack => 3,
            Self::Disconnect => 5,
            Self::ReplayRequest => 6,
            Self::PauseWriting => 7,
            Self::ResumeWriting => 8,
            Self::KeepAlive => 9,
            Self::Unknown(code) => code,
        }
    }

    /// Human-readable name, or `None` for unknown codes.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::None => Some("None"),
            Self::Regular => Some("Regular"),
            Self::Control => Some("Control"),
            Self::Ack => Some("Ack"),
            Self::Disconnect => Some("Disconnect"),
            Self::ReplayRequest => Some("ReplayRequest"),
            Self::PauseWriting => Some("PauseWriting"),
            Self::ResumeWriting => Some("ResumeWriting"),
            Self::KeepAlive => Some("KeepAlive"),
            Self::Unknown(_) => None,
        }
    }

    /// Returns true if frames of this type carry an inner-protocol payload.
    pub fn carries_payload(self) -> bool {
        self == Self::Regular
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNEXPECTED:{}", self.code()),
        }
    }
}
