/// Errors that can occur while decoding a tagged value.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// A length or tag pointed past the end of the input.
    #[error("unexpected end of input (needed {needed} bytes, {available} available)")]
    UnexpectedEof { needed: usize, available: usize },

    /// The tag byte is not one of the known data types.
    #[error("unknown value tag {0}")]
    UnknownTag(u8),

    /// A variable-length integer did not terminate within 32 bits.
    #[error("variable-length integer overflows 32 bits")]
    VarintOverflow,

    /// Arrays nest deeper than the decoder allows.
    #[error("value nesting exceeds {0} levels")]
    TooDeep(usize),

    /// An object value did not contain valid JSON.
    #[error("invalid object json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ValueError>;
