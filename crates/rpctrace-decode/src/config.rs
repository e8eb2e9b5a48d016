use rpctrace_frame::FrameConfig;

/// Default cap on any text-rendered detail in an emitted line.
pub const DEFAULT_MAX_DETAIL_CHARS: usize = 1024;

/// Controls how decoded payloads are rendered into log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Rendered details longer than this many characters are cut.
    pub max_detail_chars: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_detail_chars: DEFAULT_MAX_DETAIL_CHARS,
        }
    }
}

/// Configuration for one connection pipeline.
#[derive(Debug, Clone, Default)]
pub struct DecodeConfig {
    /// Outer frame limits.
    pub frame: FrameConfig,
    /// Detail rendering.
    pub render: RenderConfig,
}
