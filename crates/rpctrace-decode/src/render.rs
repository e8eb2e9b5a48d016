//! Shared text rendering with a uniform length cap.

use rpctrace_value::Value;

use crate::config::RenderConfig;

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Renders decoded payloads to capped text.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    max_chars: usize,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            max_chars: config.max_detail_chars,
        }
    }

    /// The configured cap in characters.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Cap arbitrary text.
    pub fn text(&self, text: &str) -> String {
        truncate_chars(text, self.max_chars).to_string()
    }

    /// Render JSON compactly, then cap.
    pub fn json(&self, value: &serde_json::Value) -> String {
        let rendered = value.to_string();
        if rendered.len() <= self.max_chars {
            return rendered;
        }
        self.text(&rendered)
    }

    /// Render a tagged value. A bare `Undefined` renders as `undefined`.
    pub fn value(&self, value: &Value) -> String {
        match value {
            Value::Undefined => "undefined".to_string(),
            other => self.json(&other.to_json()),
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}
