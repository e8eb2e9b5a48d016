//! Formatting of decoded events into log lines.
//!
//! Line shape: `<stream>-<session> <direction> <label> <details...>`.

use std::fmt;
use std::io;

use rpctrace_frame::{FrameError, FrameType};
use serde::Serialize;

use crate::classify::StreamKind;
use crate::control::ControlMessage;
use crate::error::DecodeError;
use crate::render::Renderer;
use crate::rpc::RpcFrame;

/// Which way the captured bytes travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// Front end to back end.
    #[serde(rename = ">>")]
    Outbound,
    /// Back end to front end.
    #[serde(rename = "<<")]
    Inbound,
}

impl Direction {
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Outbound => ">>",
            Self::Inbound => "<<",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.arrow())
    }
}

/// Display-only label for a captured session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionTag(String);

impl SessionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Keep the last `-`-separated segment of a reconnection token.
    pub fn from_token(token: &str) -> Self {
        Self(token.rsplit('-').next().unwrap_or(token).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One emitted event line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub stream: &'static str,
    pub session: String,
    pub direction: Direction,
    pub label: String,
    pub details: Vec<String>,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} {} {}",
            self.stream, self.session, self.direction, self.label
        )?;
        for detail in &self.details {
            write!(f, " {detail}")?;
        }
        Ok(())
    }
}

/// Destination for emitted lines.
pub trait EventSink {
    fn emit(&mut self, line: &LogLine) -> io::Result<()>;
}

impl EventSink for Vec<LogLine> {
    fn emit(&mut self, line: &LogLine) -> io::Result<()> {
        self.push(line.clone());
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, line: &LogLine) -> io::Result<()> {
        (**self).emit(line)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, line: &LogLine) -> io::Result<()> {
        (**self).emit(line)
    }
}

/// A decoded event, borrowed from whichever stage produced it.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// A frame without an inner payload.
    Frame(FrameType),
    Control(&'a ControlMessage),
    Rpc(&'a RpcFrame),
    /// A frame that could not be decoded and was skipped.
    Fault {
        frame_id: u32,
        error: &'a DecodeError,
    },
    /// Framing was lost; nothing follows this event.
    Desync(&'a FrameError),
}

/// Turns events into lines for one connection and hands them to a sink.
#[derive(Debug)]
pub struct Reporter<S> {
    session: SessionTag,
    direction: Direction,
    renderer: Renderer,
    sink: S,
}

impl<S: EventSink> Reporter<S> {
    pub fn new(session: SessionTag, direction: Direction, renderer: Renderer, sink: S) -> Self {
        Self {
            session,
            direction,
            renderer,
            sink,
        }
    }

    /// Format and emit one event.
    pub fn report(&mut self, stream: StreamKind, event: Event<'_>) -> io::Result<()> {
        let line = self.format(stream, event);
        self.sink.emit(&line)
    }

    /// Format one event without emitting it.
    pub fn format(&self, stream: StreamKind, event: Event<'_>) -> LogLine {
        let (label, details) = match event {
            Event::Frame(frame_type) => (format!("({frame_type})"), Vec::new()),
            Event::Control(msg) => (
                msg.op.label().to_string(),
                vec![
                    self.renderer.value(&msg.header),
                    self.renderer.value(&msg.body),
                ],
            ),
            Event::Rpc(RpcFrame::Message(msg)) => {
                let mut details = vec![msg.request_id.to_string()];
                if let Some(payload) = msg.payload_json() {
                    details.push(self.renderer.json(&payload));
                }
                (msg.message_type.label().to_string(), details)
            }
            Event::Rpc(RpcFrame::Unexpected { raw, .. }) => (
                "UNEXPECTED:".to_string(),
                vec![self.renderer.text(&String::from_utf8_lossy(raw))],
            ),
            Event::Fault { frame_id, error } => (
                "FAULT".to_string(),
                vec![format!("frame {frame_id}: {error}")],
            ),
            Event::Desync(error) => ("DESYNC".to_string(), vec![error.to_string()]),
        };

        LogLine {
            stream: stream.label(),
            session: self.session.to_string(),
            direction: self.direction,
            label,
            details,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn session(&self) -> &SessionTag {
        &self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rpctrace_value::Value;
    use serde_json::json;

    use super::*;
    use crate::config::RenderConfig;
    use crate::control::ControlOp;
    use crate::rpc::{MessageType, ReplyValue, RpcBody, RpcMessage};

    fn reporter() -> Reporter<Vec<LogLine>> {
        Reporter::new(
            SessionTag::new("abc"),
            Direction::Outbound,
            Renderer::default(),
            Vec::new(),
        )
    }

    #[test]
    fn token_suffix() {
        assert_eq!(SessionTag::from_token("1a2b-3c4d-99ff").as_str(), "99ff");
        assert_eq!(SessionTag::from_token("plain").as_str(), "plain");
        assert_eq!(SessionTag::from_token("").as_str(), "");
    }

    #[test]
    fn frame_event_line() {
        let line = reporter().format(StreamKind::Unclassified, Event::Frame(FrameType::KeepAlive));
        assert_eq!(line.to_string(), "Undetermined-abc >> (KeepAlive)");
    }

    #[test]
    fn unknown_frame_type_shows_code() {
        let line = reporter().format(StreamKind::Control, Event::Frame(FrameType::Unknown(4)));
        assert_eq!(line.to_string(), "Control-abc >> (UNEXPECTED:4)");
    }

    #[test]
    fn control_event_line() {
        let msg = ControlMessage {
            op: ControlOp::Request,
            header: Value::Array(vec![Value::Int(100), Value::Int(7)]),
            body: Value::Object(json!({"a": 1})),
        };
        let line = reporter().format(StreamKind::Control, Event::Control(&msg));
        assert_eq!(line.to_string(), r#"Control-abc >> req [100,7] {"a":1}"#);
    }

    #[test]
    fn rpc_line_without_payload_has_no_trailing_space() {
        let frame = RpcFrame::Message(RpcMessage {
            message_type: MessageType::Acknowledged,
            request_id: 42,
            body: RpcBody::Empty,
        });
        let line = reporter().format(StreamKind::BinaryRpc, Event::Rpc(&frame));
        assert_eq!(line.to_string(), "BinaryRpc-abc >> ack 42");
    }

    #[test]
    fn rpc_payload_is_capped() {
        let mut reporter = Reporter::new(
            SessionTag::new("t"),
            Direction::Inbound,
            Renderer::new(RenderConfig {
                max_detail_chars: 8,
            }),
            Vec::new(),
        );
        let frame = RpcFrame::Message(RpcMessage {
            message_type: MessageType::ReplyOkJson,
            request_id: 1,
            body: RpcBody::Reply(ReplyValue::Json(json!("abcdefghijkl"))),
        });
        reporter
            .report(StreamKind::BinaryRpc, Event::Rpc(&frame))
            .unwrap();
        assert_eq!(
            reporter.sink()[0].to_string(),
            r#"BinaryRpc-t << rep-ok-json 1 "abcdefg"#
        );
    }

    #[test]
    fn unexpected_rpc_shows_raw_text() {
        let frame = RpcFrame::Unexpected {
            code: 123,
            raw: Bytes::from_static(br#"{"init":true}"#),
        };
        let line = reporter().format(StreamKind::BinaryRpc, Event::Rpc(&frame));
        assert_eq!(line.to_string(), r#"BinaryRpc-abc >> UNEXPECTED: {"init":true}"#);
    }

    #[test]
    fn json_line_serialization() {
        let line = reporter().format(StreamKind::Unclassified, Event::Frame(FrameType::Ack));
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(
            value,
            json!({
                "stream": "Undetermined",
                "session": "abc",
                "direction": ">>",
                "label": "(Ack)",
                "details": []
            })
        );
    }
}
