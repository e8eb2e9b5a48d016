//! One-shot classification of a connection's inner protocol.
//!
//! The two inner protocols share no discriminant on the wire. The only
//! observable signal is the first tagged value of the first Regular frame:
//! the binary RPC handshake never starts with a populated value, while a
//! control header is always a non-empty array. This is best-effort; a
//! control connection whose first header is empty would be misclassified.

use bytes::Bytes;
use rpctrace_value::ValueReader;
use tracing::debug;

/// Per-connection inner protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamKind {
    #[default]
    Unclassified,
    Control,
    BinaryRpc,
}

impl StreamKind {
    /// Label used as the stream prefix of every emitted line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unclassified => "Undetermined",
            Self::Control => "Control",
            Self::BinaryRpc => "BinaryRpc",
        }
    }
}

/// Classify a connection from the payload of its first Regular frame.
///
/// Never returns [`StreamKind::Unclassified`].
pub fn classify(payload: &Bytes) -> StreamKind {
    let mut reader = ValueReader::new(payload.clone());
    let kind = match reader.read_value() {
        Ok(value) if !value.is_structurally_empty() => StreamKind::Control,
        Ok(_) => StreamKind::BinaryRpc,
        Err(err) => {
            debug!(error = %err, "leading value unreadable; treating as absent");
            StreamKind::BinaryRpc
        }
    };
    debug!(stream = kind.label(), size = payload.len(), "connection classified");
    kind
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use rpctrace_value::{encode_value, Value};
    use serde_json::json;

    use super::*;

    fn encoded(value: &Value) -> Bytes {
        let mut buf = BytesMut::new();
        encode_value(value, &mut buf);
        buf.freeze()
    }

    #[test]
    fn control_header_classifies_as_control() {
        let payload = encoded(&Value::Array(vec![Value::Int(100), Value::Int(7)]));
        assert_eq!(classify(&payload), StreamKind::Control);
    }

    #[test]
    fn empty_object_classifies_as_binary_rpc() {
        let payload = encoded(&Value::Object(json!({})));
        assert_eq!(classify(&payload), StreamKind::BinaryRpc);
    }

    #[test]
    fn undefined_classifies_as_binary_rpc() {
        assert_eq!(classify(&Bytes::from_static(&[0])), StreamKind::BinaryRpc);
    }

    #[test]
    fn rpc_preamble_classifies_as_binary_rpc() {
        // ReplyOKJSON (9) reads as an unknown tag.
        let payload = Bytes::from_static(&[9, 0, 0, 0, 1, 0, 0, 0, 2, b'{', b'}']);
        assert_eq!(classify(&payload), StreamKind::BinaryRpc);
    }

    #[test]
    fn empty_payload_classifies_as_binary_rpc() {
        assert_eq!(classify(&Bytes::new()), StreamKind::BinaryRpc);
    }

    #[test]
    fn empty_array_classifies_as_control() {
        let payload = encoded(&Value::Array(Vec::new()));
        assert_eq!(classify(&payload), StreamKind::Control);
    }

    #[test]
    fn labels() {
        assert_eq!(StreamKind::Unclassified.label(), "Undetermined");
        assert_eq!(StreamKind::Control.label(), "Control");
        assert_eq!(StreamKind::BinaryRpc.label(), "BinaryRpc");
    }
}
