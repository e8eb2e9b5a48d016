//! Decode a control capture through `tokio_util::codec::FramedRead`.
//!
//! Run with: `cargo run -p rpctrace --example async-decode-capture --features async`

use futures_util::StreamExt;
use rpctrace::decode::{
    classify, decode_control, Direction, Event, LogLine, Renderer, Reporter, SessionTag,
    StreamKind,
};
use rpctrace::frame::{encode_frame, FrameCodec, FrameType};
use rpctrace::value::{encode_value, Value};
use tokio_util::codec::FramedRead;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut wire = bytes::BytesMut::new();
    for (id, event) in [(1, "onDidChangeFile"), (2, "onDidChangeCapabilities")] {
        let mut payload = bytes::BytesMut::new();
        encode_value(
            &Value::Array(vec![
                Value::Int(102),
                Value::Int(id),
                Value::String("remoteFilesystem".into()),
                Value::String(event.into()),
            ]),
            &mut payload,
        );
        encode_value(&Value::Undefined, &mut payload);
        encode_frame(FrameType::Regular, id, 0, &payload, &mut wire)?;
    }
    encode_frame(FrameType::Ack, 3, 2, &[], &mut wire)?;
    let capture = wire.to_vec();

    let mut reporter = Reporter::new(
        SessionTag::new("async"),
        Direction::Outbound,
        Renderer::default(),
        Vec::<LogLine>::new(),
    );
    let mut kind = StreamKind::Unclassified;

    let mut frames = FramedRead::new(capture.as_slice(), FrameCodec::default());
    while let Some(frame) = frames.next().await {
        let frame = frame?;
        if !frame.frame_type.carries_payload() {
            reporter.report(kind, Event::Frame(frame.frame_type))?;
            continue;
        }
        if kind == StreamKind::Unclassified {
            kind = classify(&frame.payload);
        }
        match decode_control(frame.payload) {
            Ok(msg) => reporter.report(kind, Event::Control(&msg))?,
            Err(error) => reporter.report(
                kind,
                Event::Fault {
                    frame_id: frame.id,
                    error: &error,
                },
            )?,
        }
    }

    for line in reporter.into_sink() {
        println!("{line}");
    }
    Ok(())
}
