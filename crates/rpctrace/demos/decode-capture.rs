//! Decode a small synthetic capture in memory and print each line.
//!
//! Run with: `cargo run -p rpctrace --example decode-capture`

use rpctrace::decode::{DecodeConfig, Direction, LogLine, Pipeline, SessionTag, TallyCategory};
use rpctrace::frame::{encode_frame, FrameType};
use rpctrace::value::{encode_value, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut wire = bytes::BytesMut::new();
    encode_frame(FrameType::KeepAlive, 0, 0, &[], &mut wire)?;

    for (id, command) in [(1, "getEnvironment"), (2, "stat"), (3, "stat")] {
        let mut payload = bytes::BytesMut::new();
        encode_value(
            &Value::Array(vec![
                Value::Int(100),
                Value::Int(id),
                Value::String("remoteAgent".into()),
                Value::String(command.into()),
            ]),
            &mut payload,
        );
        encode_value(&Value::Undefined, &mut payload);
        encode_frame(FrameType::Regular, id, 0, &payload, &mut wire)?;
    }

    let mut pipeline = Pipeline::new(
        SessionTag::from_token("demo-token-7f3a"),
        Direction::Outbound,
        DecodeConfig::default(),
        Vec::<LogLine>::new(),
    );

    // Deliver the capture in awkward pieces, as a socket would.
    for chunk in wire.chunks(7) {
        pipeline.push(chunk)?;
    }

    let summary = pipeline.finish();
    for line in &summary.sink {
        println!("{line}");
    }
    for row in summary.tally.counts(TallyCategory::ControlCommands) {
        println!("{:>4}  {}", row.count, row.name);
    }
    Ok(())
}
