use bytes::{BufMut, BytesMut};
use rpctrace_decode::{
    DecodeConfig, Direction, LogLine, Pipeline, PipelineError, SessionTag, StreamKind,
    TallyCategory,
};
use rpctrace_frame::{encode_frame, FrameConfig, FrameType};
use rpctrace_value::{encode_value, Value};
use serde_json::json;

// --- capture builders ---

struct Capture {
    buf: BytesMut,
    next_id: u32,
}

impl Capture {
    fn new() -> Self {
        Self {
            buf: BytesMut::new(),
            next_id: 1,
        }
    }

    fn frame(mut self, frame_type: FrameType, payload: &[u8]) -> Self {
        encode_frame(frame_type, self.next_id, 0, payload, &mut self.buf).unwrap();
        self.next_id += 1;
        self
    }

    fn regular(self, payload: &[u8]) -> Self {
        self.frame(FrameType::Regular, payload)
    }

    fn control(self, header: Value, body: Value) -> Self {
        let mut payload = BytesMut::new();
        encode_value(&header, &mut payload);
        encode_value(&body, &mut payload);
        self.regular(&payload)
    }

    fn bytes(&self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

fn long_string(buf: &mut BytesMut, text: &str) {
    buf.put_u32(text.len() as u32);
    buf.put_slice(text.as_bytes());
}

fn json_request(type_code: u8, request_id: u32, target: u8, method: &str, args: &str) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u8(type_code);
    buf.put_u32(request_id);
    buf.put_u8(target);
    buf.put_u8(method.len() as u8);
    buf.put_slice(method.as_bytes());
    long_string(&mut buf, args);
    buf.to_vec()
}

fn reply_json(request_id: u32, json: &str) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u8(9);
    buf.put_u32(request_id);
    long_string(&mut buf, json);
    buf.to_vec()
}

fn preamble(type_code: u8, request_id: u32) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u8(type_code);
    buf.put_u32(request_id);
    buf.to_vec()
}

fn request_header(op: u32, id: u32, channel: &str, name: &str) -> Value {
    Value::Array(vec![
        Value::Int(op),
        Value::Int(id),
        Value::String(channel.into()),
        Value::String(name.into()),
    ])
}

// --- runners ---

fn run_with(direction: Direction, config: DecodeConfig, chunks: &[&[u8]]) -> Vec<LogLine> {
    let mut pipeline = Pipeline::new(SessionTag::new("t"), direction, config, Vec::new());
    for chunk in chunks {
        if pipeline.push(chunk).is_err() {
            break;
        }
    }
    pipeline.finish().sink
}

fn run(wire: &[u8]) -> Vec<String> {
    run_with(Direction::Outbound, DecodeConfig::default(), &[wire])
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn run_chunked(wire: &[u8], sizes: &[usize]) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = wire;
    let mut i = 0;
    while !rest.is_empty() {
        let n = sizes[i % sizes.len()].min(rest.len());
        let (head, tail) = rest.split_at(n);
        chunks.push(head);
        rest = tail;
        i += 1;
    }
    run_with(Direction::Outbound, DecodeConfig::default(), &chunks)
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn mixed_capture() -> Vec<u8> {
    Capture::new()
        .frame(FrameType::KeepAlive, &[])
        .regular(&json_request(1, 42, 3, "foo", "[1,2,3]"))
        .frame(FrameType::Ack, &[])
        .regular(&preamble(5, 42))
        .regular(&reply_json(42, r#"{"ok":true}"#))
        .regular(&[255, 1, 2, 3])
        .regular(&preamble(7, 43))
        .frame(FrameType::Disconnect, &[])
        .bytes()
}

// --- frame level ---

#[test]
fn every_non_regular_frame_yields_one_label() {
    let wire = Capture::new()
        .frame(FrameType::None, b"ignored")
        .frame(FrameType::Control, b"\x04\x02\x06\x64\x06\x07")
        .frame(FrameType::Ack, &[])
        .frame(FrameType::Disconnect, &[])
        .frame(FrameType::ReplayRequest, &[])
        .frame(FrameType::PauseWriting, &[])
        .frame(FrameType::ResumeWriting, &[])
        .frame(FrameType::KeepAlive, &[])
        .frame(FrameType::Unknown(4), b"??")
        .bytes();

    assert_eq!(
        run(&wire),
        vec![
            "Undetermined-t >> (None)",
            "Undetermined-t >> (Control)",
            "Undetermined-t >> (Ack)",
            "Undetermined-t >> (Disconnect)",
            "Undetermined-t >> (ReplayRequest)",
            "Undetermined-t >> (PauseWriting)",
            "Undetermined-t >> (ResumeWriting)",
            "Undetermined-t >> (KeepAlive)",
            "Undetermined-t >> (UNEXPECTED:4)",
        ]
    );
}

// --- classification ---

#[test]
fn non_empty_leading_value_classifies_control() {
    let wire = Capture::new()
        .control(
            Value::Array(vec![Value::Int(100), Value::Int(7)]),
            Value::Object(json!({"a": 1})),
        )
        .bytes();
    assert_eq!(run(&wire), vec![r#"Control-t >> req [100,7] {"a":1}"#]);
}

#[test]
fn empty_leading_value_classifies_binary_rpc() {
    let wire = Capture::new().regular(&preamble(5, 1)).bytes();
    assert_eq!(run(&wire), vec!["BinaryRpc-t >> ack 1"]);
}

#[test]
fn classification_is_sticky() {
    let wire = Capture::new()
        .control(
            Value::Array(vec![Value::Int(200), Value::Int(1)]),
            Value::Undefined,
        )
        .frame(FrameType::KeepAlive, &[])
        // Would classify as binary RPC on its own.
        .regular(&preamble(5, 1))
        .bytes();

    let lines = run(&wire);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Control-t >> init [200,1] undefined");
    assert_eq!(lines[1], "Control-t >> (KeepAlive)");
    assert!(lines[2].starts_with("Control-t >> "), "{}", lines[2]);
}

#[test]
fn classification_happens_once() {
    let mut pipeline = Pipeline::new(
        SessionTag::new("t"),
        Direction::Inbound,
        DecodeConfig::default(),
        Vec::new(),
    );
    pipeline
        .push(&Capture::new().frame(FrameType::KeepAlive, &[]).bytes())
        .unwrap();
    assert_eq!(pipeline.stream_kind(), StreamKind::Unclassified);

    pipeline
        .push(&Capture::new().regular(&preamble(6, 3)).bytes())
        .unwrap();
    assert_eq!(pipeline.stream_kind(), StreamKind::BinaryRpc);

    let control = Capture::new()
        .control(
            Value::Array(vec![Value::Int(100), Value::Int(1)]),
            Value::Undefined,
        )
        .bytes();
    pipeline.push(&control).unwrap();
    assert_eq!(pipeline.stream_kind(), StreamKind::BinaryRpc);
}

// --- binary rpc ---

#[test]
fn json_args_request_lines() {
    let wire = Capture::new()
        .regular(&json_request(1, 42, 3, "foo", "[1,2,3]"))
        .regular(&json_request(2, 43, 3, "foo", "[1,2,3]"))
        .bytes();
    assert_eq!(
        run(&wire),
        vec![
            r#"BinaryRpc-t >> req-json-args 42 [3,"foo",[1,2,3],false]"#,
            r#"BinaryRpc-t >> req-json-args 43 [3,"foo",[1,2,3],true]"#,
        ]
    );
}

#[test]
fn long_reply_is_cut_to_exact_cap() {
    let text = "x".repeat(4000);
    let wire = Capture::new()
        .regular(&preamble(5, 1))
        .regular(&reply_json(7, &format!("\"{text}\"")))
        .bytes();

    let lines = run_with(Direction::Inbound, DecodeConfig::default(), &[&wire]);
    let reply = &lines[1];
    assert_eq!(reply.label, "rep-ok-json");
    assert_eq!(reply.details[0], "7");
    assert_eq!(reply.details[1].chars().count(), 1024);
}

#[test]
fn unknown_rpc_type_then_recovery() {
    let wire = Capture::new()
        .regular(b"\xff{\"x\":1}")
        .regular(&reply_json(2, "[]"))
        .bytes();
    assert_eq!(
        run(&wire),
        vec![
            "BinaryRpc-t >> UNEXPECTED: \u{fffd}{\"x\":1}",
            "BinaryRpc-t >> rep-ok-json 2 []",
        ]
    );
}

#[test]
fn truncated_rpc_is_a_fault_and_decoding_resumes() {
    let mut lying = json_request(1, 9, 0, "m", "[]");
    // Claim a 100-byte method name.
    lying[6] = 100;
    let wire = Capture::new()
        .regular(&preamble(5, 1))
        .regular(&lying)
        .regular(&preamble(6, 9))
        .bytes();

    let lines = run(&wire);
    assert_eq!(lines.len(), 3);
    assert!(
        lines[1].starts_with("BinaryRpc-t >> FAULT frame 2: truncated method"),
        "{}",
        lines[1]
    );
    assert_eq!(lines[2], "BinaryRpc-t >> cancel 9");
}

// --- chunking and purity ---

#[test]
fn byte_at_a_time_matches_single_chunk() {
    let wire = mixed_capture();
    let whole = run(&wire);
    assert_eq!(whole.len(), 8);
    assert_eq!(run_chunked(&wire, &[1]), whole);
}

#[test]
fn irregular_chunks_match_single_chunk() {
    let wire = mixed_capture();
    let whole = run(&wire);
    for sizes in [&[2, 13, 5][..], &[12, 1], &[14], &[3, 7, 11, 64]] {
        assert_eq!(run_chunked(&wire, sizes), whole, "chunk sizes {sizes:?}");
    }
}

#[test]
fn decoding_is_repeatable() {
    let wire = mixed_capture();
    assert_eq!(run(&wire), run(&wire));
}

#[test]
fn directions_only_change_the_arrow() {
    let wire = mixed_capture();
    let out: Vec<String> = run_with(Direction::Outbound, DecodeConfig::default(), &[&wire])
        .iter()
        .map(ToString::to_string)
        .collect();
    let inbound: Vec<String> = run_with(Direction::Inbound, DecodeConfig::default(), &[&wire])
        .iter()
        .map(|line| line.to_string().replacen(" << ", " >> ", 1))
        .collect();
    assert_eq!(out, inbound);
}

// --- desync ---

#[test]
fn nothing_follows_desync() {
    let config = DecodeConfig {
        frame: FrameConfig {
            max_payload_size: 64,
        },
        ..DecodeConfig::default()
    };
    let mut wire = Capture::new().regular(&preamble(5, 1)).bytes();
    // Oversized length, followed by a valid frame that must not be decoded.
    wire.extend_from_slice(&[1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 1, 0]);
    wire.extend_from_slice(&Capture::new().regular(&preamble(5, 2)).bytes());

    let mut pipeline = Pipeline::new(SessionTag::new("t"), Direction::Outbound, config, Vec::new());
    let err = pipeline.push(&wire).unwrap_err();
    assert!(matches!(err, PipelineError::Frame(_)));
    assert!(matches!(
        pipeline.push(&preamble(5, 3)),
        Err(PipelineError::Halted)
    ));

    let summary = pipeline.finish();
    assert!(summary.halted);
    let lines: Vec<String> = summary.sink.iter().map(ToString::to_string).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "BinaryRpc-t >> ack 1");
    assert!(lines[1].starts_with("BinaryRpc-t >> DESYNC "), "{}", lines[1]);
}

// --- tally ---

#[test]
fn tallies_follow_the_stream() {
    let control = Capture::new()
        .control(request_header(100, 1, "files", "stat"), Value::Undefined)
        .control(request_header(100, 2, "files", "stat"), Value::Undefined)
        .control(request_header(102, 3, "files", "onDidChange"), Value::Undefined)
        .bytes();
    let rpc = Capture::new()
        .regular(&json_request(1, 1, 0, "$initialize", "[]"))
        .bytes();

    let mut control_pipeline = Pipeline::new(
        SessionTag::from_token("aaaa-bbbb"),
        Direction::Outbound,
        DecodeConfig::default(),
        Vec::new(),
    );
    control_pipeline.push(&control).unwrap();
    let mut rpc_pipeline = Pipeline::new(
        SessionTag::from_token("cccc-dddd"),
        Direction::Inbound,
        DecodeConfig::default(),
        Vec::new(),
    );
    rpc_pipeline.push(&rpc).unwrap();

    let mut tally = control_pipeline.finish().tally;
    let rpc_summary = rpc_pipeline.finish();
    assert_eq!(rpc_summary.sink[0].session, "dddd");
    tally.merge(&rpc_summary.tally);

    let commands = tally.counts(TallyCategory::ControlCommands);
    assert_eq!(commands[0].name, "files.stat");
    assert_eq!(commands[0].count, 2);
    assert_eq!(tally.unique_total(TallyCategory::ControlEvents), 1);
    assert_eq!(tally.unique_total(TallyCategory::ServerMethods), 0);
    assert_eq!(
        tally.counts(TallyCategory::ClientMethods)[0].name,
        "$initialize"
    );
}
