use std::io;

use rpctrace_frame::{Demultiplexer, Frame, FrameType};
use tracing::{debug, warn};

use crate::classify::{classify, StreamKind};
use crate::config::DecodeConfig;
use crate::control::{decode_control, ControlOp};
use crate::error::{DecodeError, PipelineError};
use crate::render::Renderer;
use crate::report::{Direction, Event, EventSink, Reporter, SessionTag};
use crate::rpc::{decode_message, RpcFrame};
use crate::stats::Tally;

/// Decoding state for one direction of one captured connection.
///
/// Owns the frame buffer, the classification, the reporter and the tally.
/// Nothing is shared between pipelines; run one per direction.
#[derive(Debug)]
pub struct Pipeline<S> {
    demux: Demultiplexer,
    decoder: StreamDecoder<S>,
}

impl<S: EventSink> Pipeline<S> {
    pub fn new(session: SessionTag, direction: Direction, config: DecodeConfig, sink: S) -> Self {
        let reporter = Reporter::new(session, direction, Renderer::new(config.render), sink);
        Self {
            demux: Demultiplexer::with_config(config.frame),
            decoder: StreamDecoder {
                kind: StreamKind::Unclassified,
                reporter,
                tally: Tally::new(),
                frames: 0,
                faults: 0,
                sink_error: None,
            },
        }
    }

    /// Feed the next captured chunk. Chunk boundaries may fall anywhere.
    ///
    /// On desynchronization a `DESYNC` line is emitted and the frame error
    /// is returned; later calls fail with [`PipelineError::Halted`]. A sink
    /// error is returned as soon as the chunk is consumed, and lines for the
    /// rest of that chunk are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), PipelineError> {
        if self.demux.is_halted() {
            return Err(PipelineError::Halted);
        }

        let decoder = &mut self.decoder;
        let result = self.demux.push_with(chunk, |frame| decoder.handle_frame(frame));

        if let Some(err) = decoder.sink_error.take() {
            return Err(PipelineError::Sink(err));
        }
        if let Err(err) = result {
            decoder.reporter.report(decoder.kind, Event::Desync(&err))?;
            return Err(PipelineError::Frame(err));
        }
        Ok(())
    }

    pub fn stream_kind(&self) -> StreamKind {
        self.decoder.kind
    }

    pub fn tally(&self) -> &Tally {
        &self.decoder.tally
    }

    pub fn is_halted(&self) -> bool {
        self.demux.is_halted()
    }

    /// Frames demultiplexed so far.
    pub fn frames(&self) -> u64 {
        self.decoder.frames
    }

    pub fn sink(&self) -> &S {
        self.decoder.reporter.sink()
    }

    /// End the connection and hand back its sink and counters.
    pub fn finish(self) -> Summary<S> {
        let pending = self.demux.pending();
        let halted = self.demux.is_halted();
        if pending > 0 && !halted {
            warn!(
                session = %self.decoder.reporter.session(),
                direction = %self.decoder.reporter.direction(),
                pending,
                "capture ended inside a frame"
            );
        }

        let decoder = self.decoder;
        Summary {
            kind: decoder.kind,
            frames: decoder.frames,
            faults: decoder.faults,
            pending,
            halted,
            tally: decoder.tally,
            sink: decoder.reporter.into_sink(),
        }
    }
}

/// What a pipeline saw, returned by [`Pipeline::finish`].
#[derive(Debug)]
pub struct Summary<S> {
    pub kind: StreamKind,
    pub frames: u64,
    pub faults: u64,
    /// Bytes of a trailing incomplete frame.
    pub pending: usize,
    pub halted: bool,
    pub tally: Tally,
    pub sink: S,
}

#[derive(Debug)]
struct StreamDecoder<S> {
    kind: StreamKind,
    reporter: Reporter<S>,
    tally: Tally,
    frames: u64,
    faults: u64,
    sink_error: Option<io::Error>,
}

impl<S: EventSink> StreamDecoder<S> {
    fn handle_frame(&mut self, frame: Frame) {
        if self.sink_error.is_some() {
            return;
        }
        self.frames += 1;
        if let Err(err) = self.dispatch(&frame) {
            self.sink_error = Some(err);
        }
    }

    fn dispatch(&mut self, frame: &Frame) -> io::Result<()> {
        if !frame.frame_type.carries_payload() {
            if let FrameType::Unknown(code) = frame.frame_type {
                debug!(code, id = frame.id, "unknown frame type");
            }
            return self.reporter.report(self.kind, Event::Frame(frame.frame_type));
        }

        if self.kind == StreamKind::Unclassified {
            self.kind = classify(&frame.payload);
        }

        match self.kind {
            StreamKind::Control => match decode_control(frame.payload.clone()) {
                Ok(msg) => {
                    if let ControlOp::Unknown(code) = msg.op {
                        debug!(?code, id = frame.id, "unknown control op");
                    }
                    self.tally.record_control(&msg);
                    self.reporter.report(self.kind, Event::Control(&msg))
                }
                Err(err) => self.fault(frame.id, &err),
            },
            StreamKind::BinaryRpc | StreamKind::Unclassified => {
                match decode_message(frame.payload.clone()) {
                    Ok(rpc) => {
                        if let RpcFrame::Unexpected { code, .. } = &rpc {
                            debug!(code, id = frame.id, "unknown rpc message type");
                        }
                        self.tally.record_rpc(self.reporter.direction(), &rpc);
                        self.reporter.report(self.kind, Event::Rpc(&rpc))
                    }
                    Err(err) => self.fault(frame.id, &err),
                }
            }
        }
    }

    fn fault(&mut self, frame_id: u32, error: &DecodeError) -> io::Result<()> {
        self.faults += 1;
        warn!(
            stream = self.kind.label(),
            frame_id,
            error = %error,
            "frame skipped"
        );
        self.reporter
            .report(self.kind, Event::Fault { frame_id, error })
    }
}
