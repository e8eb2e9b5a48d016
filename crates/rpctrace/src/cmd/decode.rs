use std::fs::File;
use std::io::{self, Read, Stdout};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rpctrace_decode::{
    DecodeConfig, Direction, Pipeline, PipelineError, RenderConfig, SessionTag, Tally,
};
use rpctrace_frame::FrameConfig;
use tracing::{debug, info, warn};

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, pipeline_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_stats, LineWriter, OutputFormat};

/// Tag used when no reconnection token is given.
const DEFAULT_SESSION_TAG: &str = "local";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

type StdoutPipeline = Pipeline<LineWriter<Stdout>>;

/// Where one direction's bytes come from.
#[derive(Debug, PartialEq, Eq)]
enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    fn from_arg(path: &Path) -> Self {
        if path == Path::new("-") {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        match self {
            Self::Stdin => Ok(Box::new(io::stdin())),
            Self::File(path) => Ok(Box::new(File::open(path)?)),
        }
    }
}

enum Input {
    Chunk(Direction, Vec<u8>),
    End(Direction),
    Failed(Direction, io::Error),
}

/// One captured direction and its decoding state.
struct Connection {
    direction: Direction,
    pipeline: StdoutPipeline,
    open: bool,
    desync: Option<PipelineError>,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let sources = resolve_sources(&args)?;
    let config = decode_config(&args);
    let session = session_tag(args.token.as_deref());

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let (tx, rx) = mpsc::channel();
    let mut connections = Vec::with_capacity(sources.len());
    for (direction, source) in sources {
        let reader = source
            .open()
            .map_err(|err| io_error(&format!("open {}", describe(direction, &source)), err))?;
        spawn_reader(direction, reader, args.chunk_size, tx.clone())
            .map_err(|err| io_error("reader thread setup failed", err))?;
        connections.push(Connection {
            direction,
            pipeline: Pipeline::new(
                session.clone(),
                direction,
                config.clone(),
                LineWriter::new(io::stdout(), format),
            ),
            open: true,
            desync: None,
        });
    }
    drop(tx);

    let closed_output = pump(&rx, &mut connections, &running)?;
    if closed_output {
        return Ok(SUCCESS);
    }

    let mut tally = Tally::new();
    let mut desync = None;
    for connection in connections {
        let summary = connection.pipeline.finish();
        info!(
            direction = %connection.direction,
            stream = summary.kind.label(),
            frames = summary.frames,
            faults = summary.faults,
            "connection finished"
        );
        tally.merge(&summary.tally);
        if desync.is_none() {
            desync = connection
                .desync
                .map(|err| pipeline_error(direction_name(connection.direction), err));
        }
    }

    if args.stats {
        print_stats(&tally, format).map_err(|err| io_error("stats output failed", err))?;
    }

    match desync {
        Some(err) => Err(err),
        None => Ok(SUCCESS),
    }
}

/// Feed chunks to their pipelines until every input ends or the user
/// interrupts. Returns true when stdout was closed underneath us.
fn pump(
    rx: &Receiver<Input>,
    connections: &mut [Connection],
    running: &AtomicBool,
) -> CliResult<bool> {
    while connections.iter().any(|c| c.open) {
        if !running.load(Ordering::SeqCst) {
            info!("interrupted; finishing with input received so far");
            break;
        }

        let input = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(input) => input,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match input {
            Input::Chunk(direction, chunk) => {
                let Some(connection) = connection_mut(connections, direction) else {
                    continue;
                };
                if connection.desync.is_some() {
                    continue;
                }
                match connection.pipeline.push(&chunk) {
                    Ok(()) => {}
                    Err(PipelineError::Sink(err)) if err.kind() == io::ErrorKind::BrokenPipe => {
                        debug!("stdout closed; stopping");
                        return Ok(true);
                    }
                    Err(PipelineError::Sink(err)) => {
                        return Err(io_error("write failed", err));
                    }
                    Err(err) => {
                        warn!(%direction, error = %err, "connection abandoned");
                        connection.desync = Some(err);
                    }
                }
            }
            Input::End(direction) => {
                if let Some(connection) = connection_mut(connections, direction) {
                    connection.open = false;
                }
            }
            Input::Failed(direction, err) => {
                return Err(io_error(&format!("read {}", direction_name(direction)), err));
            }
        }
    }
    Ok(false)
}

fn connection_mut(connections: &mut [Connection], direction: Direction) -> Option<&mut Connection> {
    connections.iter_mut().find(|c| c.direction == direction)
}

fn spawn_reader(
    direction: Direction,
    mut reader: Box<dyn Read + Send>,
    chunk_size: usize,
    tx: Sender<Input>,
) -> io::Result<()> {
    thread::Builder::new()
        .name(format!("read-{}", direction_name(direction)))
        .spawn(move || {
            let mut buf = vec![0u8; chunk_size];
            loop {
                let message = match reader.read(&mut buf) {
                    Ok(0) => Input::End(direction),
                    Ok(n) => Input::Chunk(direction, buf[..n].to_vec()),
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => Input::Failed(direction, err),
                };
                let last = !matches!(message, Input::Chunk(..));
                if tx.send(message).is_err() || last {
                    return;
                }
            }
        })
        .map(|_| ())
}

fn resolve_sources(args: &DecodeArgs) -> CliResult<Vec<(Direction, Source)>> {
    if args.chunk_size == 0 {
        return Err(CliError::new(USAGE, "--chunk-size must be at least 1"));
    }

    let mut sources = Vec::new();
    if let Some(path) = &args.outbound {
        sources.push((Direction::Outbound, Source::from_arg(path)));
    }
    if let Some(path) = &args.inbound {
        sources.push((Direction::Inbound, Source::from_arg(path)));
    }

    let stdin_users = sources
        .iter()
        .filter(|(_, source)| *source == Source::Stdin)
        .count();
    if stdin_users > 1 {
        return Err(CliError::new(
            USAGE,
            "only one of --outbound and --inbound may read stdin",
        ));
    }
    if sources.is_empty() {
        return Err(CliError::new(USAGE, "no capture given"));
    }
    Ok(sources)
}

fn decode_config(args: &DecodeArgs) -> DecodeConfig {
    DecodeConfig {
        frame: FrameConfig {
            max_payload_size: args.max_frame_size,
        },
        render: RenderConfig {
            max_detail_chars: args.max_detail_chars,
        },
    }
}

fn session_tag(token: Option<&str>) -> SessionTag {
    match token {
        Some(token) if !token.is_empty() => SessionTag::from_token(token),
        _ => SessionTag::new(DEFAULT_SESSION_TAG),
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Outbound => "outbound",
        Direction::Inbound => "inbound",
    }
}

fn describe(direction: Direction, source: &Source) -> String {
    match source {
        Source::Stdin => format!("{} (stdin)", direction_name(direction)),
        Source::File(path) => format!("{} {}", direction_name(direction), path.display()),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
