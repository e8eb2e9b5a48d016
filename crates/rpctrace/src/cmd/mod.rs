use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand};
use rpctrace_decode::DEFAULT_MAX_DETAIL_CHARS;
use rpctrace_frame::DEFAULT_MAX_PAYLOAD;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode captured connection bytes into one line per frame.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("input")
        .args(["outbound", "inbound"])
        .required(true)
        .multiple(true)
))]
pub struct DecodeArgs {
    /// Reconnection token of the captured session. Its last `-` segment
    /// tags every line.
    #[arg(long, env = "RPCTRACE_TOKEN")]
    pub token: Option<String>,
    /// Capture of front end to back end bytes (`-` for stdin).
    #[arg(long, value_name = "FILE")]
    pub outbound: Option<PathBuf>,
    /// Capture of back end to front end bytes (`-` for stdin).
    #[arg(long, value_name = "FILE")]
    pub inbound: Option<PathBuf>,
    /// Bytes read per chunk.
    #[arg(long, value_name = "BYTES", default_value_t = 64 * 1024)]
    pub chunk_size: usize,
    /// Cap on each rendered detail, in characters.
    #[arg(long, value_name = "CHARS", default_value_t = DEFAULT_MAX_DETAIL_CHARS)]
    pub max_detail_chars: usize,
    /// Largest trusted frame payload; anything larger desynchronizes the stream.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_frame_size: usize,
    /// Print method and command counts when decoding ends.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
