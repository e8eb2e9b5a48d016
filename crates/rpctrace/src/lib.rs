//! Passive decoder for captured extension-host IPC traffic.
//!
//! rpctrace reads raw bytes captured from either side of an extension-host
//! socket and prints one line per frame, decoding the control protocol and
//! the binary RPC protocol carried inside.
//!
//! # Crate Structure
//!
//! - [`frame`]: Outer frame header codec and chunk demultiplexer
//! - [`value`]: Tagged value codec used by the control protocol
//! - [`decode`]: Classification, inner-protocol decoding and line reporting

/// Re-export frame types.
pub mod frame {
    pub use rpctrace_frame::*;
}

/// Re-export value codec types.
pub mod value {
    pub use rpctrace_value::*;
}

/// Re-export decoding pipeline types.
pub mod decode {
    pub use rpctrace_decode::*;
}
