//! Stream transport for exchange handlers
//!
//! Length-prefixed framing over any tokio `AsyncRead`/`AsyncWrite`, a
//! `Session` that writes one frame per message, and a reader that turns
//! frames back into envelopes for dispatch.

#![forbid(unsafe_code)]

pub mod config;
pub mod envelope;
pub mod error;
pub mod framer;
pub mod reader;
pub mod session;
pub mod writer;

pub use config::*;
pub use envelope::*;
pub use error::*;
pub use framer::*;
pub use reader::*;
pub use session::*;
pub use writer::*;
