//! Payload serialization codecs

pub mod binary;
pub mod config;
pub mod json;
pub mod traits;

pub use binary::*;
pub use config::*;
pub use json::*;
pub use traits::*;
