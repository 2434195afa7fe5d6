//! Exchange core
//!
//! Role-paired message handling: per-protocol dispatch tables, observer
//! gates that build a reply, and a responder that splits result sets into
//! correlated multi-part messages.

#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod routing;
pub mod session;

pub use codec::*;
pub use config::*;
pub use error::*;
pub use handlers::*;
pub use protocol::*;
pub use routing::*;
pub use session::*;
