//! Message routing, notification and reply machinery

pub mod context;
pub mod dispatcher;
pub mod gate;
pub mod handler;
pub mod registry;
pub mod responder;

pub use context::*;
pub use dispatcher::*;
pub use gate::*;
pub use handler::*;
pub use registry::*;
pub use responder::*;
