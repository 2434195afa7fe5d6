pub mod constants;
pub mod envelope;
pub mod flags;
pub mod messages;
pub mod roles;
pub mod types;
pub mod utils;

pub use constants::*;
pub use envelope::*;
pub use flags::*;
pub use messages::*;
pub use roles::*;
pub use types::*;
