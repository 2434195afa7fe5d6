pub mod builder;
pub mod conversion;
pub mod types;
pub mod validation;

pub use builder::*;
pub use conversion::*;
pub use types::*;
pub use validation::*;
