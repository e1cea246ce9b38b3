pub mod error;

pub use error::{ArgusError, ArgusResult};
