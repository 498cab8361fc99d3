pub mod error;
pub mod types;

pub use error::{ScriptError, ScriptLocation};
pub use types::*;
