pub mod commands;
pub mod error;
pub mod extract;
pub mod llm;
pub mod palette;
pub mod store;
pub mod utils;

pub use error::{Error, Result};
