//! Configuration loading and management

mod backend;
mod settings;

pub use backend::*;
pub use settings::*;
