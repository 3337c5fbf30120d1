//! Schema module - Configuration, encoding and persisted state types.

mod checkpoint;
mod config;
mod encoding;
mod individual;
mod network;
mod report;

pub use checkpoint::*;
pub use config::*;
pub use encoding::*;
pub use individual::*;
pub use network::*;
pub use report::*;
