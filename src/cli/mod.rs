//! Command-line interface module.
//!
//! One file per role. The top-level `list` role drives the session; fzf
//! runs every other role as a child process.

mod args;
pub mod format;
pub mod list;
pub mod message;
pub mod reload;
pub mod select;
pub mod source;
pub mod start;

pub use args::{Cli, Role};
