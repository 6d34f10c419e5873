//! Utility modules: ANSI handling, process execution, line reading, quoting.

pub mod ansi;
pub mod exec;
pub mod lines;
pub mod shell;
