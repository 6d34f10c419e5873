//! Configuration section definitions.
//!
//! Each module corresponds to a section in `tuick.toml`:
//!
//! | Module        | TOML Section     | Purpose                              |
//! |---------------|------------------|--------------------------------------|
//! | `editor`      | `[editor]`       | Editor command template              |
//! | `errorformat` | `[errorformat]`  | Structured parsing helper and tools  |
//! | `fzf`         | `[fzf]`          | Front end executable and arguments   |
//! | `watch`       | `[watch]`        | Filesystem monitor                   |

mod editor;
mod errorformat;
mod fzf;
mod watch;

pub use editor::EditorConfig;
pub use errorformat::{ErrorformatConfig, ToolConfig};
pub use fzf::FzfConfig;
pub use watch::WatchConfig;
