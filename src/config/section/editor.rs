//! `[editor]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [editor]
//! command = ["code", "--goto", "{path}:{line}:{column}"]
//! ```
//!
//! Without this section, `$VISUAL` or `$EDITOR` is run as `<editor> +<line> <path>`.

use serde::Deserialize;

use crate::config::error::ConfigDiagnostics;

/// Editor invocation settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Command template; `{path}`, `{line}` and `{column}` are substituted.
    pub command: Option<Vec<String>>,
}

impl EditorConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.command.as_ref().is_some_and(Vec::is_empty) {
            diag.error_with_hint(
                "editor.command",
                "must not be empty",
                "remove the field to use $VISUAL or $EDITOR",
            );
        }
    }
}
