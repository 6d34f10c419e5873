//! `[errorformat]` section configuration.
//!
//! Registers tools whose output is parsed by the errorformat helper instead
//! of the heuristic segmenter. Tools are matched by the file name of the
//! command's program.
//!
//! # Example
//!
//! ```toml
//! [errorformat]
//! binary = "errorformat"
//!
//! [errorformat.tools.mypy]
//! args = ["-name=mypy"]
//! group = true
//!
//! [errorformat.tools.ruff]
//! args = ["%f:%l:%c: %m"]
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::config::error::ConfigDiagnostics;

/// Structured parsing settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorformatConfig {
    pub binary: String,
    pub tools: BTreeMap<String, ToolConfig>,
}

/// Helper arguments for one tool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Arguments passed to the helper after `-w=jsonl`.
    pub args: Vec<String>,
    /// Merge notes and same-location records into one block.
    #[serde(default)]
    pub group: bool,
}

impl Default for ErrorformatConfig {
    fn default() -> Self {
        Self {
            binary: "errorformat".into(),
            tools: BTreeMap::new(),
        }
    }
}

impl ErrorformatConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (name, tool) in &self.tools {
            if tool.args.is_empty() {
                diag.error_with_hint(
                    format!("errorformat.tools.{name}.args"),
                    "must not be empty",
                    format!("use args = [\"-name={name}\"] for a builtin errorformat"),
                );
            }
        }
    }
}
