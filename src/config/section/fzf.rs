//! `[fzf]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [fzf]
//! binary = "fzf"              # Front end executable
//! args = ["--height=80%"]     # Appended after the built-in arguments
//! ```

use serde::Deserialize;

/// Interactive front end settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FzfConfig {
    pub binary: String,
    pub args: Vec<String>,
}

impl Default for FzfConfig {
    fn default() -> Self {
        Self {
            binary: "fzf".into(),
            args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_fzf_config() {
        let config = test_parse_config("[fzf]\nbinary = \"/opt/fzf\"\nargs = [\"--height=50%\"]");
        assert_eq!(config.fzf.binary, "/opt/fzf");
        assert_eq!(config.fzf.args, ["--height=50%"]);
    }

    #[test]
    fn test_fzf_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.fzf.binary, "fzf");
        assert!(config.fzf.args.is_empty());
    }
}
