//! Configuration management for `tuick.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── editor     # [editor]
//! │   ├── errorformat# [errorformat] and [errorformat.tools.NAME]
//! │   ├── fzf        # [fzf]
//! │   └── watch      # [watch]
//! ├── error          # ConfigError, ConfigDiagnostics
//! └── mod.rs         # TuickConfig (this file)
//! ```
//!
//! The file is optional: without one every section takes its defaults.

pub mod error;
pub mod section;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{EditorConfig, ErrorformatConfig, FzfConfig, WatchConfig};

use crate::{cli::Cli, debug};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "tuick.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing tuick.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TuickConfig {
    /// Absolute path to the loaded config file (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    pub fzf: FzfConfig,
    pub watch: WatchConfig,
    pub errorformat: ErrorformatConfig,
    pub editor: EditorConfig,
}

impl TuickConfig {
    /// Load configuration for the given CLI arguments.
    ///
    /// An explicit `--config` file must exist. Otherwise `tuick.toml` is
    /// searched upward from cwd and defaults are used when none is found.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let path = match &cli.config {
            Some(path) => Some(path.clone()),
            None => find_config_file(Path::new(CONFIG_FILE)),
        };

        let mut config = match path {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = Some(path);
                config
            }
            None => Self::default(),
        };
        match &config.config_path {
            Some(path) => debug!("config"; "loaded {}", path.display()),
            None => debug!("config"; "no {CONFIG_FILE} found, using defaults"),
        }

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).map_err(|err| ConfigError::Toml(path.to_path_buf(), err))
    }

    /// CLI flags override file settings.
    fn apply_cli(&mut self, cli: &Cli) {
        if cli.no_watch {
            self.watch.enable = false;
        }
    }

    /// Validate all sections, collecting every error before reporting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.watch.validate(&mut diag);
        self.errorformat.validate(&mut diag);
        self.editor.validate(&mut diag);
        diag.into_result()
    }
}

/// Find config file by searching upward from current directory
///
/// ```text
/// /home/user/project/src/pkg/   ← cwd
/// /home/user/project/tuick.toml ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}

fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }
    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from TOML, panicking on syntax errors or unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> TuickConfig {
    TuickConfig::from_str(content).unwrap()
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = TuickConfig::from_str("[fzf\nbinary = \"fzf\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(TuickConfig::from_str("[unknown_section]\nfield = 1").is_err());
        assert!(TuickConfig::from_str("[watch]\nenabled = true").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TuickConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let config = test_parse_config(
            "[watch]\nnotify_timeout_secs = 0\n[editor]\ncommand = []\n\
             [errorformat.tools.x]\nargs = []",
        );
        match config.validate() {
            Err(ConfigError::Validation(diag)) => assert_eq!(diag.errors().len(), 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_find_config_file_upward() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        let found = find_config_file_from(&nested, Path::new(CONFIG_FILE));
        assert_eq!(found, Some(dir.path().join(CONFIG_FILE)));
    }

    #[test]
    fn test_find_config_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            find_config_file_from(dir.path(), Path::new("no-such-tuick.toml")),
            None
        );
    }

    #[test]
    fn test_load_explicit_file_and_cli_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[watch]\nenable = true\n[fzf]\nbinary = \"sk\"").unwrap();

        let cli = Cli::parse_from([
            "tuick",
            "--config",
            path.to_str().unwrap(),
            "--no-watch",
            "--",
            "true",
        ]);
        let config = TuickConfig::load(&cli).unwrap();
        assert_eq!(config.fzf.binary, "sk");
        assert!(!config.watch.enable);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let cli = Cli::parse_from(["tuick", "-C", "/nonexistent/tuick.toml", "--", "true"]);
        assert!(matches!(
            TuickConfig::load(&cli),
            Err(ConfigError::Io(..))
        ));
    }
}
