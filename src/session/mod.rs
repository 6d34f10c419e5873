//! Session coordination between the top-level role and its child roles.
//!
//! The top-level role starts a [`ReloadServer`] and hands its port and key to
//! every process fzf spawns through the environment. Child roles talk back
//! with [`SessionEnv::request`].
//!
//! # Environment
//!
//! | Variable         | Set by     | Meaning                               |
//! |------------------|------------|---------------------------------------|
//! | `TUICK_PORT`     | tuick      | reload server port                    |
//! | `TUICK_API_KEY`  | tuick      | reload server secret                  |
//! | `FZF_API_KEY`    | tuick      | secret for fzf's `--listen` endpoint  |
//! | `FZF_PORT`       | fzf        | port of fzf's `--listen` endpoint     |

mod client;
mod latch;
mod process;
mod server;
pub mod signal;

pub use latch::PortLatch;
pub use process::CommandSlot;
pub use server::ReloadServer;

use std::io;
use thiserror::Error;

pub const PORT_ENV: &str = "TUICK_PORT";
pub const API_KEY_ENV: &str = "TUICK_API_KEY";
pub const FZF_API_KEY_ENV: &str = "FZF_API_KEY";
pub const FZF_PORT_ENV: &str = "FZF_PORT";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("`{0}` is not set; this role only runs inside a tuick session")]
    MissingEnv(&'static str),

    #[error("invalid value {value:?} for `{name}`")]
    InvalidEnv { name: &'static str, value: String },

    #[error("unexpected reply from session server: expected {expected:?}, got {got:?}")]
    UnexpectedReply { expected: &'static str, got: String },

    #[error("session server I/O error")]
    Io(#[from] io::Error),
}

/// Fresh random secret for one session.
pub fn new_api_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Whether this process runs inside an existing session.
pub fn in_session() -> bool {
    std::env::var_os(PORT_ENV).is_some()
}

/// Connection details of the enclosing session's reload server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnv {
    pub port: u16,
    pub api_key: String,
}

impl SessionEnv {
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SessionError> {
        let port = parse_port(PORT_ENV, &lookup)?;
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.is_empty())
            .ok_or(SessionError::MissingEnv(API_KEY_ENV))?;
        Ok(Self { port, api_key })
    }
}

/// Port of fzf's control endpoint, exported by fzf to its child commands.
pub fn fzf_port_from_env() -> Result<u16, SessionError> {
    parse_port(FZF_PORT_ENV, &|name| std::env::var(name).ok())
}

fn parse_port(
    name: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<u16, SessionError> {
    let value = lookup(name)
        .filter(|value| !value.is_empty())
        .ok_or(SessionError::MissingEnv(name))?;
    value
        .trim()
        .parse()
        .map_err(|_| SessionError::InvalidEnv { name, value })
}
