//! Reload requests sent to fzf's `--listen` endpoint.

use std::time::Duration;

use reqwest::blocking::Client;

use super::MonitorError;
use crate::debug;

/// HTTP client for fzf's control endpoint.
pub struct FzfNotifier {
    client: Client,
    api_key: String,
    reload_command: String,
}

impl FzfNotifier {
    pub fn new(
        api_key: impl Into<String>,
        reload_command: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MonitorError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            reload_command: reload_command.into(),
        })
    }

    /// Action string understood by fzf.
    pub fn body(&self) -> String {
        format!("reload:{}", self.reload_command)
    }

    /// Ask fzf listening on `port` to run the reload command.
    pub fn reload(&self, port: u16) -> Result<(), MonitorError> {
        let url = format!("http://127.0.0.1:{port}");
        let body = self.body();
        debug!("monitor"; "POST {url}");
        debug!("monitor"; "  body: {body:?}");

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .body(body)
            .send()?;

        let status = response.status();
        debug!("monitor"; "  status: {status}");
        let text = response.text().unwrap_or_default();
        if !text.is_empty() {
            debug!("monitor"; "  response: {text:?}");
        }
        if status.is_success() {
            Ok(())
        } else {
            Err(MonitorError::Rejected(status.as_u16()))
        }
    }
}
