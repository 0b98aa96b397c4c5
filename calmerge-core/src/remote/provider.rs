//! Target provider subprocesses.
//!
//! A provider is any executable named `calmerge-provider-<name>` on PATH
//! that answers the JSON protocol in [`crate::remote::protocol`]. Providers
//! own their credentials; calmerge only forwards the `[target]` table.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::constants::PROVIDER_BINARY_PREFIX;
use crate::error::{CalMergeError, CalMergeResult};
use crate::remote::protocol::{Command, ProviderCommand, Request, Response};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn binary_name(&self) -> String {
        format!("{PROVIDER_BINARY_PREFIX}{}", self.0)
    }

    fn binary_path(&self) -> CalMergeResult<PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| CalMergeError::ProviderNotInstalled(binary_name))
    }

    /// Call a typed provider command, bounded by the provider timeout.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> CalMergeResult<C::Response> {
        timeout(PROVIDER_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| CalMergeError::ProviderTimeout(PROVIDER_TIMEOUT.as_secs()))?
    }

    async fn call_raw<P: Serialize, R: DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> CalMergeResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| CalMergeError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| CalMergeError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        debug!(provider = %self.0, ?command, "calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CalMergeError::Provider(format!("Failed to spawn {}: {e}", binary_path.display()))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CalMergeError::Provider("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(CalMergeError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_response<R: DeserializeOwned>(raw: &str) -> CalMergeResult<R> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CalMergeError::Provider("Provider returned no response".into()));
    }

    let response: Response<R> = serde_json::from_str(raw)
        .map_err(|e| CalMergeError::Provider(format!("Failed to parse response: {e}")))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(CalMergeError::Provider(error)),
    }
}
