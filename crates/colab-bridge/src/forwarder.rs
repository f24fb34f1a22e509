//! Request forwarder: frames one outbound call against the current Colab target.
//!
//! Every call is a single attempt bounded by the request timeout. There are no retries; a
//! failure is surfaced to the tool handler immediately.

use crate::connection::SharedTarget;
use crate::contracts::{
    ExecResult, PYTHON_PATH, PythonRequest, SHELL_PATH, SYSTEM_INFO_PATH, ShellRequest,
    SystemInfo, TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE,
};
use crate::error::{BridgeError, Result};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client,
    target: SharedTarget,
    timeout: Duration,
}

impl Forwarder {
    #[must_use]
    pub fn new(client: Client, target: SharedTarget, timeout: Duration) -> Self {
        Self {
            client,
            target,
            timeout,
        }
    }

    /// Issue `method <base_url><endpoint>` and return the parsed JSON body.
    ///
    /// `endpoint` must start with `/`; it is appended verbatim.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::NotConnected`] if no probe has succeeded yet.
    /// - [`BridgeError::HttpStatus`] if the remote answers with a non-2xx status.
    /// - [`BridgeError::Transport`] on timeouts, connection failures or a body that is not JSON.
    pub async fn forward<P>(&self, endpoint: &str, method: Method, payload: Option<&P>) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        let target = self.target.snapshot().ok_or(BridgeError::NotConnected)?;
        let url = format!("{}{endpoint}", target.base_url());
        debug!(endpoint, method = %method, "forwarding request to colab");

        let result = self.send(method.clone(), &url, payload).await;
        if let Err(e) = &result {
            warn!(endpoint, method = %method, error = %e, "colab request failed");
        }
        result
    }

    /// Like [`forward`](Self::forward), decoding the body into a typed contract.
    ///
    /// # Errors
    ///
    /// Everything [`forward`](Self::forward) returns, plus [`BridgeError::InvalidResponse`] when
    /// the JSON does not match `T`.
    pub async fn forward_as<T, P>(
        &self,
        endpoint: &str,
        method: Method,
        payload: Option<&P>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let value = self.forward(endpoint, method, payload).await?;
        serde_json::from_value(value)
            .map_err(|e| BridgeError::InvalidResponse(format!("{endpoint}: {e}")))
    }

    /// `POST /exec/shell`.
    ///
    /// # Errors
    ///
    /// See [`forward_as`](Self::forward_as).
    pub async fn exec_shell(&self, command: &str) -> Result<ExecResult> {
        self.forward_as(SHELL_PATH, Method::POST, Some(&ShellRequest { command }))
            .await
    }

    /// `POST /exec/python`.
    ///
    /// # Errors
    ///
    /// See [`forward_as`](Self::forward_as).
    pub async fn exec_python(&self, code: &str) -> Result<ExecResult> {
        self.forward_as(PYTHON_PATH, Method::POST, Some(&PythonRequest { code }))
            .await
    }

    /// `GET /info/system`.
    ///
    /// # Errors
    ///
    /// See [`forward_as`](Self::forward_as).
    pub async fn system_info(&self) -> Result<SystemInfo> {
        self.forward_as(SYSTEM_INFO_PATH, Method::GET, None::<&Value>)
            .await
    }

    async fn send<P>(&self, method: Method, url: &str, payload: Option<&P>) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        let mut request = self
            .client
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE)
            .timeout(self.timeout);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| BridgeError::Transport(format!("error decoding response body: {e}")))
    }
}
