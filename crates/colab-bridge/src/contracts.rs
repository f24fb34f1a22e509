//! Wire shapes exchanged with the Colab server script.
//!
//! Each remote endpoint gets a typed request and response so that malformed replies surface as
//! [`BridgeError::InvalidResponse`](crate::error::BridgeError::InvalidResponse) instead of
//! rendering garbage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Liveness probe path.
pub const PROBE_PATH: &str = "/";
pub const SHELL_PATH: &str = "/exec/shell";
pub const PYTHON_PATH: &str = "/exec/python";
pub const SYSTEM_INFO_PATH: &str = "/info/system";

/// Suppresses the ngrok interstitial ("You are about to visit...") page.
pub const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";
pub const TUNNEL_BYPASS_VALUE: &str = "true";

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbeResponse {
    pub system: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShellRequest<'a> {
    pub command: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PythonRequest<'a> {
    pub code: &'a str,
}

/// Result of `POST /exec/shell` and `POST /exec/python`.
///
/// `return_code` is required; the streams default to empty when the server omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecResult {
    pub return_code: i64,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `GET /info/system`. Free-form, but must be a JSON object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SystemInfo(pub Map<String, Value>);
