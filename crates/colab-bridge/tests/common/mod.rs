#![allow(dead_code)]

use anyhow::Context as _;
use colab_bridge::config::BridgeConfig;
use colab_bridge::server::ColabBridge;
use rmcp::model::CallToolResult;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

pub use colab_bridge_test_support::{CannedResponse, MockColab, pick_unused_port};

pub fn bridge() -> ColabBridge {
    bridge_with(BridgeConfig::default())
}

pub fn bridge_with(config: BridgeConfig) -> ColabBridge {
    ColabBridge::new(&config).expect("build bridge")
}

pub fn short_timeouts() -> BridgeConfig {
    BridgeConfig {
        probe_timeout: Duration::from_millis(300),
        request_timeout: Duration::from_millis(300),
        initial_url: None,
    }
}

/// A URL nothing is listening on.
pub fn unreachable_url() -> anyhow::Result<String> {
    Ok(format!("http://127.0.0.1:{}", pick_unused_port()?))
}

/// First text block of a tool result.
pub fn result_text(result: &CallToolResult) -> anyhow::Result<String> {
    let v = serde_json::to_value(result).context("CallToolResult serializes")?;
    v.get("content")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("missing content[0].text")
}

/// The `colab-bridge` binary driven over stdio, one JSON-RPC message per line.
pub struct StdioSession {
    _child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl StdioSession {
    pub async fn spawn(extra_args: &[&str]) -> anyhow::Result<Self> {
        let bin = env!("CARGO_BIN_EXE_colab-bridge");
        let mut child = Command::new(bin)
            .args(["--log-level", "warn"])
            .args(extra_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("spawn colab-bridge")?;

        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;

        let mut session = Self {
            _child: child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        };
        session.initialize().await?;
        Ok(session)
    }

    async fn initialize(&mut self) -> anyhow::Result<()> {
        let init = self
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "colab-bridge-integration-tests", "version": "0" }
                }),
            )
            .await?;
        anyhow::ensure!(
            init.pointer("/result/serverInfo/name") == Some(&json!("colab-bridge")),
            "unexpected initialize response: {init}"
        );
        self.send(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await
    }

    pub async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(msg)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    pub async fn request(&mut self, id: u64, method: &str, params: Value) -> anyhow::Result<Value> {
        self.send(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await?;

        loop {
            let line = tokio::time::timeout(Duration::from_secs(10), self.lines.next_line())
                .await
                .with_context(|| format!("timeout waiting for response to {method}"))??
                .context("colab-bridge closed stdout")?;
            let msg: Value = serde_json::from_str(&line)
                .with_context(|| format!("stdout line is not JSON: {line}"))?;
            if msg.get("id") == Some(&json!(id)) {
                return Ok(msg);
            }
        }
    }

    /// `tools/call` and return `result.content[0].text`.
    pub async fn call_tool(&mut self, id: u64, name: &str, arguments: Value) -> anyhow::Result<String> {
        let msg = self
            .request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        msg.pointer("/result/content/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .with_context(|| format!("tools/call {name} missing text: {msg}"))
    }
}
