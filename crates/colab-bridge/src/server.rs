//! MCP tool surface.
//!
//! Four thin handlers over the connection manager and the forwarder. Failures are never
//! reported as protocol errors: every outcome comes back as text in a successful
//! `CallToolResult` so the calling agent can read it.

use crate::config::BridgeConfig;
use crate::connection::ConnectionManager;
use crate::error::BridgeError;
use crate::forwarder::Forwarder;
use crate::render;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, ErrorData, Implementation, ServerCapabilities, ServerInfo,
};
use rmcp::{ServerHandler, schemars, tool, tool_handler, tool_router};
use serde::Deserialize;
use tracing::info;

pub const SERVER_NAME: &str = "colab-bridge";

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct ConnectParams {
    /// The public URL printed by the Colab server script (e.g. 'https://xxxx.ngrok-free.app' or
    /// 'https://...serveousercontent.com')
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct ShellParams {
    /// The shell command to run (e.g. 'ls -la', 'pip install pandas')
    pub command: String,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct PythonParams {
    /// The Python code to execute
    pub code: String,
}

#[derive(Clone)]
pub struct ColabBridge {
    connections: ConnectionManager,
    forwarder: Forwarder,
    tool_router: ToolRouter<ColabBridge>,
}

impl ColabBridge {
    /// Build the bridge with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] if the HTTP client cannot be constructed.
    pub fn new(config: &BridgeConfig) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("colab-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// The manager and the forwarder share `client` (one connection pool) and one target record.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &BridgeConfig) -> Self {
        let connections = ConnectionManager::new(client.clone(), config.probe_timeout);
        let forwarder = Forwarder::new(client, connections.target(), config.request_timeout);
        Self {
            connections,
            forwarder,
            tool_router: Self::tool_router(),
        }
    }

    #[must_use]
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    #[must_use]
    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }
}

fn text(s: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(s)])
}

#[tool_router]
impl ColabBridge {
    #[tool(
        description = "Connect to a Google Colab runtime through the public tunnel URL printed by the Colab server script. Must be called before any other Colab tool."
    )]
    pub async fn connect_to_colab(
        &self,
        Parameters(params): Parameters<ConnectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let outcome = self.connections.connect(&params.url).await;
        Ok(text(outcome.to_string()))
    }

    #[tool(
        description = "Run a shell command on the connected Colab runtime. Returns the exit code, stdout and stderr."
    )]
    pub async fn run_colab_shell(
        &self,
        Parameters(params): Parameters<ShellParams>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(command = %params.command, "run_colab_shell");
        Ok(text(match self.forwarder.exec_shell(&params.command).await {
            Ok(result) => render::shell_output(&result),
            Err(e) => format!("Error executing shell command: {e}"),
        }))
    }

    #[tool(
        description = "Execute Python code on the connected Colab runtime. Returns captured stdout and stderr."
    )]
    pub async fn run_colab_python(
        &self,
        Parameters(params): Parameters<PythonParams>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(code_len = params.code.len(), "run_colab_python");
        Ok(text(match self.forwarder.exec_python(&params.code).await {
            Ok(result) => render::python_output(&result),
            Err(e) => format!("Error executing Python code: {e}"),
        }))
    }

    #[tool(
        description = "Get system information (GPU, RAM, disk, Python version) from the connected Colab runtime."
    )]
    pub async fn get_colab_system_info(&self) -> Result<CallToolResult, ErrorData> {
        Ok(text(match self.forwarder.system_info().await {
            Ok(info) => render::system_info(&info),
            Err(e) => format!("Error fetching system info: {e}"),
        }))
    }
}

#[tool_handler]
impl ServerHandler for ColabBridge {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();
        server_info.version = env!("CARGO_PKG_VERSION").to_string();

        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = server_info;
        info.instructions = Some(
            "Bridge to a Google Colab runtime. Call connect_to_colab with the tunnel URL first, \
             then use run_colab_shell, run_colab_python and get_colab_system_info."
                .to_string(),
        );
        info
    }
}
