//! Connection manager: URL normalization, liveness probe and the shared target record.
//!
//! The bridge talks to exactly one Colab runtime at a time. The current target lives in a
//! [`SharedTarget`] that is swapped as a whole on every successful `connect`; readers (the
//! forwarder) take a snapshot and never observe a half-updated record. A failed probe never
//! touches the record, so the last good URL stays authoritative.

use crate::contracts::{PROBE_PATH, ProbeResponse, TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE};
use crate::error::{BridgeError, describe_reqwest_error};
use parking_lot::RwLock;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// A Colab runtime that answered the liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    base_url: String,
    system: String,
}

impl RemoteTarget {
    /// Normalized root URL: scheme-prefixed, no trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// System name reported by the probe.
    #[must_use]
    pub fn system(&self) -> &str {
        &self.system
    }
}

/// Process-wide connection record. `None` means "never connected".
#[derive(Debug, Clone, Default)]
pub struct SharedTarget {
    inner: Arc<RwLock<Option<Arc<RemoteTarget>>>>,
}

impl SharedTarget {
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<RemoteTarget>> {
        self.inner.read().clone()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.read().is_some()
    }

    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        self.snapshot().map(|t| t.base_url.clone())
    }

    fn replace(&self, target: RemoteTarget) {
        *self.inner.write() = Some(Arc::new(target));
    }
}

/// What a `connect` attempt produced. `Display` renders the text returned to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected { url: String, system: String },
    /// The probe reached a server that answered with a non-2xx status.
    Rejected { url: String, status: u16 },
    /// The probe never produced a usable answer.
    Unreachable { url: String, error: String },
}

impl ConnectOutcome {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Connected { url, .. }
            | Self::Rejected { url, .. }
            | Self::Unreachable { url, .. } => url,
        }
    }
}

impl fmt::Display for ConnectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected { url, system } => {
                write!(f, "Successfully connected to Colab at {url}. System: {system}")
            }
            Self::Rejected { status, .. } => write!(f, "Failed to connect. Status code: {status}"),
            Self::Unreachable { url, error } => {
                write!(f, "Failed to connect to {url}. Error: {error}")
            }
        }
    }
}

/// Normalize a user-supplied tunnel URL.
///
/// Surrounding whitespace is ignored, `https://` is prepended unless the input already starts
/// with `http://` or `https://` (any case), and exactly one trailing `/` is removed.
///
/// The trim and the full-prefix match are intentional. A host that merely starts with "http"
/// (`httpbin.example`) still gets `https://`.
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let mut url = if has_http_scheme(raw) {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    if url.ends_with('/') {
        url.pop();
    }
    url
}

fn has_http_scheme(s: &str) -> bool {
    ["http://", "https://"].iter().any(|prefix| {
        s.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

enum ProbeFailure {
    Status(u16),
    Other(String),
}

#[derive(Debug, Clone)]
pub struct ConnectionManager {
    client: Client,
    target: SharedTarget,
    probe_timeout: Duration,
}

impl ConnectionManager {
    #[must_use]
    pub fn new(client: Client, probe_timeout: Duration) -> Self {
        Self {
            client,
            target: SharedTarget::default(),
            probe_timeout,
        }
    }

    /// Handle on the shared record, for injecting into a [`Forwarder`](crate::forwarder::Forwarder).
    #[must_use]
    pub fn target(&self) -> SharedTarget {
        self.target.clone()
    }

    /// Probe `raw_url` and, if it answers, make it the target for all later requests.
    ///
    /// Never fails: every outcome is reported through [`ConnectOutcome`].
    pub async fn connect(&self, raw_url: &str) -> ConnectOutcome {
        let url = normalize_url(raw_url);

        match self.probe(&url).await {
            Ok(probe) => {
                self.target.replace(RemoteTarget {
                    base_url: url.clone(),
                    system: probe.system.clone(),
                });
                info!(url = %url, system = %probe.system, "connected to colab");
                ConnectOutcome::Connected {
                    url,
                    system: probe.system,
                }
            }
            Err(ProbeFailure::Status(status)) => {
                warn!(url = %url, status, "colab probe rejected");
                ConnectOutcome::Rejected { url, status }
            }
            Err(ProbeFailure::Other(error)) => {
                warn!(url = %url, error = %error, "colab probe failed");
                ConnectOutcome::Unreachable { url, error }
            }
        }
    }

    async fn probe(&self, url: &str) -> std::result::Result<ProbeResponse, ProbeFailure> {
        Url::parse(url).map_err(|e| ProbeFailure::Other(format!("invalid URL: {e}")))?;
        let probe_url = format!("{url}{PROBE_PATH}");

        let response = self
            .client
            .get(probe_url)
            .header(TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| ProbeFailure::Other(describe_reqwest_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeFailure::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProbeFailure::Other(describe_reqwest_error(&e)))?;
        serde_json::from_slice::<ProbeResponse>(&bytes).map_err(|e| {
            ProbeFailure::Other(BridgeError::InvalidResponse(format!("probe body: {e}")).to_string())
        })
    }
}
