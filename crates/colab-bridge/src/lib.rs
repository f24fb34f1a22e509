//! Colab bridge: expose a remote Colab runtime as MCP tools.
//!
//! The bridge forwards tool calls as HTTP requests to the Colab server script, reached through a
//! tunnel (ngrok, serveo, ...). Leaf-first:
//! - [`connection`]: URL normalization, liveness probe, the shared target record
//! - [`forwarder`]: timeout-bounded requests against the current target
//! - [`contracts`] / [`render`]: remote wire shapes and their text rendering
//! - [`server`]: the MCP tool handlers

pub mod config;
pub mod connection;
pub mod contracts;
pub mod error;
pub mod forwarder;
pub mod render;
pub mod server;

pub use error::{BridgeError, Result};
