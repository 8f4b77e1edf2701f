//! `scry-toolclient` — the framed-RPC client (C1) and tool handle (C2).
//!
//! C1 owns a child process speaking Content-Length-framed JSON-RPC 2.0 over
//! its stdio pair; C2 normalizes the raw tool-server responses that come
//! back through it.

pub mod client;
pub mod handle;
pub mod protocol;
pub mod transport;

pub use client::ToolClient;
pub use handle::ToolHandle;
pub use transport::TransportError;
