//! The framed-RPC client (C1): owns a child process and speaks
//! Content-Length-framed JSON-RPC 2.0 over its stdio pair.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;

use scry_domain::config::ToolServerConfig;

use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::transport::{read_frame, write_frame, TransportError};

struct Connection {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    child: Child,
}

impl Connection {
    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

/// Owns at most one live child-process connection. All requests are
/// serialized through `conn`'s mutex: the transport is strictly
/// request/response, single-request-at-a-time, per the framing contract.
pub struct ToolClient {
    config: ToolServerConfig,
    conn: Mutex<Option<Connection>>,
    next_id: AtomicU64,
}

impl ToolClient {
    pub fn new(config: ToolServerConfig) -> Self {
        Self {
            config,
            conn: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Spawn the child and perform the `tools/list` handshake. Idempotent:
    /// returns ok immediately if already connected and alive; re-spawns if
    /// the previous child has exited.
    pub async fn connect(&self) -> Result<(), TransportError> {
        {
            let mut guard = self.conn.lock().await;
            if let Some(conn) = guard.as_mut() {
                if conn.is_alive() {
                    return Ok(());
                }
                *guard = None;
            }
        }

        let mut cmd = tokio::process::Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Io(broken_pipe("failed to capture child stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Io(broken_pipe("failed to capture child stdout")))?;

        {
            let mut guard = self.conn.lock().await;
            *guard = Some(Connection {
                stdin,
                stdout: BufReader::new(stdout),
                child,
            });
        }

        let handshake = JsonRpcRequest::new(1, "tools/list", Some(serde_json::json!({})));
        match self.roundtrip(&handshake).await {
            Ok(resp) if resp.result.is_some() => Ok(()),
            Ok(_) => {
                self.teardown_after_failure().await;
                Err(TransportError::TransportBroken(
                    "handshake response missing result".into(),
                ))
            }
            Err(e) => {
                self.teardown_after_failure().await;
                Err(e)
            }
        }
    }

    /// List tool names discovered by the handshake (or a fresh `tools/list`
    /// call if already connected). `None` on any transport failure.
    pub async fn list_tools(&self) -> Option<Vec<String>> {
        let id = self.next_request_id();
        let req = JsonRpcRequest::new(id, "tools/list", Some(serde_json::json!({})));
        let resp = self.roundtrip(&req).await.ok()?;
        let result = resp.result?;
        let tools = result.get("tools")?.as_array()?;
        Some(
            tools
                .iter()
                .filter_map(|t| t.get("name").and_then(Value::as_str).map(str::to_string))
                .collect(),
        )
    }

    /// Send a caller-constructed raw JSON-RPC request string. The client
    /// validates it parses as JSON and adds framing; it does not inspect
    /// method or params. Returns `None` on any failure (not connected,
    /// transport broken, or non-JSON response body) — retries are C6's
    /// responsibility, not this client's.
    pub async fn tool_call(&self, raw_json_rpc_string: &str) -> Option<Value> {
        let parsed: Value = serde_json::from_str(raw_json_rpc_string).ok()?;
        let id = parsed.get("id").and_then(Value::as_u64);

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut()?;
        if write_frame(&mut conn.stdin, raw_json_rpc_string).await.is_err() {
            drop(guard);
            self.teardown_after_failure().await;
            return None;
        }
        let value = match read_frame(&mut conn.stdout).await {
            Ok(v) => v,
            Err(_) => {
                drop(guard);
                self.teardown_after_failure().await;
                return None;
            }
        };
        drop(guard);

        if let Some(expected) = id {
            if value.get("id").and_then(Value::as_u64) != Some(expected) {
                return None;
            }
        }
        Some(value)
    }

    /// Send termination, wait up to 5 seconds, force-kill if still alive.
    pub async fn close(&self) {
        let mut guard = self.conn.lock().await;
        if let Some(mut conn) = guard.take() {
            use tokio::io::AsyncWriteExt;
            let _ = conn.stdin.shutdown().await;
            let waited = tokio::time::timeout(std::time::Duration::from_secs(5), conn.child.wait()).await;
            if waited.is_err() {
                let _ = conn.child.kill().await;
            }
        }
    }

    async fn roundtrip(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let body = serde_json::to_string(req).map_err(|e| TransportError::Decode(e.to_string()))?;
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(TransportError::NotConnected)?;
        write_frame(&mut conn.stdin, &body).await?;
        let value = read_frame(&mut conn.stdout).await?;
        serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn teardown_after_failure(&self) {
        let mut guard = self.conn.lock().await;
        if let Some(mut conn) = guard.take() {
            let mut stderr_buf = String::new();
            if let Some(mut stderr) = conn.child.stderr.take() {
                let _ = stderr.read_to_string(&mut stderr_buf).await;
            }
            if !stderr_buf.is_empty() {
                tracing::warn!(stderr = %stderr_buf, "tool server exited with diagnostics");
            }
            let _ = conn.child.kill().await;
        }
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

fn broken_pipe(msg: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::BrokenPipe, msg.to_string())
}
