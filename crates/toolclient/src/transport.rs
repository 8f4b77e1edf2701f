//! Content-Length framed JSON-RPC transport over a child process's stdio pair.
//!
//! Each frame is `Content-Length: <N>\r\n\r\n` followed immediately by exactly
//! `N` bytes of UTF-8 JSON. Header lines are matched case-insensitively; a
//! missing `Content-Length` header is a [`TransportError::TransportBroken`].

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport not connected")]
    NotConnected,

    #[error("transport broken: {0}")]
    TransportBroken(String),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Write one framed JSON-RPC body to `stdin`.
pub async fn write_frame<W: AsyncWrite + Unpin>(stdin: &mut W, body: &str) -> Result<(), TransportError> {
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    stdin.write_all(header.as_bytes()).await?;
    stdin.write_all(body.as_bytes()).await?;
    stdin.flush().await?;
    Ok(())
}

/// Read one framed JSON-RPC body from `stdout`, returning the decoded value.
///
/// A header-parse failure or EOF is [`TransportError::TransportBroken`] (the
/// caller should reset the connection); a non-JSON body is
/// [`TransportError::Decode`] (the caller surfaces this as a nil result, per
/// the no-retry-inside-C1 contract).
pub async fn read_frame<R: AsyncBufRead + AsyncRead + Unpin>(stdout: &mut R) -> Result<Value, TransportError> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let bytes_read = stdout.read_line(&mut line).await?;
        if bytes_read == 0 {
            return Err(TransportError::TransportBroken("EOF while reading headers".into()));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some((name, value)) = trimmed.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().ok();
            }
        }
    }

    let len = content_length
        .ok_or_else(|| TransportError::TransportBroken("missing Content-Length header".into()))?;

    let mut body = vec![0u8; len];
    stdout.read_exact(&mut body).await?;

    serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn read_frame_parses_content_length_case_insensitively() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{}}"#;
        let raw = format!("content-length: {}\r\n\r\n{}", body.len(), body);
        let mut reader = BufReader::new(Cursor::new(raw.into_bytes()));
        let value = read_frame(&mut reader).await.unwrap();
        assert_eq!(value["id"], 1);
    }

    #[tokio::test]
    async fn read_frame_missing_header_is_broken() {
        let raw = b"\r\n{}".to_vec();
        let mut reader = BufReader::new(Cursor::new(raw));
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, TransportError::TransportBroken(_)));
    }

    #[tokio::test]
    async fn read_frame_non_json_body_is_decode_error() {
        let raw = b"Content-Length: 7\r\n\r\nnot-son".to_vec();
        let mut reader = BufReader::new(Cursor::new(raw));
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn write_then_read_frame_round_trips_the_exact_value() {
        let original = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"tools": [{"name": "search"}]},
        });
        let mut writer = Cursor::new(Vec::new());
        write_frame(&mut writer, &original.to_string()).await.unwrap();
        let mut reader = BufReader::new(Cursor::new(writer.into_inner()));
        let decoded = read_frame(&mut reader).await.unwrap();
        assert_eq!(decoded, original);
    }
}
