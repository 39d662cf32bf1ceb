//! LLM provider layer
//!
//! One completion operation over two backends: an OpenAI-compatible chat
//! completions endpoint and a local Ollama-compatible `/api/chat` endpoint.

mod client;
mod config;
mod ollama;
mod openai;

pub use client::*;
pub use config::*;
pub use ollama::*;
pub use openai::*;

#[cfg(test)]
pub(crate) mod stub {
    //! Single-shot HTTP server for exercising the backends without a real endpoint

    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// What the backend sent
    #[derive(Debug)]
    pub struct RecordedRequest {
        /// e.g. "POST /api/chat HTTP/1.1"
        pub request_line: String,
        pub body: Value,
    }

    fn header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Accept one connection, answer it with `status` and `body`, and report the request.
    ///
    /// Returns the base URL (`http://127.0.0.1:PORT`) and a receiver for the request.
    pub async fn serve_once(
        status: u16,
        body: &str,
    ) -> (String, oneshot::Receiver<RecordedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_string();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let head_len = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = header_end(&buf) {
                    break end;
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_len]).to_string();
            let total = head_len + content_length(&head);
            while buf.len() < total {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending the body");
                buf.extend_from_slice(&chunk[..n]);
            }

            let request_body = serde_json::from_slice(&buf[head_len..total]).unwrap_or(Value::Null);
            let reason = if status < 400 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            let _ = tx.send(RecordedRequest {
                request_line: head.lines().next().unwrap_or_default().to_string(),
                body: request_body,
            });
        });

        (format!("http://{}", addr), rx)
    }
}
