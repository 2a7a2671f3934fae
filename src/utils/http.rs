use anyhow::{Result, bail};
use reqwest::{Client, Response};
use std::time::Duration;

/// Connect timeout shared by every outbound client.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Cap for error bodies read back from upstream APIs (64 KB).
pub const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Build a `reqwest::Client` with a 10 s connect timeout and the given
/// overall request timeout.
///
/// Falls back to the default client if the builder fails.
pub fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Download a response body as bytes, failing if it exceeds `max_bytes`.
///
/// - Checks the `Content-Length` header first; rejects immediately if over limit.
/// - Streams via `chunk()` with a running counter and stops at the limit.
///
/// The response is consumed, so the connection is released on every path.
pub async fn limited_body(resp: Response, max_bytes: usize) -> Result<Vec<u8>> {
    if let Some(cl) = resp.content_length()
        && cl as usize > max_bytes
    {
        bail!(
            "response body too large: Content-Length {} exceeds limit {}",
            cl,
            max_bytes
        );
    }

    let mut buf = Vec::new();
    let mut stream = resp;
    while let Some(chunk) = stream.chunk().await? {
        if buf.len() + chunk.len() > max_bytes {
            bail!("response body too large: exceeds limit {}", max_bytes);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Read at most `max_bytes` of a response body as lossy UTF-8.
///
/// Used for error bodies, where a partial read is still useful.
pub async fn limited_text(resp: Response, max_bytes: usize) -> String {
    let mut buf = Vec::new();
    let mut stream = resp;
    while let Ok(Some(chunk)) = stream.chunk().await {
        let remaining = max_bytes.saturating_sub(buf.len());
        if chunk.len() >= remaining {
            buf.extend_from_slice(&chunk[..remaining]);
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8_lossy(&buf).into_owned()
}
