//! Retrieval of MMS attachments referenced by a webhook.

use crate::config::MediaConfig;
use crate::errors::{BridgeError, BridgeResult};
use crate::utils::http::limited_body;
use reqwest::Client;
use tracing::{debug, warn};

/// GET `url` and return the full response body.
///
/// No authentication is added and nothing is retried. A non-2xx response is
/// passed through as-is unless `config.require_success` is set. Bodies larger
/// than `config.max_bytes` fail.
pub async fn fetch_media(client: &Client, url: &str, config: &MediaConfig) -> BridgeResult<Vec<u8>> {
    if url.is_empty() {
        return Err(BridgeError::Fetch("media URL is empty".into()));
    }

    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| BridgeError::Fetch(format!("GET {} failed: {}", url, e)))?;

    let status = resp.status();
    if !status.is_success() {
        if config.require_success {
            return Err(BridgeError::Fetch(format!(
                "GET {} returned {}",
                url, status
            )));
        }
        warn!("media fetch: {} returned {}, relaying body anyway", url, status);
    }

    let bytes = limited_body(resp, config.max_bytes)
        .await
        .map_err(|e| BridgeError::Fetch(format!("reading body of {}: {:#}", url, e)))?;
    debug!("media fetch: {} bytes from {}", bytes.len(), url);
    Ok(bytes)
}

/// Derive a file extension from a `type/subtype` content type.
///
/// Returns the subtype (`image/jpeg` gives `jpeg`). Parameters after `;` are
/// ignored. Anything that is not exactly one non-empty type and one non-empty
/// subtype is rejected.
pub fn extension_from_content_type(content_type: &str) -> BridgeResult<&str> {
    let essence = content_type.split(';').next().unwrap_or(content_type).trim();
    match essence.split_once('/') {
        Some((kind, subtype))
            if !kind.trim().is_empty()
                && !subtype.trim().is_empty()
                && !subtype.contains('/') =>
        {
            Ok(subtype.trim())
        }
        _ => Err(BridgeError::MalformedContentType(content_type.to_string())),
    }
}
