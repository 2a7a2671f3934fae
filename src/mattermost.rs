//! The messaging system that relayed notifications are posted into.
//!
//! [`MessagingApi`] is the seam the relay talks to; [`MattermostClient`]
//! implements it against the Mattermost REST API v4.

use crate::config::{BotConfig, MattermostConfig};
use crate::utils::http::{MAX_ERROR_BODY_BYTES, build_http_client, limited_text};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A post as returned by the server after creation.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub file_ids: Vec<String>,
}

/// A post ready for submission. Handed to [`MessagingApi::create_post`] by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundPost {
    pub channel_id: String,
    pub user_id: String,
    pub message: String,
    pub file_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    #[serde(default)]
    is_bot: bool,
}

#[derive(Debug, Deserialize)]
struct Bot {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    file_infos: Vec<FileInfo>,
}

/// Operations the relay needs from the messaging system.
///
/// Errors are opaque to callers; any failure is fatal to the current request.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    async fn get_team_by_name(&self, name: &str) -> Result<Team>;

    async fn get_channel_by_name(&self, team_id: &str, name: &str) -> Result<Channel>;

    async fn upload_file(
        &self,
        data: Vec<u8>,
        channel_id: &str,
        filename: &str,
    ) -> Result<FileInfo>;

    async fn create_post(&self, post: OutboundPost) -> Result<Post>;

    /// Find or create the bot account and return its user id.
    async fn ensure_bot(&self, bot: &BotConfig) -> Result<String>;
}

pub struct MattermostClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl MattermostClient {
    pub fn new(config: &MattermostConfig) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client: build_http_client(config.timeout()),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v4{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        action: &str,
    ) -> Result<T> {
        let resp = self
            .client
            .get(self.endpoint(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("mattermost {} request failed", action))?;
        if !resp.status().is_success() {
            return Err(api_error(resp, action).await);
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("mattermost {}: invalid response body", action))
    }

    async fn create_bot(&self, bot: &BotConfig) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint("/bots"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "username": bot.username,
                "display_name": bot.display_name,
                "description": bot.description,
            }))
            .send()
            .await
            .context("mattermost create bot request failed")?;
        if !resp.status().is_success() {
            return Err(api_error(resp, "create bot").await);
        }
        let created: Bot = resp
            .json()
            .await
            .context("mattermost create bot: invalid response body")?;
        info!("created mattermost bot @{} ({})", bot.username, created.user_id);
        Ok(created.user_id)
    }
}

/// Turn a non-2xx response into an error carrying the server's `message`.
async fn api_error(resp: reqwest::Response, action: &str) -> anyhow::Error {
    let status = resp.status();
    let body = limited_text(resp, MAX_ERROR_BODY_BYTES).await;
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    anyhow!("mattermost {} failed ({}): {}", action, status, detail)
}

#[async_trait]
impl MessagingApi for MattermostClient {
    async fn get_team_by_name(&self, name: &str) -> Result<Team> {
        let path = format!("/teams/name/{}", urlencoding::encode(name));
        self.get_json(&path, "get team").await
    }

    async fn get_channel_by_name(&self, team_id: &str, name: &str) -> Result<Channel> {
        let path = format!(
            "/teams/{}/channels/name/{}",
            urlencoding::encode(team_id),
            urlencoding::encode(name)
        );
        self.get_json(&path, "get channel").await
    }

    async fn upload_file(
        &self,
        data: Vec<u8>,
        channel_id: &str,
        filename: &str,
    ) -> Result<FileInfo> {
        let size = data.len();
        let form = Form::new()
            .text("channel_id", channel_id.to_string())
            .part("files", Part::bytes(data).file_name(filename.to_string()));

        let resp = self
            .client
            .post(self.endpoint("/files"))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .context("mattermost upload file request failed")?;
        if !resp.status().is_success() {
            return Err(api_error(resp, "upload file").await);
        }

        let uploaded: UploadResponse = resp
            .json()
            .await
            .context("mattermost upload file: invalid response body")?;
        let info = uploaded
            .file_infos
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("mattermost upload file: response has no file_infos"))?;
        debug!("uploaded {} ({} bytes) as file {}", filename, size, info.id);
        Ok(info)
    }

    async fn create_post(&self, post: OutboundPost) -> Result<Post> {
        let resp = self
            .client
            .post(self.endpoint("/posts"))
            .bearer_auth(&self.token)
            .json(&post)
            .send()
            .await
            .context("mattermost create post request failed")?;
        if !resp.status().is_success() {
            return Err(api_error(resp, "create post").await);
        }
        resp.json::<Post>()
            .await
            .context("mattermost create post: invalid response body")
    }

    async fn ensure_bot(&self, bot: &BotConfig) -> Result<String> {
        let path = format!("/users/username/{}", urlencoding::encode(&bot.username));
        let resp = self
            .client
            .get(self.endpoint(&path))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("mattermost get user request failed")?;

        if resp.status() == StatusCode::NOT_FOUND {
            return self.create_bot(bot).await;
        }
        if !resp.status().is_success() {
            return Err(api_error(resp, "get user").await);
        }

        let user: User = resp
            .json()
            .await
            .context("mattermost get user: invalid response body")?;
        if !user.is_bot {
            bail!(
                "mattermost user @{} exists but is not a bot account",
                bot.username
            );
        }
        debug!("reusing mattermost bot @{} ({})", bot.username, user.id);
        Ok(user.id)
    }
}

#[cfg(test)]
mod tests;
