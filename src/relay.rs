//! End-to-end relay of one Twilio webhook call into the destination channel.
//!
//! [`on_activate`] runs once at startup and provisions the bot account. The
//! resulting [`RelayContext`] is immutable and shared by every request;
//! [`on_request`] handles one call. A post is submitted at most once, and
//! only after the destination and any attachment have been resolved.

use crate::config::{BotConfig, MattermostConfig, MediaConfig};
use crate::errors::{BridgeError, BridgeResult};
use crate::mattermost::{MessagingApi, OutboundPost, Post};
use crate::media::{extension_from_content_type, fetch_media};
use crate::twilio::{TwilioRequest, decode_request};
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Response body for a fully relayed message.
pub const SUCCESS_RESPONSE: &str = "Success";

/// Response body for any failure. Details only go to the log.
pub const FAILURE_RESPONSE: &str = "Sorry, this message could not be relayed.";

/// Appended to the post when the notification has no attachment.
pub const NO_PICTURE_NOTICE: &str = "No picture attached";

const PICTURE_FILE_STEM: &str = "twilio-picture";

/// The account every relayed post is authored by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
    pub username: String,
}

/// Team and channel names posts are relayed into. Resolved to ids on every
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub team: String,
    pub channel: String,
}

impl Destination {
    pub fn from_config(config: &MattermostConfig) -> Self {
        Self {
            team: config.team.clone(),
            channel: config.channel.clone(),
        }
    }
}

/// Outcome of one webhook call as seen by Twilio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: &'static str,
}

/// Provision the bot account. Called once before serving requests.
pub async fn on_activate(api: &dyn MessagingApi, bot: &BotConfig) -> BridgeResult<BotIdentity> {
    let user_id = api
        .ensure_bot(bot)
        .await
        .map_err(|e| BridgeError::Internal(e.context("bot provisioning failed")))?;
    info!("relay bot @{} active ({})", bot.username, user_id);
    Ok(BotIdentity {
        user_id,
        username: bot.username.clone(),
    })
}

/// Everything a request needs, built once at activation.
pub struct RelayContext {
    api: Arc<dyn MessagingApi>,
    http: reqwest::Client,
    bot: BotIdentity,
    destination: Destination,
    media: MediaConfig,
}

impl RelayContext {
    pub fn new(
        api: Arc<dyn MessagingApi>,
        http: reqwest::Client,
        bot: BotIdentity,
        destination: Destination,
        media: MediaConfig,
    ) -> Self {
        Self {
            api,
            http,
            bot,
            destination,
            media,
        }
    }

    pub fn bot(&self) -> &BotIdentity {
        &self.bot
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Decode a raw form body and post it to the destination channel.
    pub async fn relay(&self, raw_form: &[u8]) -> BridgeResult<Post> {
        let request = decode_request(raw_form)?;
        debug!(
            "twilio webhook: sid={} num_media={} has_media={}",
            request.message_sid,
            request.num_media,
            request.has_media()
        );

        let team = self
            .api
            .get_team_by_name(&self.destination.team)
            .await
            .map_err(|e| BridgeError::Lookup {
                target: format!("team {:?}", self.destination.team),
                message: format!("{:#}", e),
            })?;
        let channel = self
            .api
            .get_channel_by_name(&team.id, &self.destination.channel)
            .await
            .map_err(|e| BridgeError::Lookup {
                target: format!("channel {:?}", self.destination.channel),
                message: format!("{:#}", e),
            })?;

        let mut post = OutboundPost {
            channel_id: channel.id,
            user_id: self.bot.user_id.clone(),
            message: compose_message(&request),
            file_ids: Vec::new(),
        };

        if request.has_media() {
            // Validate the content type before downloading anything.
            let extension = extension_from_content_type(&request.media_content_type0)?;
            let filename = picture_filename(extension);
            let bytes = fetch_media(&self.http, &request.media_url0, &self.media).await?;
            let info = self
                .api
                .upload_file(bytes, &post.channel_id, &filename)
                .await
                .map_err(|e| BridgeError::Upload(format!("{:#}", e)))?;
            post.file_ids.push(info.id);
        } else {
            post.message.push_str(NO_PICTURE_NOTICE);
        }

        let channel_id = post.channel_id.clone();
        let created = self
            .api
            .create_post(post)
            .await
            .map_err(|e| BridgeError::Post(format!("{:#}", e)))?;
        info!(
            "relayed twilio message {} into channel {} as post {}",
            request.message_sid, channel_id, created.id
        );
        Ok(created)
    }
}

/// Handle one webhook call.
///
/// Every outcome is a 200 with a plain text body; the two bodies are
/// [`SUCCESS_RESPONSE`] and [`FAILURE_RESPONSE`]. Failures are logged with
/// their full detail.
pub async fn on_request(ctx: &RelayContext, raw_form: &[u8]) -> RelayResponse {
    match ctx.relay(raw_form).await {
        Ok(_) => RelayResponse {
            status: StatusCode::OK,
            body: SUCCESS_RESPONSE,
        },
        Err(e) => {
            error!("twilio relay failed ({}): {}", e.kind(), e);
            RelayResponse {
                status: StatusCode::OK,
                body: FAILURE_RESPONSE,
            }
        }
    }
}

/// Text of the post: a title line, the sender and recipient, and the SMS body
/// when there is one. Each line ends with a newline.
pub fn compose_message(request: &TwilioRequest) -> String {
    let mut message = format!(
        "New text from Twilio!\nFrom: {}\nTo: {}\n",
        request.from, request.to
    );
    if !request.body.is_empty() {
        message.push_str(&request.body);
        message.push('\n');
    }
    message
}

/// Upload name for an attachment with the given extension.
pub fn picture_filename(extension: &str) -> String {
    format!("{}.{}", PICTURE_FILE_STEM, extension)
}
