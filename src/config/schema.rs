use crate::errors::BridgeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generates a `Debug` impl that redacts secret fields.
///
/// Field specifiers:
/// - `field_name`            : printed normally via `&self.field_name`
/// - `redact(field_name)`    : `String` field: shows `[empty]` or `[REDACTED]`
macro_rules! redact_debug {
    (@field $builder:ident, $self:ident, redact($field:ident)) => {
        $builder.field(
            stringify!($field),
            &if $self.$field.is_empty() {
                "[empty]"
            } else {
                "[REDACTED]"
            },
        );
    };
    (@field $builder:ident, $self:ident, $field:ident) => {
        $builder.field(stringify!($field), &$self.$field);
    };

    // Internal: recursive TT muncher
    (@fields $builder:ident, $self:ident,) => {};
    (@fields $builder:ident, $self:ident, redact($field:ident), $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, redact($field));
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    (@fields $builder:ident, $self:ident, $field:ident, $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, $field);
        redact_debug!(@fields $builder, $self, $($rest)*);
    };

    // Entry point
    ($struct_name:ident, $($fields:tt)*) => {
        impl std::fmt::Debug for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut builder = f.debug_struct(stringify!($struct_name));
                redact_debug!(@fields builder, self, $($fields)*);
                builder.finish()
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    18080
}

fn default_webhook_path() -> String {
    "/twilio".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_webhook_path", rename = "webhookPath")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mattermost
// ---------------------------------------------------------------------------

fn default_team() -> String {
    "test".to_string()
}

fn default_channel() -> String {
    "twilio".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Connection to the Mattermost server and the destination for relayed posts.
#[derive(Clone, Serialize, Deserialize)]
pub struct MattermostConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_team")]
    pub team: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default = "default_timeout_secs", rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for MattermostConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            team: default_team(),
            channel: default_channel(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

redact_debug!(
    MattermostConfig,
    url,
    redact(token),
    team,
    channel,
    timeout_secs,
);

impl MattermostConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Bot account
// ---------------------------------------------------------------------------

fn default_bot_username() -> String {
    "twilio".to_string()
}

fn default_bot_display_name() -> String {
    "Twilio".to_string()
}

fn default_bot_description() -> String {
    "Parses images sent from twilio".to_string()
}

/// Account that authors every relayed post. Provisioned at startup if missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_bot_username")]
    pub username: String,
    #[serde(default = "default_bot_display_name", rename = "displayName")]
    pub display_name: String,
    #[serde(default = "default_bot_description")]
    pub description: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            username: default_bot_username(),
            display_name: default_bot_display_name(),
            description: default_bot_description(),
        }
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

fn default_max_media_bytes() -> usize {
    20 * 1024 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_max_media_bytes", rename = "maxBytes")]
    pub max_bytes: usize,
    #[serde(default = "default_timeout_secs", rename = "timeoutSecs")]
    pub timeout_secs: u64,
    /// Treat a non-2xx media response as a failure instead of relaying its body.
    #[serde(default, rename = "requireSuccess")]
    pub require_success: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_media_bytes(),
            timeout_secs: default_timeout_secs(),
            require_success: false,
        }
    }
}

impl MediaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mattermost: MattermostConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), BridgeError> {
        self.validate_server()?;
        self.validate_mattermost()?;
        self.validate_bot()?;
        self.validate_media()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), BridgeError> {
        let s = &self.server;
        if s.host.trim().is_empty() {
            return Err(BridgeError::Config("server.host must not be empty".into()));
        }
        if s.port == 0 {
            return Err(BridgeError::Config("server.port must be > 0".into()));
        }
        if !s.webhook_path.starts_with('/') {
            return Err(BridgeError::Config(format!(
                "server.webhookPath must start with '/', got {:?}",
                s.webhook_path
            )));
        }
        if s.webhook_path == "/health" {
            return Err(BridgeError::Config(
                "server.webhookPath must not shadow /health".into(),
            ));
        }
        Ok(())
    }

    fn validate_mattermost(&self) -> Result<(), BridgeError> {
        let m = &self.mattermost;
        if m.url.is_empty() {
            return Err(BridgeError::Config(
                "mattermost.url is required (or set SMSBRIDGE_MATTERMOST_URL)".into(),
            ));
        }
        match url::Url::parse(&m.url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(BridgeError::Config(format!(
                    "mattermost.url must use http or https, got {}",
                    parsed.scheme()
                )));
            }
            Err(e) => {
                return Err(BridgeError::Config(format!(
                    "mattermost.url is not a valid URL: {}",
                    e
                )));
            }
        }
        if m.token.is_empty() {
            return Err(BridgeError::Config(
                "mattermost.token is required (or set SMSBRIDGE_MATTERMOST_TOKEN)".into(),
            ));
        }
        if m.team.trim().is_empty() || m.channel.trim().is_empty() {
            return Err(BridgeError::Config(
                "mattermost.team and mattermost.channel must not be empty".into(),
            ));
        }
        if m.timeout_secs == 0 {
            return Err(BridgeError::Config(
                "mattermost.timeoutSecs must be > 0".into(),
            ));
        }
        Ok(())
    }

    fn validate_bot(&self) -> Result<(), BridgeError> {
        if self.bot.username.trim().is_empty() {
            return Err(BridgeError::Config("bot.username must not be empty".into()));
        }
        Ok(())
    }

    fn validate_media(&self) -> Result<(), BridgeError> {
        let m = &self.media;
        if m.max_bytes == 0 {
            return Err(BridgeError::Config("media.maxBytes must be > 0".into()));
        }
        if m.timeout_secs == 0 {
            return Err(BridgeError::Config("media.timeoutSecs must be > 0".into()));
        }
        Ok(())
    }
}
