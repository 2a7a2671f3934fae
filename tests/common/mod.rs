// Shared test helpers; not all items used by every test binary.
#![allow(unused)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use smsbridge::config::{BotConfig, MediaConfig};
use smsbridge::mattermost::{Channel, FileInfo, MessagingApi, OutboundPost, Post, Team};
use smsbridge::relay::{BotIdentity, Destination, RelayContext};
use std::sync::{Arc, Mutex};

/// Messaging API calls, in the order the relay makes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    GetTeam(String),
    GetChannel { team_id: String, name: String },
    Upload { channel_id: String, filename: String, bytes: Vec<u8> },
    CreatePost(OutboundPost),
    EnsureBot(String),
}

/// Which call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Team,
    Channel,
    Upload,
    Post,
    Bot,
}

#[derive(Default)]
pub struct RecordingApi {
    pub calls: Arc<Mutex<Vec<ApiCall>>>,
    pub fail_at: Option<FailAt>,
    pub file_id: String,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            file_id: "f1".to_string(),
            ..Self::default()
        }
    }

    pub fn failing_at(step: FailAt) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::new()
        }
    }

    fn check(&self, step: FailAt) -> Result<()> {
        if self.fail_at == Some(step) {
            return Err(anyhow!("simulated {:?} failure", step));
        }
        Ok(())
    }

    fn push(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MessagingApi for RecordingApi {
    async fn get_team_by_name(&self, name: &str) -> Result<Team> {
        self.push(ApiCall::GetTeam(name.to_string()));
        self.check(FailAt::Team)?;
        Ok(Team {
            id: "team1".to_string(),
            name: name.to_string(),
        })
    }

    async fn get_channel_by_name(&self, team_id: &str, name: &str) -> Result<Channel> {
        self.push(ApiCall::GetChannel {
            team_id: team_id.to_string(),
            name: name.to_string(),
        });
        self.check(FailAt::Channel)?;
        Ok(Channel {
            id: "chan1".to_string(),
            team_id: team_id.to_string(),
            name: name.to_string(),
        })
    }

    async fn upload_file(
        &self,
        data: Vec<u8>,
        channel_id: &str,
        filename: &str,
    ) -> Result<FileInfo> {
        self.push(ApiCall::Upload {
            channel_id: channel_id.to_string(),
            filename: filename.to_string(),
            bytes: data,
        });
        self.check(FailAt::Upload)?;
        Ok(FileInfo {
            id: self.file_id.clone(),
            name: filename.to_string(),
        })
    }

    async fn create_post(&self, post: OutboundPost) -> Result<Post> {
        let created = Post {
            id: "post1".to_string(),
            channel_id: post.channel_id.clone(),
            file_ids: post.file_ids.clone(),
        };
        self.push(ApiCall::CreatePost(post));
        self.check(FailAt::Post)?;
        Ok(created)
    }

    async fn ensure_bot(&self, bot: &BotConfig) -> Result<String> {
        self.push(ApiCall::EnsureBot(bot.username.clone()));
        self.check(FailAt::Bot)?;
        Ok("bot1".to_string())
    }
}

/// Relay context over `api` with the legacy destination and default media policy.
pub fn relay_context(api: Arc<RecordingApi>) -> RelayContext {
    RelayContext::new(
        api,
        reqwest::Client::new(),
        BotIdentity {
            user_id: "bot1".to_string(),
            username: "twilio".to_string(),
        },
        Destination {
            team: "test".to_string(),
            channel: "twilio".to_string(),
        },
        MediaConfig::default(),
    )
}

/// Posts submitted so far.
pub fn posts(calls: &Mutex<Vec<ApiCall>>) -> Vec<OutboundPost> {
    calls
        .lock()
        .unwrap()
        .iter()
        .filter_map(|c| match c {
            ApiCall::CreatePost(post) => Some(post.clone()),
            _ => None,
        })
        .collect()
}

/// Uploads made so far as (channel id, filename, bytes).
pub fn uploads(calls: &Mutex<Vec<ApiCall>>) -> Vec<(String, String, Vec<u8>)> {
    calls
        .lock()
        .unwrap()
        .iter()
        .filter_map(|c| match c {
            ApiCall::Upload {
                channel_id,
                filename,
                bytes,
            } => Some((channel_id.clone(), filename.clone(), bytes.clone())),
            _ => None,
        })
        .collect()
}
