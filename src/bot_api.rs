//! Bot API fallback transport.
//!
//! The always-available authenticated path. The orchestrator delegates here
//! whenever webhook delivery is not possible, and unconditionally for polls.
//! The seam is a trait so hosts and tests can substitute their own client;
//! [`DiscordBotApi`] is the default HTTP implementation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::address;
use crate::chunk::{chunk_text, ChunkMode};
use crate::media::{fetch_media, MediaError};
use crate::outbound::{SendReceipt, CHANNEL_DISCORD};
use crate::webhook::DISCORD_TEXT_LIMIT;

/// Base URL for the Discord REST API.
const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Maximum answer options Discord accepts on a poll.
pub const POLL_MAX_OPTIONS: usize = 10;

/// Poll duration used when the caller does not specify one, in hours.
const DEFAULT_POLL_DURATION_HOURS: u32 = 24;

/// Poll content for a poll send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    /// Question text.
    pub question: String,
    /// Answer options. Options beyond the platform cap are dropped.
    pub options: Vec<String>,
    /// Whether voters may select multiple options.
    pub multi_select: bool,
    /// Poll lifetime in hours.
    pub duration_hours: Option<u32>,
}

/// Cross-cutting options passed through to the bot API.
#[derive(Debug, Clone, Default)]
pub struct BotSendOptions {
    /// Message ID to reply to.
    pub reply_to: Option<String>,
    /// Bot account selector for hosts running multiple accounts.
    pub account_id: Option<String>,
}

/// Bot API errors.
#[derive(Debug, Error)]
pub enum BotApiError {
    /// The destination address has no recognized shape.
    #[error("unrecognized destination address: {0}")]
    BadAddress(String),
    /// The API returned a non-success HTTP status.
    #[error("bot API request failed with HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Best-effort response body text.
        body: String,
    },
    /// Connection-level failure.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Media download failed.
    #[error(transparent)]
    Media(#[from] MediaError),
    /// Metadata JSON could not be encoded.
    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),
    /// A text send produced no transmitted chunk result.
    #[error("text send produced no chunks")]
    NoChunks,
}

/// Authenticated send operations on the platform.
///
/// Injected into the orchestrator so hosts can supply their own client and
/// tests can observe the fallback path.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Send a text message.
    async fn send_text(
        &self,
        to: &str,
        text: &str,
        opts: &BotSendOptions,
    ) -> Result<SendReceipt, BotApiError>;

    /// Send a media attachment with an optional caption.
    async fn send_media(
        &self,
        to: &str,
        caption: &str,
        media_url: &str,
        opts: &BotSendOptions,
    ) -> Result<SendReceipt, BotApiError>;

    /// Send a poll.
    async fn send_poll(
        &self,
        to: &str,
        poll: &Poll,
        opts: &BotSendOptions,
    ) -> Result<SendReceipt, BotApiError>;
}

/// Discord message creation response (subset of fields we use).
#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
    channel_id: String,
}

/// Default bot API client over the Discord REST API.
#[derive(Debug, Clone)]
pub struct DiscordBotApi {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl DiscordBotApi {
    /// Create a client authenticated with a bot token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: DISCORD_API_BASE.to_owned(),
        }
    }

    /// Override the API base URL (tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve a destination address to a channel ID.
    fn channel_id(&self, to: &str) -> Result<String, BotApiError> {
        address::resolve_channel_id(to).ok_or_else(|| BotApiError::BadAddress(to.to_owned()))
    }

    fn messages_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{channel_id}/messages", self.base_url)
    }

    /// Post one message creation request and map the response.
    async fn post_message(
        &self,
        channel_id: &str,
        body: &Value,
    ) -> Result<SendReceipt, BotApiError> {
        let resp = self
            .http
            .post(self.messages_url(channel_id))
            .header("Authorization", format!("Bot {}", self.token))
            .json(body)
            .send()
            .await?;
        self.check_response(resp).await
    }

    async fn check_response(&self, resp: reqwest::Response) -> Result<SendReceipt, BotApiError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_owned());
            return Err(BotApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: MessageResponse = resp.json().await?;
        Ok(SendReceipt {
            channel: CHANNEL_DISCORD.to_owned(),
            message_id: parsed.id,
            channel_id: parsed.channel_id,
        })
    }

    /// Debug note for the single-account default client.
    fn note_account_selector(opts: &BotSendOptions) {
        if let Some(account_id) = opts.account_id.as_deref() {
            debug!(account_id, "default bot API client runs a single account; selector ignored");
        }
    }
}

#[async_trait]
impl BotApi for DiscordBotApi {
    async fn send_text(
        &self,
        to: &str,
        text: &str,
        opts: &BotSendOptions,
    ) -> Result<SendReceipt, BotApiError> {
        Self::note_account_selector(opts);
        let channel_id = self.channel_id(to)?;

        let mut chunks = chunk_text(text, DISCORD_TEXT_LIMIT, None, ChunkMode::Auto);
        if chunks.is_empty() {
            chunks.push(text.to_owned());
        }

        let mut last = None;
        for (index, chunk) in chunks.iter().enumerate() {
            let mut body = json!({ "content": chunk });
            // Reply threading applies to the first message of a split send.
            if index == 0 {
                if let Some(reply_to) = opts.reply_to.as_deref() {
                    body["message_reference"] = json!({ "message_id": reply_to });
                }
            }
            last = Some(self.post_message(&channel_id, &body).await?);
        }

        last.ok_or(BotApiError::NoChunks)
    }

    async fn send_media(
        &self,
        to: &str,
        caption: &str,
        media_url: &str,
        opts: &BotSendOptions,
    ) -> Result<SendReceipt, BotApiError> {
        Self::note_account_selector(opts);
        let channel_id = self.channel_id(to)?;

        let media = fetch_media(&self.http, media_url).await?;

        let chunks = if caption.trim().is_empty() {
            Vec::new()
        } else {
            chunk_text(caption, DISCORD_TEXT_LIMIT, None, ChunkMode::Auto)
        };

        let mut payload = serde_json::Map::new();
        if let Some(first) = chunks.first() {
            payload.insert("content".to_owned(), Value::String(first.clone()));
        }
        if let Some(reply_to) = opts.reply_to.as_deref() {
            payload.insert(
                "message_reference".to_owned(),
                json!({ "message_id": reply_to }),
            );
        }
        let payload_json = serde_json::to_string(&Value::Object(payload))?;

        let part = reqwest::multipart::Part::bytes(media.bytes.clone())
            .file_name(media.filename.clone().unwrap_or_else(|| "upload".to_owned()))
            .mime_str(
                media
                    .content_type
                    .as_deref()
                    .unwrap_or("application/octet-stream"),
            )?;
        let form = reqwest::multipart::Form::new()
            .text("payload_json", payload_json)
            .part("files[0]", part);

        let resp = self
            .http
            .post(self.messages_url(&channel_id))
            .header("Authorization", format!("Bot {}", self.token))
            .multipart(form)
            .send()
            .await?;
        let receipt = self.check_response(resp).await?;

        for chunk in chunks.iter().skip(1) {
            if chunk.trim().is_empty() {
                continue;
            }
            let body = json!({ "content": chunk });
            self.post_message(&channel_id, &body).await?;
        }

        Ok(receipt)
    }

    async fn send_poll(
        &self,
        to: &str,
        poll: &Poll,
        opts: &BotSendOptions,
    ) -> Result<SendReceipt, BotApiError> {
        Self::note_account_selector(opts);
        let channel_id = self.channel_id(to)?;

        let answers: Vec<Value> = poll
            .options
            .iter()
            .take(POLL_MAX_OPTIONS)
            .map(|option| json!({ "poll_media": { "text": option } }))
            .collect();

        let body = json!({
            "poll": {
                "question": { "text": poll.question },
                "answers": answers,
                "allow_multiselect": poll.multi_select,
                "duration": poll.duration_hours.unwrap_or(DEFAULT_POLL_DURATION_HOURS),
            }
        });

        self.post_message(&channel_id, &body).await
    }
}
