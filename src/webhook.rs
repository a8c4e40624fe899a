//! Identity-branded webhook transport.
//!
//! Posts chunked text or a file-with-caption to a Discord webhook endpoint,
//! preserving chunk order and carrying display identity where the protocol
//! allows. Chunks are transmitted strictly in sequence; the first transport
//! failure aborts the remainder of the send. Path selection (webhook vs bot
//! API) lives in [`crate::outbound`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::chunk::{chunk_text, ChunkMode};
use crate::media::{fetch_media, MediaError, MediaPayload};

/// Discord's per-message character limit.
pub const DISCORD_TEXT_LIMIT: usize = 2000;

/// Multipart field name for the file part.
const FILE_FIELD: &str = "files[0]";

/// Upload filename used when the source URL exposes none.
const DEFAULT_FILENAME: &str = "upload";

/// Content type used when the source reports none.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Presentation identity attached to webhook posts.
///
/// Both fields are optional; with neither set the webhook posts under its
/// own configured default presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookIdentity {
    /// Display name override.
    pub username: Option<String>,
    /// Avatar image URL override.
    pub avatar_url: Option<String>,
}

/// Options for one webhook send.
#[derive(Debug, Clone, Default)]
pub struct WebhookSendOptions {
    /// Webhook endpoint URL (required).
    pub url: String,
    /// Presentation identity.
    pub identity: WebhookIdentity,
    /// Reply-target message ID. Accepted for interface parity with the bot
    /// API path; the webhook protocol has no reply support.
    pub reply_to: Option<String>,
    /// Thread to post into, appended as a `thread_id` query parameter.
    pub thread_id: Option<String>,
    /// Per-message line-count cap for chunking.
    pub max_lines: Option<usize>,
    /// Chunk boundary policy.
    pub chunk_mode: ChunkMode,
    /// Rich-embed payloads. Attached only to the first transmitted unit.
    pub embeds: Option<Vec<Value>>,
}

/// Result of a webhook send.
///
/// For a multi-chunk text send this identifies the last transmitted chunk;
/// for a media send, the file-carrying message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSendResult {
    /// Remote message identifier.
    pub message_id: String,
    /// Remote channel identifier.
    pub channel_id: String,
}

/// Webhook transport errors.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Empty or whitespace-only message text.
    #[error("cannot send an empty message")]
    EmptyMessage,
    /// The endpoint returned a non-success HTTP status.
    #[error("webhook request failed with HTTP {status}: {body}")]
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

/// Outgoing webhook message body (JSON post, or `payload_json` part).
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embeds: Option<&'a [Value]>,
}

/// Webhook response body on success.
#[derive(Debug, Deserialize)]
struct WebhookResponse {
    id: String,
    channel_id: String,
}

/// HTTP client for Discord webhook endpoints.
#[derive(Debug, Clone, Default)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    /// Create a client with a fresh connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client reusing an existing `reqwest` connection pool.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Send a text message, splitting it into ordered chunks.
    ///
    /// Chunks are transmitted strictly in sequence, one network call each.
    /// Only the first chunk carries the configured embeds. The returned
    /// result identifies the last transmitted chunk.
    ///
    /// # Errors
    ///
    /// Fails with [`WebhookError::EmptyMessage`] on whitespace-only input.
    /// The first transport failure aborts the remaining chunks and
    /// propagates; chunks already delivered are not rolled back.
    pub async fn send_text(
        &self,
        text: &str,
        opts: &WebhookSendOptions,
    ) -> Result<WebhookSendResult, WebhookError> {
        if text.trim().is_empty() {
            return Err(WebhookError::EmptyMessage);
        }

        let mut chunks = chunk_text(text, DISCORD_TEXT_LIMIT, opts.max_lines, opts.chunk_mode);
        if chunks.is_empty() {
            // Non-empty input must produce at least one message.
            chunks.push(text.to_owned());
        }

        let total = chunks.len();
        let mut last = None;
        for (index, chunk) in chunks.iter().enumerate() {
            let embeds = if index == 0 {
                opts.embeds.as_deref()
            } else {
                None
            };
            debug!(
                chunk = index.saturating_add(1),
                total, "posting webhook text chunk"
            );
            last = Some(self.post_json(chunk, embeds, opts).await?);
        }

        last.ok_or(WebhookError::NoChunks)
    }

    /// Send a file with an optional caption.
    ///
    /// The media is downloaded into memory and posted as one multipart
    /// message. A caption longer than one chunk is split: the first chunk
    /// rides on the file message, the rest follow as ordinary text posts in
    /// order (whitespace-only follow-ups are skipped). The returned result
    /// identifies the file-carrying message.
    ///
    /// # Errors
    ///
    /// A failure while sending a follow-up chunk aborts the remaining
    /// follow-ups but does not undo the already-delivered file message.
    pub async fn send_media(
        &self,
        caption: &str,
        media_url: &str,
        opts: &WebhookSendOptions,
    ) -> Result<WebhookSendResult, WebhookError> {
        let media = fetch_media(&self.http, media_url).await?;
        debug!(
            media_url,
            bytes = media.bytes.len(),
            "downloaded media payload"
        );

        let mut chunks = if caption.trim().is_empty() {
            Vec::new()
        } else {
            chunk_text(caption, DISCORD_TEXT_LIMIT, opts.max_lines, opts.chunk_mode)
        };
        if !caption.trim().is_empty() && chunks.is_empty() {
            chunks.push(caption.to_owned());
        }

        let result = self
            .post_multipart(chunks.first().map(String::as_str), &media, opts)
            .await?;

        for chunk in chunks.iter().skip(1) {
            if chunk.trim().is_empty() {
                continue;
            }
            self.post_json(chunk, None, opts).await?;
        }

        Ok(result)
    }

    /// Endpoint URL with query parameters.
    ///
    /// `wait=true` requests synchronous confirmation so the remote message
    /// ID is present in the response body.
    fn endpoint_url(&self, opts: &WebhookSendOptions) -> String {
        match &opts.thread_id {
            Some(thread_id) => format!("{}?wait=true&thread_id={thread_id}", opts.url),
            None => format!("{}?wait=true", opts.url),
        }
    }

    /// Post one JSON text message.
    async fn post_json(
        &self,
        content: &str,
        embeds: Option<&[Value]>,
        opts: &WebhookSendOptions,
    ) -> Result<WebhookSendResult, WebhookError> {
        let payload = WebhookPayload {
            content: Some(content),
            username: opts.identity.username.as_deref(),
            avatar_url: opts.identity.avatar_url.as_deref(),
            embeds,
        };

        let resp = self
            .http
            .post(self.endpoint_url(opts))
            .json(&payload)
            .send()
            .await?;
        Self::check_response(resp).await
    }

    /// Post one multipart file message with optional caption.
    async fn post_multipart(
        &self,
        caption: Option<&str>,
        media: &MediaPayload,
        opts: &WebhookSendOptions,
    ) -> Result<WebhookSendResult, WebhookError> {
        let payload = WebhookPayload {
            content: caption,
            username: opts.identity.username.as_deref(),
            avatar_url: opts.identity.avatar_url.as_deref(),
            embeds: opts.embeds.as_deref(),
        };
        let payload_json = serde_json::to_string(&payload)?;

        let part = reqwest::multipart::Part::bytes(media.bytes.clone())
            .file_name(
                media
                    .filename
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FILENAME.to_owned()),
            )
            .mime_str(
                media
                    .content_type
                    .as_deref()
                    .unwrap_or(DEFAULT_CONTENT_TYPE),
            )?;
        let form = reqwest::multipart::Form::new()
            .text("payload_json", payload_json)
            .part(FILE_FIELD, part);

        let resp = self
            .http
            .post(self.endpoint_url(opts))
            .multipart(form)
            .send()
            .await?;
        Self::check_response(resp).await
    }

    /// Map a webhook HTTP response to a send result.
    async fn check_response(resp: reqwest::Response) -> Result<WebhookSendResult, WebhookError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_owned());
            return Err(WebhookError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: WebhookResponse = resp.json().await?;
        Ok(WebhookSendResult {
            message_id: parsed.id,
            channel_id: parsed.channel_id,
        })
    }
}
