//! Delivery orchestration: webhook vs bot-API path selection.
//!
//! Webhook delivery is attempted only when all three conditions hold: the
//! destination address resolves to a channel ID, that channel has a
//! configured webhook endpoint, and the acting agent resolves to a display
//! identity. Any single miss routes the send through the bot API. Polls
//! always go through the bot API; webhooks cannot create them.
//!
//! Every entity here is constructed fresh per call. Nothing is cached
//! across invocations.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::address;
use crate::bot_api::{BotApi, BotApiError, BotSendOptions, Poll};
use crate::chunk::ChunkMode;
use crate::config::{webhook_for_channel, Config};
use crate::identity::IdentityResolver;
use crate::webhook::{
    WebhookClient, WebhookError, WebhookIdentity, WebhookSendOptions, WebhookSendResult,
};

/// Channel kind tag carried on every receipt.
pub const CHANNEL_DISCORD: &str = "discord";

/// Normalized delivery receipt returned by every send operation.
///
/// For a multi-chunk send there is exactly one receipt even though multiple
/// network messages were created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Channel kind (`"discord"`).
    pub channel: String,
    /// Remote message identifier.
    pub message_id: String,
    /// Remote channel identifier.
    pub channel_id: String,
}

/// One outbound send request. Immutable per call.
pub struct OutboundContext<'a> {
    /// Destination address (`channel:<id>` or a bare snowflake).
    pub to: &'a str,
    /// Message text (caption, for media sends).
    pub text: &'a str,
    /// Media attachment URL, for media sends.
    pub media_url: Option<&'a str>,
    /// Host configuration root.
    pub config: &'a Config,
    /// Bot account selector, passed through to the bot API.
    pub account_id: Option<&'a str>,
    /// Bot API override for this call. `None` uses the orchestrator default.
    pub bot_api: Option<Arc<dyn BotApi>>,
    /// Message ID to reply to.
    pub reply_to: Option<&'a str>,
    /// Acting agent whose identity brands the webhook post.
    pub agent_id: Option<&'a str>,
}

impl<'a> OutboundContext<'a> {
    /// Create a context with the required fields; the rest default to `None`.
    pub fn new(to: &'a str, text: &'a str, config: &'a Config) -> Self {
        Self {
            to,
            text,
            media_url: None,
            config,
            account_id: None,
            bot_api: None,
            reply_to: None,
            agent_id: None,
        }
    }
}

/// Delivery errors.
///
/// Resolution misses are not errors; they route the send to the bot API.
#[derive(Debug, Error)]
pub enum OutboundError {
    /// Webhook transport failure.
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    /// Bot API failure.
    #[error(transparent)]
    BotApi(#[from] BotApiError),
}

/// A resolved webhook route for one send.
struct WebhookRoute {
    channel_id: String,
    endpoint: String,
    identity: WebhookIdentity,
}

/// The adapter's public face: text, media, and poll delivery.
pub struct Delivery {
    webhook: WebhookClient,
    bot_api: Arc<dyn BotApi>,
    identity: IdentityResolver,
}

impl Delivery {
    /// Create a delivery orchestrator with a default bot API client and an
    /// identity resolver.
    pub fn new(bot_api: Arc<dyn BotApi>, identity: IdentityResolver) -> Self {
        Self {
            webhook: WebhookClient::new(),
            bot_api,
            identity,
        }
    }

    /// Reuse an existing `reqwest` connection pool for webhook posts.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.webhook = WebhookClient::with_client(http);
        self
    }

    /// Send a text message.
    ///
    /// # Errors
    ///
    /// Propagates transport failures from whichever path was taken. A
    /// multi-chunk webhook send that fails partway reports failure for the
    /// whole operation even though earlier chunks were delivered.
    pub async fn send_text(&self, ctx: &OutboundContext<'_>) -> Result<SendReceipt, OutboundError> {
        if let Some(route) = self.webhook_route(ctx) {
            info!(channel_id = %route.channel_id, "delivering text via identity webhook");
            let opts = Self::webhook_opts(&route, ctx);
            let result = self.webhook.send_text(ctx.text, &opts).await?;
            return Ok(Self::receipt(result));
        }

        debug!(to = ctx.to, "webhook path unavailable, using bot API");
        let receipt = self
            .effective_bot_api(ctx)
            .send_text(ctx.to, ctx.text, &Self::bot_opts(ctx))
            .await?;
        Ok(receipt)
    }

    /// Send a media attachment with the context text as caption.
    ///
    /// A context without a media URL degrades to a plain text send on the
    /// bot API path.
    ///
    /// # Errors
    ///
    /// Propagates transport failures from whichever path was taken.
    pub async fn send_media(
        &self,
        ctx: &OutboundContext<'_>,
    ) -> Result<SendReceipt, OutboundError> {
        let Some(media_url) = ctx.media_url else {
            debug!(to = ctx.to, "media send without media reference, sending text via bot API");
            let receipt = self
                .effective_bot_api(ctx)
                .send_text(ctx.to, ctx.text, &Self::bot_opts(ctx))
                .await?;
            return Ok(receipt);
        };

        if let Some(route) = self.webhook_route(ctx) {
            info!(channel_id = %route.channel_id, "delivering media via identity webhook");
            let opts = Self::webhook_opts(&route, ctx);
            let result = self.webhook.send_media(ctx.text, media_url, &opts).await?;
            return Ok(Self::receipt(result));
        }

        debug!(to = ctx.to, "webhook path unavailable, using bot API");
        let receipt = self
            .effective_bot_api(ctx)
            .send_media(ctx.to, ctx.text, media_url, &Self::bot_opts(ctx))
            .await?;
        Ok(receipt)
    }

    /// Send a poll. Always routed through the bot API.
    ///
    /// # Errors
    ///
    /// Propagates bot API failures.
    pub async fn send_poll(
        &self,
        ctx: &OutboundContext<'_>,
        poll: &Poll,
    ) -> Result<SendReceipt, OutboundError> {
        debug!(to = ctx.to, "polls always use the bot API");
        let receipt = self
            .effective_bot_api(ctx)
            .send_poll(ctx.to, poll, &Self::bot_opts(ctx))
            .await?;
        Ok(receipt)
    }

    /// Resolve the webhook route for a context, if every condition holds.
    ///
    /// The decision path is logged; the logging never influences which
    /// branch is taken.
    fn webhook_route(&self, ctx: &OutboundContext<'_>) -> Option<WebhookRoute> {
        let channel_id = address::resolve_channel_id(ctx.to)?;
        let Some(endpoint) = webhook_for_channel(ctx.config, &channel_id) else {
            debug!(%channel_id, "no webhook endpoint configured");
            return None;
        };
        let Some(agent_id) = ctx.agent_id else {
            debug!(%channel_id, "webhook configured but no acting agent");
            return None;
        };
        let identity = self.identity.resolve(agent_id)?;
        debug!(%channel_id, agent_id, "webhook route resolved");
        Some(WebhookRoute {
            channel_id,
            endpoint: endpoint.to_owned(),
            identity: identity.display(None),
        })
    }

    /// The bot API for this call: the per-call override, else the default.
    fn effective_bot_api<'s>(&'s self, ctx: &'s OutboundContext<'_>) -> &'s dyn BotApi {
        match &ctx.bot_api {
            Some(bot_api) => bot_api.as_ref(),
            None => self.bot_api.as_ref(),
        }
    }

    fn webhook_opts(route: &WebhookRoute, ctx: &OutboundContext<'_>) -> WebhookSendOptions {
        WebhookSendOptions {
            url: route.endpoint.clone(),
            identity: route.identity.clone(),
            reply_to: ctx.reply_to.map(str::to_owned),
            thread_id: None,
            max_lines: None,
            chunk_mode: ChunkMode::Auto,
            embeds: None,
        }
    }

    fn bot_opts(ctx: &OutboundContext<'_>) -> BotSendOptions {
        BotSendOptions {
            reply_to: ctx.reply_to.map(str::to_owned),
            account_id: ctx.account_id.map(str::to_owned),
        }
    }

    fn receipt(result: WebhookSendResult) -> SendReceipt {
        SendReceipt {
            channel: CHANNEL_DISCORD.to_owned(),
            message_id: result.message_id,
            channel_id: result.channel_id,
        }
    }
}
