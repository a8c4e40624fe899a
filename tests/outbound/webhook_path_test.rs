//! The full webhook route: address, endpoint, and identity all resolve.

use discord_courier::config::Config;
use discord_courier::identity::IdentityResolver;
use discord_courier::outbound::{Delivery, OutboundContext};

use crate::recording::RecordingBotApi;
use crate::support::{ok_message, serve_media, serve_script};

/// Agents root with one fully-populated profile for `ember`.
fn ember_workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir should create");
    let workspace = dir.path().join("ember");
    std::fs::create_dir_all(&workspace).expect("workspace should create");
    std::fs::write(
        workspace.join("IDENTITY.md"),
        "# Ember\n\n- **Name:** Ember\n- **Emoji:** 🔥\n- **Avatar:** https://example.com/ember.png\n",
    )
    .expect("profile should write");
    dir
}

fn config_with_webhook(endpoint: &str) -> Config {
    toml::from_str(&format!(
        r#"
[channels.discord.guilds.111.channels.555]
webhook = "{endpoint}"
"#
    ))
    .expect("config should parse")
}

#[tokio::test]
async fn text_send_uses_the_webhook_and_brands_the_identity() {
    let (base, recorded) = serve_script(vec![ok_message("w1", "555")]).await;
    let config = config_with_webhook(&format!("{base}/webhooks/1/tok"));
    let agents = ember_workspace();
    let bot = RecordingBotApi::new();
    let delivery = Delivery::new(bot.clone(), IdentityResolver::new(agents.path()));

    let mut ctx = OutboundContext::new("channel:555", "hello", &config);
    ctx.agent_id = Some("ember");
    let receipt = delivery.send_text(&ctx).await.expect("send should succeed");

    assert_eq!(receipt.channel, "discord");
    assert_eq!(receipt.message_id, "w1");
    assert_eq!(receipt.channel_id, "555");
    assert!(bot.calls().await.is_empty(), "bot API must not be touched");

    let requests = recorded.lock().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.contains(r#""username":"🔥 Ember""#));
    assert!(requests[0]
        .body
        .contains(r#""avatar_url":"https://example.com/ember.png""#));
}

#[tokio::test]
async fn bare_snowflake_address_also_routes_to_the_webhook() {
    let (base, recorded) = serve_script(vec![ok_message("w1", "123456789012345678")]).await;
    let config = toml::from_str::<Config>(&format!(
        r#"
[channels.discord.guilds.111.channels.123456789012345678]
webhook = "{base}/webhooks/1/tok"
"#
    ))
    .expect("config should parse");
    let agents = ember_workspace();
    let bot = RecordingBotApi::new();
    let delivery = Delivery::new(bot.clone(), IdentityResolver::new(agents.path()));

    let mut ctx = OutboundContext::new("123456789012345678", "hello", &config);
    ctx.agent_id = Some("ember");
    let receipt = delivery.send_text(&ctx).await.expect("send should succeed");

    assert_eq!(receipt.message_id, "w1");
    assert_eq!(recorded.lock().await.len(), 1);
    assert!(bot.calls().await.is_empty());
}

#[tokio::test]
async fn media_send_posts_the_file_through_the_webhook() {
    let media_base = serve_media(b"IMGBYTES".to_vec(), "image/png").await;
    let (base, recorded) = serve_script(vec![ok_message("w1", "555")]).await;
    let config = config_with_webhook(&format!("{base}/webhooks/1/tok"));
    let agents = ember_workspace();
    let bot = RecordingBotApi::new();
    let delivery = Delivery::new(bot.clone(), IdentityResolver::new(agents.path()));

    let media_url = format!("{media_base}/media/cat.png");
    let mut ctx = OutboundContext::new("channel:555", "a cat", &config);
    ctx.agent_id = Some("ember");
    ctx.media_url = Some(&media_url);

    let receipt = delivery.send_media(&ctx).await.expect("send should succeed");

    assert_eq!(receipt.message_id, "w1");
    assert!(bot.calls().await.is_empty());

    let requests = recorded.lock().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].content_type.starts_with("multipart/form-data"));
    assert!(requests[0].body.contains(r#""content":"a cat""#));
    assert!(requests[0].body.contains("IMGBYTES"));
}

#[tokio::test]
async fn webhook_transport_error_surfaces_to_the_caller() {
    let (base, _recorded) = serve_script(vec![(500, "hook exploded".to_owned())]).await;
    let config = config_with_webhook(&format!("{base}/webhooks/1/tok"));
    let agents = ember_workspace();
    let bot = RecordingBotApi::new();
    let delivery = Delivery::new(bot.clone(), IdentityResolver::new(agents.path()));

    let mut ctx = OutboundContext::new("channel:555", "hello", &config);
    ctx.agent_id = Some("ember");
    let err = delivery
        .send_text(&ctx)
        .await
        .expect_err("transport error must propagate, not fall back");

    assert!(err.to_string().contains("500"));
    assert!(err.to_string().contains("hook exploded"));
    assert!(
        bot.calls().await.is_empty(),
        "a webhook transport error is not a resolution miss"
    );
}
