//! File-with-caption delivery over a webhook endpoint.

use discord_courier::webhook::{WebhookClient, WebhookError, WebhookIdentity, WebhookSendOptions};

use crate::support::{ok_message, serve_media, serve_script};

fn opts_for(base: &str) -> WebhookSendOptions {
    WebhookSendOptions {
        url: format!("{base}/webhooks/1/tok"),
        ..Default::default()
    }
}

/// A caption that splits into exactly three chunks at the 2000-char limit.
fn three_chunk_caption() -> String {
    format!("{}\n{}\n{}", "a".repeat(1500), "b".repeat(1500), "c".repeat(1500))
}

#[tokio::test]
async fn file_post_carries_payload_and_caption() {
    let media_base = serve_media(b"IMGBYTES".to_vec(), "image/png").await;
    let (base, recorded) = serve_script(vec![ok_message("f1", "555")]).await;
    let client = WebhookClient::new();

    let result = client
        .send_media(
            "look at this",
            &format!("{media_base}/media/cat.png"),
            &opts_for(&base),
        )
        .await
        .expect("send should succeed");

    assert_eq!(result.message_id, "f1");
    assert_eq!(result.channel_id, "555");

    let requests = recorded.lock().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].content_type.starts_with("multipart/form-data"));
    assert!(requests[0].body.contains(r#"name="payload_json""#));
    assert!(requests[0].body.contains(r#"name="files[0]""#));
    assert!(requests[0].body.contains(r#"filename="cat.png""#));
    assert!(requests[0].body.contains("image/png"));
    assert!(requests[0].body.contains("IMGBYTES"));
    assert!(requests[0].body.contains(r#""content":"look at this""#));
}

#[tokio::test]
async fn long_caption_splits_into_file_post_plus_followups() {
    let media_base = serve_media(b"IMGBYTES".to_vec(), "image/png").await;
    let (base, recorded) = serve_script(vec![
        ok_message("f1", "555"),
        ok_message("t2", "555"),
        ok_message("t3", "555"),
    ])
    .await;
    let client = WebhookClient::new();

    let result = client
        .send_media(
            &three_chunk_caption(),
            &format!("{media_base}/media/cat.png"),
            &opts_for(&base),
        )
        .await
        .expect("send should succeed");

    assert_eq!(
        result.message_id, "f1",
        "result must be the file-carrying message, not a follow-up"
    );

    let requests = recorded.lock().await;
    assert_eq!(requests.len(), 3, "one file post and two follow-up text posts");
    assert!(requests[0].content_type.starts_with("multipart/form-data"));
    assert!(requests[0].body.contains("aaa"));
    assert!(requests[1].content_type.starts_with("application/json"));
    assert!(requests[1].body.contains("bbb"));
    assert!(requests[2].content_type.starts_with("application/json"));
    assert!(requests[2].body.contains("ccc"));
}

#[tokio::test]
async fn followups_carry_identity_but_not_embeds() {
    let media_base = serve_media(b"IMGBYTES".to_vec(), "image/png").await;
    let (base, recorded) = serve_script(vec![
        ok_message("f1", "555"),
        ok_message("t2", "555"),
        ok_message("t3", "555"),
    ])
    .await;
    let client = WebhookClient::new();

    let opts = WebhookSendOptions {
        identity: WebhookIdentity {
            username: Some("🔥 Ember".to_owned()),
            avatar_url: None,
        },
        embeds: Some(vec![serde_json::json!({"title": "report"})]),
        ..opts_for(&base)
    };
    client
        .send_media(
            &three_chunk_caption(),
            &format!("{media_base}/media/cat.png"),
            &opts,
        )
        .await
        .expect("send should succeed");

    let requests = recorded.lock().await;
    // Embeds attach to the file-carrying unit only.
    assert!(requests[0].body.contains(r#""embeds""#));
    assert!(!requests[1].body.contains(r#""embeds""#));
    assert!(!requests[2].body.contains(r#""embeds""#));
    for request in requests.iter() {
        assert!(request.body.contains("🔥 Ember"));
    }
}

#[tokio::test]
async fn empty_caption_sends_only_the_file() {
    let media_base = serve_media(b"IMGBYTES".to_vec(), "image/png").await;
    let (base, recorded) = serve_script(vec![ok_message("f1", "555")]).await;
    let client = WebhookClient::new();

    client
        .send_media("   ", &format!("{media_base}/media/cat.png"), &opts_for(&base))
        .await
        .expect("send should succeed");

    let requests = recorded.lock().await;
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].body.contains(r#""content""#));
}

#[tokio::test]
async fn unknown_media_metadata_gets_defaults() {
    // Bare host path yields no filename; no Content-Type header either.
    let media_base = serve_media(b"RAWBYTES".to_vec(), "").await;
    let (base, recorded) = serve_script(vec![ok_message("f1", "555")]).await;
    let client = WebhookClient::new();

    client
        .send_media("here", &format!("{media_base}/"), &opts_for(&base))
        .await
        .expect("send should succeed");

    let requests = recorded.lock().await;
    assert!(requests[0].body.contains(r#"filename="upload""#));
    assert!(requests[0].body.contains("application/octet-stream"));
}

#[tokio::test]
async fn followup_failure_aborts_remaining_followups() {
    let media_base = serve_media(b"IMGBYTES".to_vec(), "image/png").await;
    let (base, recorded) = serve_script(vec![
        ok_message("f1", "555"),
        (500, "boom".to_owned()),
    ])
    .await;
    let client = WebhookClient::new();

    let err = client
        .send_media(
            &three_chunk_caption(),
            &format!("{media_base}/media/cat.png"),
            &opts_for(&base),
        )
        .await
        .expect_err("follow-up failure must surface");

    assert!(matches!(err, WebhookError::HttpStatus { status: 500, .. }));

    let requests = recorded.lock().await;
    assert_eq!(
        requests.len(),
        2,
        "file post plus the failed follow-up; the third chunk is never attempted"
    );
}

#[tokio::test]
async fn media_fetch_failure_prevents_any_webhook_post() {
    let (media_base, _media_recorded) = serve_script(vec![(404, "gone".to_owned())]).await;
    let (base, recorded) = serve_script(Vec::new()).await;
    let client = WebhookClient::new();

    let err = client
        .send_media("caption", &format!("{media_base}/media/cat.png"), &opts_for(&base))
        .await
        .expect_err("fetch failure must surface");

    assert!(matches!(err, WebhookError::Media(_)));
    assert!(recorded.lock().await.is_empty());
}
