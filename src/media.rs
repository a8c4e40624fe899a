//! Remote media download into an in-memory payload.
//!
//! Media sends reference an attachment by URL. The transport downloads it
//! into memory, keeping the filename and content type when the source
//! exposes them, and forwards the bytes as one multipart file part.

use thiserror::Error;
use url::Url;

/// A fetched media resource held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// Filename derived from the source URL path, when one is present.
    pub filename: Option<String>,
    /// Content type reported by the source, when one is present.
    pub content_type: Option<String>,
}

/// Media download errors.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The source returned a non-success HTTP status.
    #[error("media fetch failed with HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Best-effort response body text.
        body: String,
    },
    /// Connection-level failure.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Download a media resource into memory.
///
/// # Errors
///
/// Returns an error on connection failure or any non-success status.
pub async fn fetch_media(client: &reqwest::Client, url: &str) -> Result<MediaPayload, MediaError> {
    let filename = filename_from_url(url);

    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_owned());
        return Err(MediaError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let bytes = resp.bytes().await?.to_vec();

    Ok(MediaPayload {
        bytes,
        filename,
        content_type,
    })
}

/// Last non-empty path segment of a URL, used as the upload filename.
fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    Some(segment.to_owned())
}
