use bytes::Bytes;
use reqwest::IntoUrl;

use crate::{
    error::{SegfeedError, SegfeedResult},
    util::http::HttpClient,
};

/// GETs `url` and returns the whole body as one buffer.
///
/// A non-success status fails with [SegfeedError::RequestFailed] carrying
/// the status text. The request is never retried.
pub async fn fetch<U>(client: &HttpClient, url: U) -> SegfeedResult<Bytes>
where
    U: IntoUrl,
{
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        if let Ok(body) = response.text().await {
            tracing::warn!("Error body: {body}");
        }
        let status_text = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_u16().to_string());
        return Err(SegfeedError::RequestFailed(status_text));
    }

    let bytes = response.bytes().await?;
    Ok(bytes)
}
