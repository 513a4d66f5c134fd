use anyhow::{Context, Result};

/// POSTs `body` to `url` once.
///
/// The response status is logged but not checked; only transport errors fail.
pub async fn send_http_async(url: &str, body: Vec<u8>) -> Result<()> {
    let len = body.len();
    let client = reqwest::Client::new();
    let resp = client
        .post(url)
        .body(body)
        .send()
        .await
        .with_context(|| format!("posting archive to {url}"))?;

    tracing::info!(%url, bytes = len, status = %resp.status(), "installer responded");
    Ok(())
}
