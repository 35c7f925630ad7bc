//! `linkx resolve <url>`: print the direct download link of a share page.

use anyhow::{Context, Result};
use linkx_core::config::LinkxConfig;
use linkx_core::retry::{self, RetryPolicy};
use linkx_core::{CurlTransport, ExtractionResult, Extractor};

/// Extracts the link for `url` on the blocking pool, retrying transient
/// failures per `policy`.
pub async fn resolve_link(
    cfg: &LinkxConfig,
    url: &str,
    policy: RetryPolicy,
) -> Result<ExtractionResult> {
    let extractor = Extractor::new(CurlTransport::from_config(cfg), cfg.extract_options());
    let result = tokio::task::spawn_blocking({
        let url = url.to_string();
        move || retry::run_with_retry(&policy, retry::classify, || extractor.extract(&url))
    })
    .await
    .context("extract task join")?
    .with_context(|| format!("resolve {}", url))?;
    Ok(result)
}

pub async fn run_resolve(cfg: &LinkxConfig, url: &str, json: bool, policy: RetryPolicy) -> Result<()> {
    let result = resolve_link(cfg, url, policy).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.download);
    }
    Ok(())
}
