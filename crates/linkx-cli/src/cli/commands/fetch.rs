//! `linkx fetch <url>`: resolve, download and verify.

use anyhow::{Context, Result};
use linkx_core::config::LinkxConfig;
use linkx_core::download::{self, SaveOptions};
use linkx_core::retry::{self, RetryPolicy};
use linkx_core::CurlTransport;
use std::path::PathBuf;

use super::resolve::resolve_link;

#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub url: String,
    pub output_dir: Option<PathBuf>,
    pub sha256: Option<String>,
    pub expect_size: Option<u64>,
    pub force: bool,
}

pub async fn run_fetch(cfg: &LinkxConfig, args: FetchArgs, policy: RetryPolicy) -> Result<()> {
    let link = resolve_link(cfg, &args.url, policy).await?;
    tracing::info!("resolved {} -> {}", args.url, link.download);

    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let options = SaveOptions {
        output_dir,
        sha256: args.sha256,
        expect_size: args.expect_size,
        force: args.force,
    };

    let transport = CurlTransport::from_config(cfg);
    let path = tokio::task::spawn_blocking(move || -> Result<PathBuf> {
        let binary = retry::run_with_retry(&policy, retry::classify_anyhow, || {
            download::fetch(&transport, &link.download)
        })?;
        download::save(&link, &binary, &options)
    })
    .await
    .context("download task join")??;

    println!("{}", path.display());
    Ok(())
}
