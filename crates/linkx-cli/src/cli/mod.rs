//! CLI for linkx.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use linkx_core::config;
use linkx_core::retry::RetryPolicy;
use std::path::{Path, PathBuf};

use commands::{run_checksum, run_fetch, run_resolve, FetchArgs};

/// Top-level CLI for linkx.
#[derive(Debug, Parser)]
#[command(name = "linkx")]
#[command(about = "linkx: resolve file-host share pages to direct download links", long_about = None)]
pub struct Cli {
    /// Retry transient failures (network, 429, 5xx) up to N times. Overrides `[retry]` in config.
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// Use this config file instead of `$XDG_CONFIG_HOME/linkx/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the direct download URL behind a share page.
    Resolve {
        /// Share page URL.
        url: String,
        /// Print `{download, filename}` as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve a share page and download the binary.
    Fetch {
        /// Share page URL.
        url: String,
        /// Directory to save into (default: current directory).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Expected SHA-256 of the binary (hex).
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,
        /// Expected size of the binary in bytes.
        #[arg(long, value_name = "N")]
        expect_size: Option<u64>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: String,
    },
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        Cli::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let cfg = match &self.config {
            Some(path) => config::load_or_init_at(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);
        let policy = retry_policy(cfg.retry_policy()?, self.retries);

        match self.command {
            CliCommand::Resolve { url, json } => run_resolve(&cfg, &url, json, policy).await?,
            CliCommand::Fetch {
                url,
                output_dir,
                sha256,
                expect_size,
                force,
            } => {
                let args = FetchArgs {
                    url,
                    output_dir,
                    sha256,
                    expect_size,
                    force,
                };
                run_fetch(&cfg, args, policy).await?;
            }
            CliCommand::Checksum { path } => run_checksum(Path::new(&path)).await?,
        }

        Ok(())
    }
}

/// `--retries N` means N retries after the first attempt.
fn retry_policy(base: RetryPolicy, retries: Option<u32>) -> RetryPolicy {
    match retries {
        Some(n) => RetryPolicy {
            max_attempts: n.saturating_add(1),
            ..base
        },
        None => base,
    }
}

#[cfg(test)]
mod tests;
