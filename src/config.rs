use crate::{
    activity::DEFAULT_REFRESH_DELAY,
    block_feed::{
        DEFAULT_BLOCK_LIMIT,
        MAX_BLOCK_LIMIT,
    },
    ledger_client::DEFAULT_SERVICE_URL,
};
use clap::Parser;
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::{
    path::PathBuf,
    time::Duration,
};

pub const DEFAULT_DATA_DIR: &str = "~/.ledger-wager";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Terminal dashboard for a local ledger and wagering service",
    long_about = None
)]
pub struct Cli {
    /// Origin of the ledger service.
    #[arg(long, env = "LEDGER_SERVICE_URL", default_value = DEFAULT_SERVICE_URL)]
    pub service_url: String,

    /// Holds the persisted wallet address and the client log.
    #[arg(long, env = "LEDGER_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    /// Number of recent blocks shown in the feed (1-100).
    #[arg(long, default_value_t = DEFAULT_BLOCK_LIMIT)]
    pub block_limit: u32,

    /// Pause before re-reading the block feed after a settled action.
    #[arg(long, default_value_t = DEFAULT_REFRESH_DELAY.as_millis() as u64)]
    pub refresh_delay_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub service_url: String,
    pub data_dir: PathBuf,
    pub block_limit: u32,
    pub refresh_delay: Duration,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let service_url = cli.service_url.trim().trim_end_matches('/').to_string();
        if !(service_url.starts_with("http://") || service_url.starts_with("https://")) {
            return Err(eyre!(
                "service url must start with http:// or https://, got '{}'",
                cli.service_url
            ));
        }
        Ok(AppConfig {
            service_url,
            data_dir: resolve_data_dir(&cli.data_dir),
            block_limit: cli.block_limit.clamp(1, MAX_BLOCK_LIMIT),
            refresh_delay: Duration::from_millis(cli.refresh_delay_ms),
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("client.log")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            data_dir: resolve_data_dir(DEFAULT_DATA_DIR),
            block_limit: DEFAULT_BLOCK_LIMIT,
            refresh_delay: DEFAULT_REFRESH_DELAY,
        }
    }
}

pub fn resolve_data_dir(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    PathBuf::from(expanded.into_owned())
}

pub fn parse_cli_args() -> Result<AppConfig> {
    AppConfig::from_cli(Cli::parse())
}
