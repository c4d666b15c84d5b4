use crate::{
    block_feed::BlockFeed,
    ledger_client::LedgerApi,
    model::WagerKind,
    view::ViewPort,
};
use chrono::{
    SecondsFormat,
    Utc,
};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{
    debug,
    info,
};

pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityKind {
    WalletCreation,
    Wager(WagerKind),
}

impl ActivityKind {
    pub fn label(self) -> &'static str {
        match self {
            ActivityKind::WalletCreation => "WALLET_CREATION",
            ActivityKind::Wager(kind) => kind.activity_label(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub game: String,
    pub result: String,
    pub timestamp: String,
    pub payload: Value,
}

impl ActivityEntry {
    pub fn new(game: &str, result: &str, payload: Value) -> Self {
        Self {
            game: game.to_string(),
            result: result.to_string(),
            timestamp: now_rfc3339(),
            payload,
        }
    }
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Trace of settled actions. Each record also nudges the block feed, since
/// the service has probably mined something new by then.
#[derive(Clone)]
pub struct ActivityLog<A, V> {
    feed: BlockFeed<A, V>,
    view: V,
    delay: Duration,
}

impl<A: LedgerApi, V: ViewPort> ActivityLog<A, V> {
    pub fn new(feed: BlockFeed<A, V>, view: V, delay: Duration) -> Self {
        Self { feed, view, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn record(&self, kind: ActivityKind, result: &str, payload: Value) {
        let entry = ActivityEntry::new(kind.label(), result, payload);
        info!(
            target: "activity",
            game = %entry.game,
            result = %entry.result,
            timestamp = %entry.timestamp,
            payload = %entry.payload,
            "activity recorded"
        );
        self.view.append_activity(entry);

        let feed = self.feed.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("refreshing block feed after activity");
            feed.refresh().await;
        });
    }
}
