use crate::{
    ledger_client::LedgerApi,
    model::Block,
    view::ViewPort,
};
use chrono::{
    DateTime,
    Local,
    TimeZone,
};
use std::collections::VecDeque;
use tracing::{
    debug,
    warn,
};

pub const DEFAULT_BLOCK_LIMIT: u32 = 50;
/// Largest page the ledger service hands out.
pub const MAX_BLOCK_LIMIT: u32 = 100;

/// One rendered block, ready for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockCard {
    pub height: u64,
    pub transaction_count: usize,
    pub timestamp: String,
    pub hash: String,
    pub prev_hash: String,
    pub nonce: i64,
    pub transactions: Vec<String>,
}

impl BlockCard {
    pub fn new<Tz: TimeZone>(block: &Block, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        BlockCard {
            height: block.height,
            transaction_count: block.transactions.len(),
            timestamp: format_timestamp(block.timestamp, tz),
            hash: block.hash.clone(),
            prev_hash: block.prev_hash.clone(),
            nonce: block.nonce,
            transactions: block
                .transactions
                .iter()
                .map(|tx| {
                    format!("TX: {} ({} inputs, {} outputs)", tx.id, tx.inputs, tx.outputs)
                })
                .collect(),
        }
    }
}

/// The display container for blocks; the first card is drawn at the top.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockList {
    cards: VecDeque<BlockCard>,
}

impl BlockList {
    pub fn prepend(&mut self, card: BlockCard) {
        self.cards.push_front(card);
    }

    pub fn cards(&self) -> impl Iterator<Item = &BlockCard> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Builds a fresh list from a newest-first response: walk it oldest to
/// newest and put each card on top, so the top-to-bottom order ends up equal
/// to the response order.
pub fn render_feed<Tz: TimeZone>(blocks: &[Block], tz: &Tz) -> BlockList
where
    Tz::Offset: std::fmt::Display,
{
    let mut list = BlockList::default();
    for block in blocks.iter().rev() {
        list.prepend(BlockCard::new(block, tz));
    }
    list
}

pub fn format_timestamp<Tz: TimeZone>(seconds: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::from_timestamp(seconds, 0) {
        Some(utc) => utc
            .with_timezone(tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => format!("invalid timestamp ({seconds})"),
    }
}

#[derive(Clone)]
pub struct BlockFeed<A, V> {
    api: A,
    view: V,
    limit: u32,
}

impl<A: LedgerApi, V: ViewPort> BlockFeed<A, V> {
    pub fn new(api: A, view: V, limit: u32) -> Self {
        Self {
            api,
            view,
            limit: limit.clamp(1, MAX_BLOCK_LIMIT),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Failures leave the current list on screen and are only logged.
    pub async fn refresh(&self) {
        match self.api.list_blocks(self.limit).await {
            Ok(page) => {
                debug!(
                    received = page.blocks.len(),
                    total = ?page.total_blocks,
                    "rendering block feed"
                );
                self.view.render_blocks(render_feed(&page.blocks, &Local));
            }
            Err(err) => {
                warn!(%err, "block feed refresh failed");
            }
        }
    }
}
