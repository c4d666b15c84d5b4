pub mod activity;
pub mod balance;
pub mod block_feed;
pub mod client;
pub mod config;
pub mod error;
pub mod ledger_client;
pub mod logging;
pub mod model;
pub mod session;
pub mod storage;
pub mod ui;
pub mod view;
pub mod wager;
pub mod wallet;

#[cfg(test)]
mod test_helpers;
