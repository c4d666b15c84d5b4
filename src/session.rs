use crate::{
    activity::{
        ActivityKind,
        ActivityLog,
        now_rfc3339,
    },
    balance::LedgerBalanceView,
    block_feed::BlockFeed,
    error::ClientError,
    ledger_client::LedgerApi,
    model::{
        CreatedWallet,
        WagerResult,
    },
    view::{
        Panel,
        Tone,
        ViewPort,
    },
    wager::{
        WagerClient,
        WagerForm,
    },
    wallet::WalletIdentity,
};
use serde_json::json;
use std::time::Duration;
use tracing::{
    info,
    warn,
};

/// Owns the wallet identity and wires the protocol components together.
/// Cheap to clone; every user action runs on its own clone.
#[derive(Clone)]
pub struct ClientSession<A, V> {
    api: A,
    view: V,
    wallet: WalletIdentity,
    balance: LedgerBalanceView<A, V>,
    feed: BlockFeed<A, V>,
    activity: ActivityLog<A, V>,
    wagers: WagerClient<A, V>,
}

impl<A: LedgerApi, V: ViewPort> ClientSession<A, V> {
    pub fn new(
        api: A,
        view: V,
        wallet: WalletIdentity,
        block_limit: u32,
        refresh_delay: Duration,
    ) -> Self {
        let balance = LedgerBalanceView::new(api.clone(), view.clone());
        let feed = BlockFeed::new(api.clone(), view.clone(), block_limit);
        let activity = ActivityLog::new(feed.clone(), view.clone(), refresh_delay);
        let wagers = WagerClient::new(
            api.clone(),
            view.clone(),
            wallet.clone(),
            balance.clone(),
            activity.clone(),
        );
        Self {
            api,
            view,
            wallet,
            balance,
            feed,
            activity,
            wagers,
        }
    }

    pub fn wallet(&self) -> &WalletIdentity {
        &self.wallet
    }

    /// Startup: show the persisted wallet if there is one, and fill the
    /// block feed either way.
    pub async fn load(&self) {
        match self.wallet.resolve() {
            Some(address) => {
                info!(%address, "resuming with persisted wallet");
                self.view
                    .display(Panel::WalletAddress, address.clone(), Tone::Neutral);
                tokio::join!(self.balance.refresh(&address), self.feed.refresh());
            }
            None => {
                info!("no persisted wallet");
                self.feed.refresh().await;
            }
        }
    }

    pub async fn create_wallet(&self) -> Result<CreatedWallet, ClientError> {
        match self.wallet.create(&self.api).await {
            Ok(created) => {
                self.view.display(
                    Panel::WalletAddress,
                    created.address.clone(),
                    Tone::Success,
                );
                self.view.display(
                    Panel::WalletMessage,
                    created.message.clone(),
                    Tone::Success,
                );
                self.activity.record(
                    ActivityKind::WalletCreation,
                    "SUCCESS",
                    json!({
                        "address": created.address,
                        "message": created.message,
                        "timestamp": now_rfc3339(),
                    }),
                );
                self.balance.refresh(&created.address).await;
                Ok(created)
            }
            Err(err) => {
                warn!(%err, "wallet creation failed");
                if let (ClientError::Storage(_), Some(address)) =
                    (&err, self.wallet.source_address())
                {
                    self.view
                        .display(Panel::WalletAddress, address.clone(), Tone::Neutral);
                    self.view
                        .display(Panel::WalletMessage, format!("Error: {err}"), Tone::Danger);
                    self.balance.refresh(&address).await;
                } else {
                    self.view
                        .display(Panel::WalletMessage, format!("Error: {err}"), Tone::Danger);
                }
                Err(err)
            }
        }
    }

    pub async fn place_wager(&self, form: &WagerForm) -> Result<WagerResult, ClientError> {
        self.wagers.submit(form).await
    }

    pub async fn refresh_blocks(&self) {
        self.feed.refresh().await;
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        activity::DEFAULT_REFRESH_DELAY,
        block_feed::DEFAULT_BLOCK_LIMIT,
        error::ServiceError,
        model::{
            BlockPage,
            WagerKind,
        },
        storage::{
            AddressStore,
            InMemoryAddressStore,
        },
        test_helpers::{
            FakeLedger,
            LedgerCall,
            arb_block,
            win,
        },
        view::SharedView,
    };
    use std::sync::Arc;

    fn session(
        ledger: &FakeLedger,
        view: &SharedView,
        store: Arc<InMemoryAddressStore>,
    ) -> ClientSession<FakeLedger, SharedView> {
        ClientSession::new(
            ledger.clone(),
            view.clone(),
            WalletIdentity::new(store),
            DEFAULT_BLOCK_LIMIT,
            DEFAULT_REFRESH_DELAY,
        )
    }

    #[tokio::test]
    async fn load__without_wallet_hides_balance_and_renders_feed() {
        // given
        let ledger = FakeLedger::new();
        ledger.list_blocks_returns(Ok(BlockPage {
            blocks: vec![arb_block(3), arb_block(2), arb_block(1)],
            total_blocks: Some(3),
        }));
        let view = SharedView::new();
        let session = session(&ledger, &view, Arc::new(InMemoryAddressStore::default()));

        // when
        session.load().await;

        // then
        let model = view.snapshot();
        assert!(!model.is_visible(Panel::Balance));
        assert!(!model.is_visible(Panel::WalletAddress));
        assert_eq!(model.feed.map(|feed| feed.len()), Some(3));
        assert_eq!(ledger.calls(), vec![LedgerCall::ListBlocks(50)]);
    }

    #[tokio::test]
    async fn load__with_wallet_shows_address_and_balance() {
        // given
        let ledger = FakeLedger::new();
        ledger.balance_returns(Ok(crate::model::Balance { amount: 120.0 }));
        let view = SharedView::new();
        let session = session(
            &ledger,
            &view,
            Arc::new(InMemoryAddressStore::with_address("w0")),
        );

        // when
        session.load().await;

        // then
        let model = view.snapshot();
        assert_eq!(model.panel(Panel::WalletAddress).unwrap().value, "w0");
        assert_eq!(model.panel(Panel::Balance).unwrap().value, "120");
        let calls = ledger.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.contains(&LedgerCall::Balance("w0".to_string())));
        assert!(calls.contains(&LedgerCall::ListBlocks(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn create_wallet__persists_refreshes_balance_and_records_activity() {
        // given
        let ledger = FakeLedger::new();
        ledger.create_wallet_returns(Ok(CreatedWallet {
            address: "w1".to_string(),
            message: "created".to_string(),
        }));
        let view = SharedView::new();
        let store = Arc::new(InMemoryAddressStore::default());
        let session = session(&ledger, &view, store.clone());

        // when
        session.create_wallet().await.unwrap();

        // then
        assert_eq!(store.load().unwrap(), Some("w1".to_string()));
        assert_eq!(
            ledger.calls(),
            vec![
                LedgerCall::CreateWallet,
                LedgerCall::Balance("w1".to_string())
            ]
        );
        let model = view.snapshot();
        assert_eq!(model.panel(Panel::WalletAddress).unwrap().value, "w1");
        let message = model.panel(Panel::WalletMessage).unwrap();
        assert_eq!(message.value, "created");
        assert_eq!(message.tone, Tone::Success);
        assert_eq!(model.activity[0].game, "WALLET_CREATION");
        assert_eq!(model.activity[0].result, "SUCCESS");
        assert_eq!(model.activity[0].payload["address"], "w1");
    }

    #[tokio::test]
    async fn create_wallet__failure_shows_error_and_keeps_old_wallet() {
        // given
        let ledger = FakeLedger::new();
        ledger.create_wallet_returns(Err(ServiceError::Transport {
            endpoint: "/createwallet",
            reason: "connection refused".to_string(),
        }));
        let view = SharedView::new();
        let store = Arc::new(InMemoryAddressStore::with_address("w0"));
        let session = session(&ledger, &view, store.clone());

        // when
        let result = session.create_wallet().await;

        // then
        assert!(result.is_err());
        assert_eq!(store.load().unwrap(), Some("w0".to_string()));
        let model = view.snapshot();
        let message = model.panel(Panel::WalletMessage).unwrap();
        assert!(message.value.starts_with("Error: "));
        assert!(message.value.contains("connection refused"));
        assert_eq!(message.tone, Tone::Danger);
        assert!(model.activity.is_empty());
        assert_eq!(ledger.calls(), vec![LedgerCall::CreateWallet]);
    }

    #[tokio::test(start_paused = true)]
    async fn place_wager__uses_wallet_created_in_this_session() {
        // given
        let ledger = FakeLedger::new();
        ledger.create_wallet_returns(Ok(CreatedWallet {
            address: "w1".to_string(),
            message: "created".to_string(),
        }));
        ledger.wager_returns(Ok(win("+20")));
        let view = SharedView::new();
        let session = session(&ledger, &view, Arc::new(InMemoryAddressStore::default()));
        session.create_wallet().await.unwrap();

        // when
        session
            .place_wager(&WagerForm::new(WagerKind::CoinFlip, "10"))
            .await
            .unwrap();

        // then
        let calls = ledger.calls();
        assert!(matches!(
            &calls[2],
            LedgerCall::Wager(request) if request.from.as_deref() == Some("w1")
        ));
        assert_eq!(calls[3], LedgerCall::Balance("w1".to_string()));
    }
}
