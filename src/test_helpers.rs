use crate::{
    error::ServiceError,
    ledger_client::LedgerApi,
    model::{
        Balance,
        Block,
        BlockPage,
        CreatedWallet,
        Outcome,
        Settlement,
        Transaction,
        WagerRequest,
        WagerResult,
    },
};
use std::sync::{
    Arc,
    Mutex,
};

#[derive(Clone, Debug, PartialEq)]
pub enum LedgerCall {
    ListBlocks(u32),
    Balance(String),
    CreateWallet,
    Wager(WagerRequest),
}

struct FakeLedgerState {
    blocks: Result<BlockPage, ServiceError>,
    balance: Result<Balance, ServiceError>,
    created: Result<CreatedWallet, ServiceError>,
    wager: Result<WagerResult, ServiceError>,
    calls: Vec<LedgerCall>,
}

/// Scripted ledger service. Every clone shares the same script and call log.
#[derive(Clone)]
pub struct FakeLedger {
    state: Arc<Mutex<FakeLedgerState>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        let state = FakeLedgerState {
            blocks: Ok(BlockPage::default()),
            balance: Ok(Balance { amount: 0.0 }),
            created: Ok(CreatedWallet {
                address: "fake-wallet".to_string(),
                message: "Wallet created with 100 initial balance".to_string(),
            }),
            wager: Ok(WagerResult {
                outcome: Outcome::Loss,
                message: "You lost!".to_string(),
                settlement: Settlement::default(),
            }),
            calls: Vec::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn list_blocks_returns(&self, result: Result<BlockPage, ServiceError>) {
        self.state.lock().unwrap().blocks = result;
    }

    pub fn balance_returns(&self, result: Result<Balance, ServiceError>) {
        self.state.lock().unwrap().balance = result;
    }

    pub fn create_wallet_returns(&self, result: Result<CreatedWallet, ServiceError>) {
        self.state.lock().unwrap().created = result;
    }

    pub fn wager_returns(&self, result: Result<WagerResult, ServiceError>) {
        self.state.lock().unwrap().wager = result;
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: LedgerCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl LedgerApi for FakeLedger {
    async fn list_blocks(&self, limit: u32) -> Result<BlockPage, ServiceError> {
        self.record(LedgerCall::ListBlocks(limit));
        self.state.lock().unwrap().blocks.clone()
    }

    async fn balance(&self, address: &str) -> Result<Balance, ServiceError> {
        self.record(LedgerCall::Balance(address.to_string()));
        self.state.lock().unwrap().balance.clone()
    }

    async fn create_wallet(&self) -> Result<CreatedWallet, ServiceError> {
        self.record(LedgerCall::CreateWallet);
        self.state.lock().unwrap().created.clone()
    }

    async fn wager(&self, request: &WagerRequest) -> Result<WagerResult, ServiceError> {
        self.record(LedgerCall::Wager(request.clone()));
        self.state.lock().unwrap().wager.clone()
    }
}

pub fn arb_block(height: u64) -> Block {
    Block {
        height,
        hash: format!("{height:064x}"),
        prev_hash: format!("{:064x}", height.saturating_sub(1)),
        timestamp: 1_700_000_000 + height as i64,
        nonce: (height * 31) as i64,
        transactions: vec![Transaction {
            id: format!("tx-{height}"),
            inputs: 1,
            outputs: 2,
        }],
    }
}

pub fn win(message: &str) -> WagerResult {
    WagerResult {
        outcome: Outcome::Win,
        message: message.to_string(),
        settlement: Settlement::default(),
    }
}
