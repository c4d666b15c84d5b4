use crate::{
    error::ClientError,
    ledger_client::LedgerApi,
    model::CreatedWallet,
    storage::AddressStore,
};
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};
use tracing::{
    error,
    info,
    warn,
};

/// The client's one wallet address: whatever the store holds, plus the
/// address created during this session.
#[derive(Clone)]
pub struct WalletIdentity {
    store: Arc<dyn AddressStore>,
    session_address: Arc<Mutex<Option<String>>>,
}

impl WalletIdentity {
    pub fn new(store: Arc<dyn AddressStore>) -> Self {
        Self {
            store,
            session_address: Arc::new(Mutex::new(None)),
        }
    }

    /// Reads the persisted address. Never touches the network.
    pub fn resolve(&self) -> Option<String> {
        match self.store.load() {
            Ok(address) => address.filter(|a| !a.is_empty()),
            Err(err) => {
                warn!(?err, "failed to read persisted wallet address");
                None
            }
        }
    }

    /// Address wagers are sent from: the persisted one, else the one created
    /// earlier in this session.
    pub fn source_address(&self) -> Option<String> {
        self.resolve().or_else(|| {
            self.session_address
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }

    pub async fn create<A: LedgerApi>(&self, api: &A) -> Result<CreatedWallet, ClientError> {
        let created = api.create_wallet().await?;
        *self
            .session_address
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(created.address.clone());
        if let Err(err) = self.store.save(&created.address) {
            error!(?err, address = %created.address, "failed to persist wallet address");
            return Err(ClientError::Storage(format!("{err:#}")));
        }
        info!(address = %created.address, "wallet created");
        Ok(created)
    }
}
