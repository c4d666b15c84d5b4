use crate::{
    ledger_client::LedgerApi,
    model::format_amount,
    view::{
        Panel,
        Tone,
        ViewPort,
    },
};
use tracing::{
    debug,
    warn,
};

#[derive(Clone)]
pub struct LedgerBalanceView<A, V> {
    api: A,
    view: V,
}

impl<A: LedgerApi, V: ViewPort> LedgerBalanceView<A, V> {
    pub fn new(api: A, view: V) -> Self {
        Self { api, view }
    }

    /// Shows the latest balance of `address`, or the reason it could not be
    /// read. Whatever lands last stays on screen.
    pub async fn refresh(&self, address: &str) {
        if address.is_empty() {
            debug!("no wallet address; balance panel stays hidden");
            return;
        }
        match self.api.balance(address).await {
            Ok(balance) => {
                self.view.display(
                    Panel::Balance,
                    format_amount(balance.amount),
                    Tone::Neutral,
                );
            }
            Err(err) => {
                warn!(%err, address, "balance refresh failed");
                self.view
                    .display(Panel::Balance, format!("Error: {err}"), Tone::Danger);
            }
        }
    }
}
