use crate::{
    activity::{
        ActivityKind,
        ActivityLog,
        now_rfc3339,
    },
    balance::LedgerBalanceView,
    error::{
        ClientError,
        ValidationError,
    },
    ledger_client::LedgerApi,
    model::{
        Outcome,
        Settlement,
        WagerKind,
        WagerRequest,
        WagerResult,
        serialize_amount,
    },
    view::{
        Panel,
        Tone,
        ViewPort,
    },
    wallet::WalletIdentity,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{
    info,
    warn,
};

/// Raw user input for one wager, as typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WagerForm {
    pub kind: WagerKind,
    pub amount: String,
    pub guess: Option<String>,
}

impl WagerForm {
    pub fn new(kind: WagerKind, amount: impl Into<String>) -> Self {
        Self {
            kind,
            amount: amount.into(),
            guess: None,
        }
    }

    pub fn with_guess(mut self, guess: impl Into<String>) -> Self {
        self.guess = Some(guess.into());
        self
    }

    /// The guess is checked before the amount, so a bad guess is what gets
    /// reported when both are wrong.
    pub fn validate(&self) -> Result<(f64, Option<u8>), ValidationError> {
        let guess = if self.kind.takes_guess() {
            Some(parse_guess(self.guess.as_deref().unwrap_or_default())?)
        } else {
            None
        };
        let amount = parse_amount(&self.amount)?;
        Ok((amount, guess))
    }
}

pub fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(ValidationError::InvalidAmount),
    }
}

pub fn parse_guess(raw: &str) -> Result<u8, ValidationError> {
    match raw.trim().parse::<i64>() {
        Ok(guess @ 1..=100) => Ok(guess as u8),
        _ => Err(ValidationError::InvalidGuess),
    }
}

pub fn outcome_tone(outcome: &Outcome) -> Tone {
    match outcome {
        Outcome::Win => Tone::Success,
        Outcome::Loss => Tone::Danger,
        Outcome::Other(_) => Tone::Info,
    }
}

#[derive(Serialize)]
struct WagerPayload<'a> {
    address: &'a str,
    #[serde(serialize_with = "serialize_amount")]
    amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    guess: Option<u8>,
    message: &'a str,
    timestamp: String,
    #[serde(flatten)]
    settlement: &'a Settlement,
}

#[derive(Clone)]
pub struct WagerClient<A, V> {
    api: A,
    view: V,
    wallet: WalletIdentity,
    balance: LedgerBalanceView<A, V>,
    activity: ActivityLog<A, V>,
}

impl<A: LedgerApi, V: ViewPort> WagerClient<A, V> {
    pub fn new(
        api: A,
        view: V,
        wallet: WalletIdentity,
        balance: LedgerBalanceView<A, V>,
        activity: ActivityLog<A, V>,
    ) -> Self {
        Self {
            api,
            view,
            wallet,
            balance,
            activity,
        }
    }

    pub async fn submit(&self, form: &WagerForm) -> Result<WagerResult, ClientError> {
        let panel = Panel::Game(form.kind);
        let (amount, guess) = match form.validate() {
            Ok(valid) => valid,
            Err(err) => {
                self.view.prompt(err.to_string());
                return Err(err.into());
            }
        };
        let request = WagerRequest {
            kind: form.kind,
            amount,
            from: self.wallet.source_address(),
            guess,
        };

        let result = match self.api.wager(&request).await {
            Ok(result) => result,
            Err(err) => {
                warn!(%err, kind = %form.kind, "wager failed");
                self.view.display(panel, format!("Error: {err}"), Tone::Danger);
                return Err(err.into());
            }
        };
        info!(
            kind = %form.kind,
            result = result.outcome.as_str(),
            "wager settled"
        );
        self.view
            .display(panel, result.message.clone(), outcome_tone(&result.outcome));

        let from = request.from.as_deref().unwrap_or_default();
        self.activity.record(
            ActivityKind::Wager(form.kind),
            result.outcome.as_str(),
            activity_payload(&request, &result),
        );
        self.balance.refresh(from).await;
        Ok(result)
    }
}

fn activity_payload(request: &WagerRequest, result: &WagerResult) -> Value {
    let payload = WagerPayload {
        address: request.from.as_deref().unwrap_or_default(),
        amount: request.amount,
        guess: request.guess,
        message: &result.message,
        timestamp: now_rfc3339(),
        settlement: &result.settlement,
    };
    serde_json::to_value(&payload).unwrap_or_else(|err| {
        warn!(%err, "failed to encode activity payload");
        Value::Null
    })
}
