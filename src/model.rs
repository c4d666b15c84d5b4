use serde::{
    Serialize,
    Serializer,
};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub inputs: u64,
    pub outputs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub height: u64,
    pub hash: String,
    pub prev_hash: String,
    /// Seconds since the unix epoch.
    pub timestamp: i64,
    pub nonce: i64,
    pub transactions: Vec<Transaction>,
}

/// One `/blockchain` response, newest block first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockPage {
    pub blocks: Vec<Block>,
    pub total_blocks: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Balance {
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedWallet {
    pub address: String,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WagerKind {
    CoinFlip,
    DiceRoll,
    NumberGuess,
}

impl WagerKind {
    pub const ALL: [WagerKind; 3] = [
        WagerKind::CoinFlip,
        WagerKind::DiceRoll,
        WagerKind::NumberGuess,
    ];

    pub fn endpoint(self) -> &'static str {
        match self {
            WagerKind::CoinFlip => "/coinflip",
            WagerKind::DiceRoll => "/diceroll",
            WagerKind::NumberGuess => "/numberrange",
        }
    }

    /// Label used for activity log entries.
    pub fn activity_label(self) -> &'static str {
        match self {
            WagerKind::CoinFlip => "COINFLIP",
            WagerKind::DiceRoll => "DICE_ROLL",
            WagerKind::NumberGuess => "NUMBER_GUESS",
        }
    }

    pub fn takes_guess(self) -> bool {
        matches!(self, WagerKind::NumberGuess)
    }
}

impl fmt::Display for WagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WagerKind::CoinFlip => "Coin Flip",
            WagerKind::DiceRoll => "Dice Roll",
            WagerKind::NumberGuess => "Number Guess",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WagerRequest {
    pub kind: WagerKind,
    pub amount: f64,
    pub from: Option<String>,
    pub guess: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Other(String),
}

impl Outcome {
    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
            Outcome::Other(raw) => raw,
        }
    }
}

impl From<String> for Outcome {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "WIN" => Outcome::Win,
            "LOSS" => Outcome::Loss,
            _ => Outcome::Other(raw),
        }
    }
}

/// Settlement details some services attach to a wager reply.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bet_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_number: Option<i64>,
}

impl Settlement {
    pub fn is_empty(&self) -> bool {
        *self == Settlement::default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WagerResult {
    pub outcome: Outcome,
    pub message: String,
    pub settlement: Settlement,
}

/// Renders an amount the way the service reports it: whole values without a
/// fractional part.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < i64::MAX as f64 {
        format!("{}", amount as i64)
    } else {
        format!("{amount}")
    }
}

/// Whole amounts go over the wire as JSON integers; the service decodes them
/// into an integer field and rejects `10.0`.
pub(crate) fn serialize_amount<S>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if amount.fract() == 0.0 && amount.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*amount as i64)
    } else {
        serializer.serialize_f64(*amount)
    }
}
