use thiserror::Error;

/// Bad input caught before anything is sent to the ledger service.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid bet amount.")]
    InvalidAmount,

    #[error("Please enter a valid guess between 1 and 100.")]
    InvalidGuess,
}

/// A request to the ledger service that did not produce a usable answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("request to {endpoint} failed: {reason}")]
    Transport {
        endpoint: &'static str,
        reason: String,
    },

    #[error("ledger service responded with {status} on {endpoint}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("invalid {endpoint} payload: {reason}")]
    Decode {
        endpoint: &'static str,
        reason: String,
    },
}

impl ServiceError {
    pub fn endpoint(&self) -> &'static str {
        match self {
            ServiceError::Transport { endpoint, .. }
            | ServiceError::Status { endpoint, .. }
            | ServiceError::Decode { endpoint, .. } => endpoint,
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("failed to persist wallet address: {0}")]
    Storage(String),
}
