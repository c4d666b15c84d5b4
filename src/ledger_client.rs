use crate::{
    error::ServiceError,
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
        serialize_amount,
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use reqwest::{
    StatusCode,
    header::CONTENT_TYPE,
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use std::{
    fmt,
    future::Future,
};
use tracing::debug;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:6969";

const BLOCKCHAIN: &str = "/blockchain";
const BALANCE: &str = "/balance";
const CREATE_WALLET: &str = "/createwallet";
const MAX_ERROR_BODY: usize = 160;

/// The ledger/wagering service as seen by the client.
pub trait LedgerApi: Clone + Send + Sync + 'static {
    fn list_blocks(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<BlockPage, ServiceError>> + Send;

    fn balance(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Balance, ServiceError>> + Send;

    fn create_wallet(
        &self,
    ) -> impl Future<Output = Result<CreatedWallet, ServiceError>> + Send;

    fn wager(
        &self,
        request: &WagerRequest,
    ) -> impl Future<Output = Result<WagerResult, ServiceError>> + Send;
}

#[derive(Clone)]
pub struct HttpLedgerClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpLedgerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .build()
            .wrap_err("failed to build HTTP client for ledger service")?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

impl LedgerApi for HttpLedgerClient {
    async fn list_blocks(&self, limit: u32) -> Result<BlockPage, ServiceError> {
        debug!(limit, "fetching recent blocks");
        let res = self
            .http
            .get(self.url(BLOCKCHAIN))
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|err| transport(BLOCKCHAIN, err))?;
        let dto: BlockPageDto = read_json(BLOCKCHAIN, res).await?;
        Ok(dto.into())
    }

    async fn balance(&self, address: &str) -> Result<Balance, ServiceError> {
        debug!(address, "fetching balance");
        let res = self
            .http
            .get(self.url(BALANCE))
            .query(&[("address", address)])
            .send()
            .await
            .map_err(|err| transport(BALANCE, err))?;
        let dto: BalanceDto = read_json(BALANCE, res).await?;
        Ok(Balance {
            amount: dto.balance,
        })
    }

    async fn create_wallet(&self) -> Result<CreatedWallet, ServiceError> {
        debug!("requesting a new wallet");
        let res = self
            .http
            .post(self.url(CREATE_WALLET))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|err| transport(CREATE_WALLET, err))?;
        let dto: CreatedWalletDto = read_json(CREATE_WALLET, res).await?;
        Ok(CreatedWallet {
            address: dto.address,
            message: dto.message,
        })
    }

    async fn wager(&self, request: &WagerRequest) -> Result<WagerResult, ServiceError> {
        let endpoint = request.kind.endpoint();
        let body = WagerBody {
            amount: request.amount,
            guess: request.guess,
            from: request.from.as_deref().unwrap_or_default(),
        };
        debug!(endpoint, amount = request.amount, guess = ?request.guess, "submitting wager");
        let res = self
            .http
            .post(self.url(endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|err| transport(endpoint, err))?;
        let dto: WagerResponseDto = read_json(endpoint, res).await?;
        Ok(dto.into())
    }
}

impl fmt::Display for HttpLedgerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

fn transport(endpoint: &'static str, err: reqwest::Error) -> ServiceError {
    ServiceError::Transport {
        endpoint,
        reason: err.to_string(),
    }
}

async fn read_json<T: DeserializeOwned>(
    endpoint: &'static str,
    res: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = res.status();
    let bytes = res.bytes().await;
    if !status.is_success() {
        let body = match &bytes {
            Ok(bytes) => describe_failure(status, bytes),
            Err(_) => "<unavailable body>".to_string(),
        };
        return Err(ServiceError::Status {
            endpoint,
            status: status.as_u16(),
            body,
        });
    }
    let bytes = bytes.map_err(|err| transport(endpoint, err))?;
    serde_json::from_slice(&bytes).map_err(|err| ServiceError::Decode {
        endpoint,
        reason: err.to_string(),
    })
}

/// Short human-readable reason for a failed request: the JSON `error` field
/// if the service sent one, otherwise the body text, otherwise the status
/// reason phrase.
fn describe_failure(status: StatusCode, bytes: &[u8]) -> String {
    if let Ok(ErrorBodyDto { error }) = serde_json::from_slice::<ErrorBodyDto>(bytes) {
        return preview(&error);
    }
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    } else {
        preview(text)
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(MAX_ERROR_BODY).collect();
    preview.push_str("...");
    preview
}

#[derive(Serialize)]
struct WagerBody<'a> {
    #[serde(serialize_with = "serialize_amount")]
    amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    guess: Option<u8>,
    from: &'a str,
}

#[derive(Deserialize)]
struct ErrorBodyDto {
    error: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockPageDto {
    blocks: Option<Vec<BlockDto>>,
    total_blocks: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockDto {
    height: u64,
    hash: String,
    prev_hash: String,
    timestamp: i64,
    nonce: i64,
    transactions: Option<Vec<TransactionDto>>,
}

#[derive(Deserialize)]
struct TransactionDto {
    id: String,
    inputs: u64,
    outputs: u64,
}

#[derive(Deserialize)]
struct BalanceDto {
    balance: f64,
}

#[derive(Deserialize)]
struct CreatedWalletDto {
    address: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WagerResponseDto {
    #[serde(default)]
    result: String,
    #[serde(default)]
    message: String,
    amount_change: Option<f64>,
    bet_amount: Option<f64>,
    change: Option<f64>,
    block: Option<String>,
    tx: Option<String>,
    server_number: Option<i64>,
}

impl From<BlockPageDto> for BlockPage {
    fn from(dto: BlockPageDto) -> Self {
        BlockPage {
            blocks: dto
                .blocks
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
            total_blocks: dto.total_blocks,
        }
    }
}

impl From<BlockDto> for Block {
    fn from(dto: BlockDto) -> Self {
        Block {
            height: dto.height,
            hash: dto.hash,
            prev_hash: dto.prev_hash,
            timestamp: dto.timestamp,
            nonce: dto.nonce,
            transactions: dto
                .transactions
                .unwrap_or_default()
                .into_iter()
                .map(|tx| Transaction {
                    id: tx.id,
                    inputs: tx.inputs,
                    outputs: tx.outputs,
                })
                .collect(),
        }
    }
}

impl From<WagerResponseDto> for WagerResult {
    fn from(dto: WagerResponseDto) -> Self {
        WagerResult {
            outcome: Outcome::from(dto.result),
            message: dto.message,
            settlement: Settlement {
                amount_change: dto.amount_change,
                bet_amount: dto.bet_amount,
                change: dto.change,
                block: dto.block,
                tx: dto.tx,
                server_number: dto.server_number,
            },
        }
    }
}
