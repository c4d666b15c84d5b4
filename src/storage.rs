use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
    sync::{
        Mutex,
        PoisonError,
    },
};

const WALLET_FILE: &str = "wallet.json";

/// Durable home of the single wallet-address key.
pub trait AddressStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;

    /// Replaces whatever address was stored before.
    fn save(&self, address: &str) -> Result<()>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub wallet_address: String,
    #[serde(default)]
    pub saved_at: Option<String>,
}

#[derive(Debug)]
pub struct FileAddressStore {
    path: PathBuf,
}

impl FileAddressStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let path = ensure_store(data_dir.as_ref())?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AddressStore for FileAddressStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(read_record(&self.path)?.map(|record| record.wallet_address))
    }

    fn save(&self, address: &str) -> Result<()> {
        let record = WalletRecord {
            wallet_address: address.to_string(),
            saved_at: Some(Utc::now().to_rfc3339()),
        };
        write_record(&self.path, &record)
    }
}

/// Keeps the address for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct InMemoryAddressStore {
    address: Mutex<Option<String>>,
}

impl InMemoryAddressStore {
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: Mutex::new(Some(address.into())),
        }
    }
}

impl AddressStore for InMemoryAddressStore {
    fn load(&self) -> Result<Option<String>> {
        let guard = self.address.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }

    fn save(&self, address: &str) -> Result<()> {
        let mut guard = self.address.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(address.to_string());
        Ok(())
    }
}

fn ensure_store(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir).wrap_err_with(|| {
            format!("Failed to create data directory {}", dir.display())
        })?;
    }
    Ok(dir.join(WALLET_FILE))
}

fn read_record(path: impl AsRef<Path>) -> Result<Option<WalletRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path).wrap_err("Failed to read wallet record")?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let record = serde_json::from_slice::<WalletRecord>(&data)
        .wrap_err("Failed to parse wallet record JSON")?;
    if record.wallet_address.is_empty() {
        return Ok(None);
    }
    Ok(Some(record))
}

fn write_record(path: impl AsRef<Path>, record: &WalletRecord) -> Result<()> {
    let json =
        serde_json::to_vec_pretty(record).wrap_err("Failed to serialize wallet record")?;
    fs::write(path.as_ref(), json).wrap_err("Failed to write wallet record")?;
    Ok(())
}
