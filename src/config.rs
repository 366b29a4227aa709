use config::ConfigError;
use std::time::Duration;

use crate::chain::{EsploraConfig, Network};
use crate::scanner::ScanScheduleConfig;
use crate::wallet::models::Currency;

/// Wallet registered at startup when running without a database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedWallet {
    pub currency: Currency,
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means the in-memory store is used
    pub database_url: Option<String>,
    pub network: Network,
    pub esplora_url: Option<String>,
    pub scan_interval: Duration,
    pub wallet_delay: Duration,
    pub http_timeout: Duration,
    pub seed_wallets: Vec<SeedWallet>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = lookup("NETWORK")
            .unwrap_or_else(|| "testnet".to_string())
            .parse::<Network>()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            network,
            esplora_url: lookup("ESPLORA_URL").filter(|v| !v.trim().is_empty()),
            scan_interval: Duration::from_secs(parse_interval(&lookup)?),
            wallet_delay: Duration::from_millis(parse_number(&lookup, "WALLET_DELAY_MS", 2000)?),
            http_timeout: Duration::from_secs(parse_number(&lookup, "HTTP_TIMEOUT_SECS", 30)?),
            seed_wallets: parse_seed_wallets(&lookup("SEED_WALLETS").unwrap_or_default())?,
        })
    }

    pub fn esplora(&self) -> EsploraConfig {
        EsploraConfig {
            base_url: self.esplora_url.clone(),
            timeout: self.http_timeout,
            ..EsploraConfig::new(self.network)
        }
    }

    pub fn schedule(&self) -> ScanScheduleConfig {
        ScanScheduleConfig {
            scan_interval: self.scan_interval,
            wallet_delay: self.wallet_delay,
        }
    }
}

fn parse_number<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::Message(format!("{} must be a number: {}", key, e))),
        None => Ok(default),
    }
}

/// Zero would turn the scanner into a tight loop against the upstream API
fn parse_interval<F>(lookup: &F) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_number(lookup, "SCAN_INTERVAL_SECS", 600)? {
        0 => Err(ConfigError::Message(
            "SCAN_INTERVAL_SECS must be greater than zero".to_string(),
        )),
        secs => Ok(secs),
    }
}

/// `BTC:addr1,BTC:addr2`
fn parse_seed_wallets(raw: &str) -> Result<Vec<SeedWallet>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (currency, address) = entry.split_once(':').ok_or_else(|| {
                ConfigError::Message(format!("SEED_WALLETS entry {:?} is not CURRENCY:address", entry))
            })?;
            let currency = currency
                .parse::<Currency>()
                .map_err(|e| ConfigError::Message(e.to_string()))?;
            let address = address.trim();
            if address.is_empty() {
                return Err(ConfigError::Message(format!(
                    "SEED_WALLETS entry {:?} has an empty address",
                    entry
                )));
            }
            Ok(SeedWallet {
                currency,
                address: address.to_string(),
            })
        })
        .collect()
}
