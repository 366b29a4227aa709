// Chain data sources - read-only view of the upstream ledger API
pub mod esplora;
#[cfg(test)]
pub mod testing;

pub use esplora::{EsploraClient, EsploraConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Network the upstream API is queried on. Selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Network {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            other => Err(AppError::Config(format!("Unknown network: {}", other))),
        }
    }
}

/// Input of a raw transaction: the address that funded it and the value spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub address: Option<String>,
    pub value: u64,
}

/// Output of a raw transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub address: Option<String>,
    pub value: u64,
}

/// Transaction summary as returned by the upstream API, values in minor units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTx {
    pub txid: String,
    pub confirmed: bool,
    pub block_height: Option<u64>,
    pub block_time: Option<DateTime<Utc>>,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl RawTx {
    /// Height of the containing block, if the transaction is mined
    pub fn confirmed_height(&self) -> Option<u64> {
        if !self.confirmed {
            return None;
        }
        self.block_height.filter(|h| *h > 0)
    }
}

/// Lifetime totals for an address, in minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainStats {
    pub funded_total: u64,
    pub spent_total: u64,
}

impl ChainStats {
    pub fn net(&self) -> i128 {
        self.funded_total as i128 - self.spent_total as i128
    }
}

/// Ledger query service. One instance targets exactly one network.
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    fn network(&self) -> Network;

    /// Height of the current chain tip
    async fn tip_height(&self) -> AppResult<u64>;

    /// Recent transactions touching `address`, one page
    async fn address_transactions(&self, address: &str) -> AppResult<Vec<RawTx>>;

    /// Aggregate funded/spent totals for `address`
    async fn address_chain_stats(&self, address: &str) -> AppResult<ChainStats>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parsing() {
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("MAINNET".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("regtest".parse::<Network>().is_err());
    }

    #[test]
    fn test_unconfirmed_has_no_height() {
        let tx = RawTx {
            txid: "aa".into(),
            confirmed: false,
            block_height: Some(100),
            block_time: None,
            inputs: vec![],
            outputs: vec![],
        };
        assert_eq!(tx.confirmed_height(), None);

        let mined = RawTx { confirmed: true, ..tx };
        assert_eq!(mined.confirmed_height(), Some(100));
    }

    #[test]
    fn test_chain_stats_net_can_be_negative() {
        let stats = ChainStats { funded_total: 10, spent_total: 25 };
        assert_eq!(stats.net(), -15);
    }
}
