use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{ChainDataSource, ChainStats, Network, RawTx, TxInput, TxOutput};
use crate::error::{AppError, AppResult};

const MAINNET_URL: &str = "https://blockstream.info/api";
const TESTNET_URL: &str = "https://blockstream.info/testnet/api";

/// Esplora client settings. The network is fixed for the lifetime of the client.
#[derive(Debug, Clone)]
pub struct EsploraConfig {
    pub network: Network,
    /// Overrides the public Blockstream endpoint for `network`
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl EsploraConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            base_url: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn resolved_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => match self.network {
                Network::Mainnet => MAINNET_URL.to_string(),
                Network::Testnet => TESTNET_URL.to_string(),
            },
        }
    }
}

// ---- wire format ----

#[derive(Debug, Deserialize)]
struct EsploraTx {
    txid: String,
    status: EsploraStatus,
    #[serde(default)]
    vin: Vec<EsploraVin>,
    #[serde(default)]
    vout: Vec<EsploraVout>,
}

#[derive(Debug, Deserialize)]
struct EsploraStatus {
    confirmed: bool,
    block_height: Option<u64>,
    block_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct EsploraVin {
    /// Null for coinbase inputs
    prevout: Option<EsploraVout>,
}

#[derive(Debug, Deserialize)]
struct EsploraVout {
    scriptpubkey_address: Option<String>,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct EsploraAddress {
    chain_stats: EsploraChainStats,
}

#[derive(Debug, Deserialize)]
struct EsploraChainStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

fn block_time(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.filter(|t| *t > 0)
        .and_then(|t| Utc.timestamp_opt(t, 0).single())
}

impl From<EsploraTx> for RawTx {
    fn from(tx: EsploraTx) -> Self {
        RawTx {
            txid: tx.txid,
            confirmed: tx.status.confirmed,
            block_height: tx.status.block_height,
            block_time: block_time(tx.status.block_time),
            inputs: tx
                .vin
                .into_iter()
                .filter_map(|vin| vin.prevout)
                .map(|prevout| TxInput {
                    address: prevout.scriptpubkey_address,
                    value: prevout.value,
                })
                .collect(),
            outputs: tx
                .vout
                .into_iter()
                .map(|vout| TxOutput {
                    address: vout.scriptpubkey_address,
                    value: vout.value,
                })
                .collect(),
        }
    }
}

fn parse_transactions(body: &str) -> AppResult<Vec<RawTx>> {
    let txs: Vec<EsploraTx> = serde_json::from_str(body).map_err(|e| {
        AppError::UpstreamUnavailable(format!("Failed to decode transactions: {}", e))
    })?;
    Ok(txs.into_iter().map(RawTx::from).collect())
}

fn parse_chain_stats(body: &str) -> AppResult<ChainStats> {
    let address: EsploraAddress = serde_json::from_str(body).map_err(|e| {
        AppError::UpstreamUnavailable(format!("Failed to decode address stats: {}", e))
    })?;
    Ok(ChainStats {
        funded_total: address.chain_stats.funded_txo_sum,
        spent_total: address.chain_stats.spent_txo_sum,
    })
}

fn parse_height(body: &str) -> AppResult<u64> {
    body.trim()
        .parse::<u64>()
        .map_err(|e| AppError::UpstreamUnavailable(format!("Invalid tip height {:?}: {}", body, e)))
}

/// Esplora REST client (Blockstream-compatible)
pub struct EsploraClient {
    client: Client,
    base_url: String,
    network: Network,
}

impl EsploraClient {
    pub fn new(config: &EsploraConfig) -> AppResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.resolved_base_url(),
            network: config.network,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and return the body, mapping non-2xx to `UpstreamUnavailable`
    async fn get_text(&self, path: &str) -> AppResult<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "Unexpected response from {}: {} {}",
                url,
                status,
                body.trim()
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl ChainDataSource for EsploraClient {
    fn network(&self) -> Network {
        self.network
    }

    async fn tip_height(&self) -> AppResult<u64> {
        let body = self.get_text("/blocks/tip/height").await?;
        parse_height(&body)
    }

    async fn address_transactions(&self, address: &str) -> AppResult<Vec<RawTx>> {
        let body = self.get_text(&format!("/address/{}/txs", address)).await?;
        parse_transactions(&body)
    }

    async fn address_chain_stats(&self, address: &str) -> AppResult<ChainStats> {
        let body = self.get_text(&format!("/address/{}", address)).await?;
        parse_chain_stats(&body)
    }
}
