use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{ChainDataSource, ChainStats, Network, RawTx};
use crate::error::{AppError, AppResult};

/// Scripted chain data source for tests
pub struct FakeChain {
    tip: Mutex<Option<u64>>,
    history: Mutex<HashMap<String, Vec<RawTx>>>,
    stats: Mutex<HashMap<String, ChainStats>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeChain {
    pub fn new(tip: u64) -> Self {
        Self {
            tip: Mutex::new(Some(tip)),
            history: Mutex::new(HashMap::new()),
            stats: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn set_tip(&self, tip: Option<u64>) {
        *self.tip.lock().unwrap() = tip;
    }

    pub fn with_history(self, address: &str, txs: Vec<RawTx>) -> Self {
        self.history.lock().unwrap().insert(address.to_string(), txs);
        self
    }

    pub fn with_stats(self, address: &str, funded_total: u64, spent_total: u64) -> Self {
        self.stats.lock().unwrap().insert(
            address.to_string(),
            ChainStats { funded_total, spent_total },
        );
        self
    }

    /// Every call for `address` fails as if the upstream was down
    pub fn failing_for(self, address: &str) -> Self {
        self.failing.lock().unwrap().insert(address.to_string());
        self
    }

    fn check(&self, address: &str) -> AppResult<()> {
        if self.failing.lock().unwrap().contains(address) {
            return Err(AppError::UpstreamUnavailable(format!("{} unavailable", address)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainDataSource for FakeChain {
    fn network(&self) -> Network {
        Network::Testnet
    }

    async fn tip_height(&self) -> AppResult<u64> {
        self.tip
            .lock()
            .unwrap()
            .ok_or_else(|| AppError::UpstreamUnavailable("tip unavailable".into()))
    }

    async fn address_transactions(&self, address: &str) -> AppResult<Vec<RawTx>> {
        self.check(address)?;
        Ok(self.history.lock().unwrap().get(address).cloned().unwrap_or_default())
    }

    async fn address_chain_stats(&self, address: &str) -> AppResult<ChainStats> {
        self.check(address)?;
        Ok(self.stats.lock().unwrap().get(address).copied().unwrap_or_default())
    }
}
