use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::{InMemoryStore, RecordStore};
use crate::error::{AppError, AppResult};
use crate::wallet::models::{Transaction, Wallet};

/// In-memory store that counts the writes reaching it
pub struct CountingStore {
    pub inner: InMemoryStore,
    tx_writes: AtomicUsize,
    balance_writes: AtomicUsize,
    rejected_inserts: Mutex<HashSet<String>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            tx_writes: AtomicUsize::new(0),
            balance_writes: AtomicUsize::new(0),
            rejected_inserts: Mutex::new(HashSet::new()),
        }
    }

    /// Inserts of `txid` fail as if the database rejected the write
    pub fn rejecting_insert(self, txid: &str) -> Self {
        self.rejected_inserts.lock().unwrap().insert(txid.to_string());
        self
    }

    pub fn writes(&self) -> usize {
        self.tx_writes.load(Ordering::SeqCst) + self.balance_writes()
    }

    pub fn balance_writes(&self) -> usize {
        self.balance_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn list_wallets(&self) -> AppResult<Vec<Wallet>> {
        self.inner.list_wallets().await
    }

    async fn find_transaction(&self, wallet_id: Uuid, txid: &str) -> AppResult<Option<Transaction>> {
        self.inner.find_transaction(wallet_id, txid).await
    }

    async fn insert_transaction(&self, tx: &Transaction) -> AppResult<()> {
        if self.rejected_inserts.lock().unwrap().contains(&tx.txid) {
            return Err(AppError::StoreUnavailable(format!("insert of {} rejected", tx.txid)));
        }
        self.tx_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_transaction(tx).await
    }

    async fn update_transaction(&self, tx: &Transaction) -> AppResult<()> {
        self.tx_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_transaction(tx).await
    }

    async fn update_wallet_balance(&self, wallet_id: Uuid, balance: Decimal) -> AppResult<()> {
        self.balance_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_wallet_balance(wallet_id, balance).await
    }
}
