// Persisted ledger of tracked wallets and their transactions
pub mod memory;
pub mod repository;
#[cfg(test)]
pub mod testing;

pub use memory::InMemoryStore;
pub use repository::PgRecordStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppResult;
use crate::wallet::models::{Transaction, Wallet};

/// Record store backing the reconciler.
///
/// Read-your-writes consistency is assumed. There is no versioning on
/// updates, so writers outside the reconciler race with it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All tracked wallets, in store order
    async fn list_wallets(&self) -> AppResult<Vec<Wallet>>;

    /// Transaction recorded for `wallet_id` under `txid`, if any
    async fn find_transaction(&self, wallet_id: Uuid, txid: &str) -> AppResult<Option<Transaction>>;

    async fn insert_transaction(&self, tx: &Transaction) -> AppResult<()>;

    /// Persist the mutable fields (`confirmations`, `timestamp`) of an existing record
    async fn update_transaction(&self, tx: &Transaction) -> AppResult<()>;

    async fn update_wallet_balance(&self, wallet_id: Uuid, balance: Decimal) -> AppResult<()>;
}
