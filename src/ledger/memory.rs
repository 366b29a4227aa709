use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use super::RecordStore;
use crate::error::{AppError, AppResult};
use crate::wallet::models::{Transaction, Wallet};

/// In-memory record store, used when no database is configured
pub struct InMemoryStore {
    // Vec keeps registration order for enumeration
    wallets: tokio::sync::RwLock<Vec<Wallet>>,
    transactions: tokio::sync::RwLock<HashMap<(Uuid, String), Transaction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            wallets: tokio::sync::RwLock::new(Vec::new()),
            transactions: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    pub async fn register_wallet(&self, wallet: Wallet) -> AppResult<Wallet> {
        let mut wallets = self.wallets.write().await;
        if wallets
            .iter()
            .any(|w| w.currency == wallet.currency && w.address == wallet.address)
        {
            return Err(AppError::Conflict(format!(
                "Wallet {} ({}) already registered",
                wallet.address, wallet.currency
            )));
        }
        wallets.push(wallet.clone());
        Ok(wallet)
    }

    #[cfg(test)]
    pub async fn get_wallet(&self, wallet_id: Uuid) -> AppResult<Wallet> {
        let wallets = self.wallets.read().await;
        wallets
            .iter()
            .find(|w| w.id == wallet_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Wallet {} not found", wallet_id)))
    }

    #[cfg(test)]
    pub async fn transactions_for_wallet(&self, wallet_id: Uuid) -> AppResult<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|t| t.wallet_id == wallet_id)
            .cloned()
            .collect())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list_wallets(&self) -> AppResult<Vec<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.clone())
    }

    async fn find_transaction(&self, wallet_id: Uuid, txid: &str) -> AppResult<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(&(wallet_id, txid.to_string())).cloned())
    }

    async fn insert_transaction(&self, tx: &Transaction) -> AppResult<()> {
        let mut transactions = self.transactions.write().await;
        let key = (tx.wallet_id, tx.txid.clone());
        if transactions.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "Transaction {} already recorded for wallet {}",
                tx.txid, tx.wallet_id
            )));
        }
        transactions.insert(key, tx.clone());
        Ok(())
    }

    async fn update_transaction(&self, tx: &Transaction) -> AppResult<()> {
        let mut transactions = self.transactions.write().await;
        let existing = transactions
            .get_mut(&(tx.wallet_id, tx.txid.clone()))
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", tx.txid)))?;

        existing.confirmations = tx.confirmations;
        existing.timestamp = tx.timestamp;
        Ok(())
    }

    async fn update_wallet_balance(&self, wallet_id: Uuid, balance: Decimal) -> AppResult<()> {
        let mut wallets = self.wallets.write().await;
        let wallet = wallets
            .iter_mut()
            .find(|w| w.id == wallet_id)
            .ok_or_else(|| AppError::NotFound(format!("Wallet {} not found", wallet_id)))?;

        wallet.balance = balance;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::models::{Currency, Direction};
    use rust_decimal_macros::dec;

    fn sample_tx(wallet_id: Uuid, txid: &str) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            wallet_id,
            txid: txid.to_string(),
            amount: dec!(0.5),
            timestamp: None,
            direction: Direction::Incoming,
            confirmations: 0,
        }
    }

    #[tokio::test]
    async fn test_wallets_enumerate_in_registration_order() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        for address in ["a1", "a2", "a3"] {
            store
                .register_wallet(Wallet::new(owner, Currency::Btc, address.to_string()))
                .await
                .unwrap();
        }

        let addresses: Vec<_> = store
            .list_wallets()
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.address)
            .collect();
        assert_eq!(addresses, vec!["a1", "a2", "a3"]);
    }

    #[tokio::test]
    async fn test_duplicate_wallet_is_a_conflict() {
        let store = InMemoryStore::new();
        store
            .register_wallet(Wallet::new(Uuid::new_v4(), Currency::Btc, "a1".to_string()))
            .await
            .unwrap();

        let err = store
            .register_wallet(Wallet::new(Uuid::new_v4(), Currency::Btc, "a1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Same address under another currency is a different wallet
        store
            .register_wallet(Wallet::new(Uuid::new_v4(), Currency::Eth, "a1".to_string()))
            .await
            .unwrap();
        assert_eq!(store.list_wallets().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryStore::new();
        let wallet_id = Uuid::new_v4();

        store.insert_transaction(&sample_tx(wallet_id, "t1")).await.unwrap();
        let err = store.insert_transaction(&sample_tx(wallet_id, "t1")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Same txid under another wallet is a distinct record
        store.insert_transaction(&sample_tx(Uuid::new_v4(), "t1")).await.unwrap();
        assert_eq!(store.transactions_for_wallet(wallet_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_only_touches_mutable_fields() {
        let store = InMemoryStore::new();
        let wallet_id = Uuid::new_v4();
        let original = sample_tx(wallet_id, "t1");
        store.insert_transaction(&original).await.unwrap();

        let mut changed = original.clone();
        changed.confirmations = 3;
        changed.amount = dec!(99);
        store.update_transaction(&changed).await.unwrap();

        let stored = store.find_transaction(wallet_id, "t1").await.unwrap().unwrap();
        assert_eq!(stored.confirmations, 3);
        assert_eq!(stored.amount, dec!(0.5));
    }

    #[tokio::test]
    async fn test_update_balance_unknown_wallet() {
        let store = InMemoryStore::new();
        let err = store
            .update_wallet_balance(Uuid::new_v4(), dec!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
