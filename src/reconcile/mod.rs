// Address reconciliation: fetch history, merge transactions, refresh balance
pub mod balance;
pub mod router;
pub mod transaction;

pub use router::ReconcilerRouter;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::chain::ChainDataSource;
use crate::error::{AppError, AppResult};
use crate::ledger::RecordStore;
use crate::wallet::models::{Currency, Wallet};
use balance::BalanceOutcome;
use transaction::ReconcileOutcome;

/// Result of reconciling one wallet in one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletScanReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Transactions skipped because the store rejected them
    pub failed: usize,
    pub balance_updated: bool,
}

impl WalletScanReport {
    fn record(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Inserted => self.inserted += 1,
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Reconciliation pipeline for one currency
#[async_trait]
pub trait AddressReconciler: Send + Sync {
    fn currency(&self) -> Currency;

    /// Chain tip for this currency's network
    async fn current_height(&self) -> AppResult<u64>;

    /// Reconcile every fetched transaction for `wallet`, then its balance
    async fn reconcile_wallet(&self, wallet: &Wallet, chain_height: u64) -> AppResult<WalletScanReport>;
}

/// UTXO-style pipeline backed by an Esplora-compatible source
pub struct BitcoinReconciler {
    source: Arc<dyn ChainDataSource>,
    store: Arc<dyn RecordStore>,
}

impl BitcoinReconciler {
    pub fn new(source: Arc<dyn ChainDataSource>, store: Arc<dyn RecordStore>) -> Self {
        Self { source, store }
    }
}

#[async_trait]
impl AddressReconciler for BitcoinReconciler {
    fn currency(&self) -> Currency {
        Currency::Btc
    }

    async fn current_height(&self) -> AppResult<u64> {
        self.source.tip_height().await
    }

    #[instrument(skip(self, wallet), fields(wallet_id = %wallet.id, address = %wallet.address))]
    async fn reconcile_wallet(&self, wallet: &Wallet, chain_height: u64) -> AppResult<WalletScanReport> {
        if wallet.currency != self.currency() {
            return Err(AppError::UnsupportedCurrency(wallet.currency));
        }

        let txs = self.source.address_transactions(&wallet.address).await?;
        info!("📥 Fetched {} transactions for {}", txs.len(), wallet.address);

        let mut report = WalletScanReport::default();

        for raw in &txs {
            match transaction::reconcile_transaction(self.store.as_ref(), wallet, raw, chain_height).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!("❌ Failed to reconcile tx {}: {}", raw.txid, e);
                    report.failed += 1;
                }
            }
        }

        let mut wallet = wallet.clone();
        let outcome = balance::update_balance(self.store.as_ref(), self.source.as_ref(), &mut wallet).await?;
        report.balance_updated = matches!(outcome, BalanceOutcome::Updated { .. });

        info!(
            "✓ Reconciled {}: {} new, {} updated, {} unchanged, {} failed",
            wallet.address, report.inserted, report.updated, report.unchanged, report.failed
        );

        Ok(report)
    }
}
