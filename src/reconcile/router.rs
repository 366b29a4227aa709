use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::AddressReconciler;
use crate::error::{AppError, AppResult};
use crate::wallet::models::Currency;

/// Routes wallets to the reconciliation pipeline for their currency
pub struct ReconcilerRouter {
    reconcilers: HashMap<Currency, Arc<dyn AddressReconciler>>,
}

impl ReconcilerRouter {
    pub fn new() -> Self {
        Self {
            reconcilers: HashMap::new(),
        }
    }

    /// Register a pipeline under the currency it reports
    pub fn register(&mut self, reconciler: Arc<dyn AddressReconciler>) {
        let currency = reconciler.currency();
        info!("Registering reconciler for currency: {}", currency);
        self.reconcilers.insert(currency, reconciler);
    }

    pub fn get(&self, currency: Currency) -> AppResult<Arc<dyn AddressReconciler>> {
        self.reconcilers
            .get(&currency)
            .cloned()
            .ok_or(AppError::UnsupportedCurrency(currency))
    }

    pub fn registered_currencies(&self) -> Vec<Currency> {
        self.reconcilers.keys().copied().collect()
    }

    /// Current tip for every registered currency. Fails if any tip is unavailable.
    pub async fn tip_heights(&self) -> AppResult<HashMap<Currency, u64>> {
        let mut heights = HashMap::new();
        for (currency, reconciler) in &self.reconcilers {
            heights.insert(*currency, reconciler.current_height().await?);
        }
        Ok(heights)
    }
}

impl Default for ReconcilerRouter {
    fn default() -> Self {
        Self::new()
    }
}
