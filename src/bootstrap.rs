use std::{sync::Arc, time::Duration};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    chain::{ChainDataSource, EsploraClient},
    config::{Config, SeedWallet},
    error::AppResult,
    ledger::{InMemoryStore, PgRecordStore, RecordStore},
    reconcile::{BitcoinReconciler, ReconcilerRouter},
    scanner::ScanScheduler,
    wallet::models::Wallet,
};

/// Wire the store, chain client and reconcilers into a scheduler
pub async fn initialize_scanner(config: &Config) -> AppResult<Arc<ScanScheduler>> {
    info!("Initializing reconciler components ...");

    let store = initialize_store(config).await?;

    let esplora = EsploraClient::new(&config.esplora())?;
    info!(
        "✅ Esplora client initialized for {} ({})",
        esplora.network(),
        esplora.base_url()
    );
    let source: Arc<dyn ChainDataSource> = Arc::new(esplora);

    let mut router = ReconcilerRouter::new();
    router.register(Arc::new(BitcoinReconciler::new(source, store.clone())));
    info!(
        "🔗 Reconciler router initialized with currencies: {:?}",
        router.registered_currencies()
    );

    Ok(Arc::new(ScanScheduler::new(
        config.schedule(),
        store,
        Arc::new(router),
    )))
}

async fn initialize_store(config: &Config) -> AppResult<Arc<dyn RecordStore>> {
    match &config.database_url {
        Some(database_url) => {
            let pool = initialize_database(database_url).await?;
            let store = PgRecordStore::new(pool);
            store.run_migrations().await?;

            if !config.seed_wallets.is_empty() {
                warn!("⚠️  SEED_WALLETS ignored: wallets are managed in the database");
            }
            Ok(Arc::new(store))
        }
        None => {
            warn!("⚠️  DATABASE_URL not set - using in-memory store (state is lost on exit)");
            let store = InMemoryStore::new();
            seed_wallets(&store, &config.seed_wallets).await?;
            Ok(Arc::new(store))
        }
    }
}

async fn seed_wallets(store: &InMemoryStore, seeds: &[SeedWallet]) -> AppResult<()> {
    let owner_id = Uuid::new_v4();
    for seed in seeds {
        let wallet = store
            .register_wallet(Wallet::new(owner_id, seed.currency, seed.address.clone()))
            .await?;
        info!("✅ Tracking {} wallet {}", wallet.currency, wallet.address);
    }
    Ok(())
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    info!("📊 Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    info!("✓ Database pool configured: 5 max connections");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Network;
    use crate::wallet::models::Currency;

    fn dev_config(seed_wallets: Vec<SeedWallet>) -> Config {
        Config {
            database_url: None,
            network: Network::Testnet,
            esplora_url: Some("http://127.0.0.1:1".to_string()),
            scan_interval: Duration::from_secs(600),
            wallet_delay: Duration::ZERO,
            http_timeout: Duration::from_secs(1),
            seed_wallets,
        }
    }

    #[tokio::test]
    async fn test_in_memory_store_is_seeded() {
        let config = dev_config(vec![
            SeedWallet { currency: Currency::Btc, address: "tb1qone".into() },
            SeedWallet { currency: Currency::Btc, address: "tb1qtwo".into() },
        ]);

        let store = initialize_store(&config).await.unwrap();
        let wallets = store.list_wallets().await.unwrap();
        assert_eq!(wallets.len(), 2);
        assert_eq!(wallets[0].address, "tb1qone");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_aborts_cycle_only() {
        let config = dev_config(vec![SeedWallet {
            currency: Currency::Btc,
            address: "tb1qone".into(),
        }]);

        let scanner = initialize_scanner(&config).await.unwrap();
        let report = scanner
            .run_cycle(&tokio_util::sync::CancellationToken::new())
            .await;
        assert!(report.aborted);
    }
}
