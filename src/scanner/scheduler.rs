// Wallet scan scheduler - periodic reconciliation over all tracked wallets
//
// Cycle:
// 1. Fetch the chain tip once per registered currency (abort cycle on failure)
// 2. Enumerate every wallet in the store
// 3. Route each wallet to its currency's reconciler, strictly one at a time
// 4. Sleep between wallets to stay under upstream rate limits

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::ledger::RecordStore;
use crate::reconcile::ReconcilerRouter;

/// Scan schedule configuration
#[derive(Debug, Clone)]
pub struct ScanScheduleConfig {
    /// Time between the start of two scan cycles. Must be non-zero.
    pub scan_interval: Duration,
    /// Pause between two consecutive wallets within a cycle
    pub wallet_delay: Duration,
}

impl Default for ScanScheduleConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(600),
            wallet_delay: Duration::from_secs(2),
        }
    }
}

/// Summary of one scan cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanCycleReport {
    pub wallets_seen: usize,
    pub reconciled: usize,
    pub failed: usize,
    /// Reconciled wallets whose stored balance changed
    pub balances_updated: usize,
    /// Wallets whose currency has no reconciler
    pub skipped: usize,
    /// Set when the cycle ended before touching any wallet
    pub aborted: bool,
    /// Set when shutdown was requested mid-cycle
    pub cancelled: bool,
}

/// Scan scheduler - drives the reconcilers on a fixed interval
pub struct ScanScheduler {
    config: ScanScheduleConfig,
    store: Arc<dyn RecordStore>,
    router: Arc<ReconcilerRouter>,
}

impl ScanScheduler {
    pub fn new(
        config: ScanScheduleConfig,
        store: Arc<dyn RecordStore>,
        router: Arc<ReconcilerRouter>,
    ) -> Self {
        Self { config, store, router }
    }

    /// Start the scan loop in the background.
    ///
    /// The first cycle runs immediately. The task ends once `shutdown` is
    /// cancelled; a wallet already being reconciled is finished first.
    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = interval(self.config.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "⏰ Wallet scanner started (interval: {:?}, wallet delay: {:?})",
            self.config.scan_interval, self.config.wallet_delay
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_cycle(&shutdown).await;
                }
            }
        }

        info!("🛑 Wallet scanner stopped");
    }

    /// Run one full scan cycle. Never fails: every error is logged and only
    /// the affected wallet (or, for the tip fetch, the cycle) is skipped.
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> ScanCycleReport {
        info!("🔄 Starting wallet scan...");
        let mut report = ScanCycleReport::default();

        let heights = match self.router.tip_heights().await {
            Ok(heights) => heights,
            Err(e) => {
                error!("❌ Failed to fetch block height: {}", e);
                report.aborted = true;
                return report;
            }
        };

        let wallets = match self.store.list_wallets().await {
            Ok(wallets) => wallets,
            Err(e) => {
                error!("❌ Failed to fetch wallets: {}", e);
                report.aborted = true;
                return report;
            }
        };

        info!("📊 Found {} wallets to scan", wallets.len());

        for (index, wallet) in wallets.iter().enumerate() {
            if index > 0 && !self.config.wallet_delay.is_zero() {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.config.wallet_delay) => {}
                }
            }
            if shutdown.is_cancelled() {
                report.cancelled = true;
                break;
            }

            report.wallets_seen += 1;
            info!("Scanning wallet: {} ({})", wallet.address, wallet.currency);

            let reconciler = match self.router.get(wallet.currency) {
                Ok(reconciler) => reconciler,
                Err(e) => {
                    warn!("⏭️ Skipping wallet {}: {}", wallet.address, e);
                    report.skipped += 1;
                    continue;
                }
            };

            let Some(height) = heights.get(&wallet.currency).copied() else {
                warn!("⏭️ No chain height for {}, skipping {}", wallet.currency, wallet.address);
                report.skipped += 1;
                continue;
            };

            match reconciler.reconcile_wallet(wallet, height).await {
                Ok(wallet_report) => {
                    report.reconciled += 1;
                    if wallet_report.balance_updated {
                        report.balances_updated += 1;
                    }
                }
                Err(e) => {
                    log_wallet_failure(&wallet.address, &e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "✓ Wallet scan complete: {} reconciled ({} balances updated), {} failed, {} skipped",
            report.reconciled, report.balances_updated, report.failed, report.skipped
        );

        report
    }
}

fn log_wallet_failure(address: &str, e: &AppError) {
    if e.is_upstream() {
        warn!("⚠️ Upstream unavailable for wallet {}, retrying next cycle: {}", address, e);
    } else {
        error!("❌ Failed to reconcile wallet {}: {}", address, e);
    }
}
