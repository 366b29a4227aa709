use rust_decimal::Decimal;
use tracing::{debug, info};

use super::transaction::to_coin_amount;
use crate::chain::ChainDataSource;
use crate::error::AppResult;
use crate::ledger::RecordStore;
use crate::wallet::models::Wallet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceOutcome {
    Updated { previous: Decimal, current: Decimal },
    Unchanged(Decimal),
}

/// Recompute `wallet.balance` from upstream funded/spent totals.
///
/// The balance always mirrors the chain stats, never the sum of local
/// transaction rows. The store is written only when the value differs
/// (exact decimal comparison); `wallet` is kept in step with the store.
pub async fn update_balance(
    store: &dyn RecordStore,
    source: &dyn ChainDataSource,
    wallet: &mut Wallet,
) -> AppResult<BalanceOutcome> {
    let stats = source.address_chain_stats(&wallet.address).await?;
    let balance = to_coin_amount(stats.net(), wallet.currency)?;

    if balance == wallet.balance {
        debug!("Balance unchanged for {}: {}", wallet.address, balance);
        return Ok(BalanceOutcome::Unchanged(balance));
    }

    store.update_wallet_balance(wallet.id, balance).await?;
    let previous = std::mem::replace(&mut wallet.balance, balance);

    info!(
        "💰 Balance updated for {}: {} -> {} {}",
        wallet.address, previous, balance, wallet.currency
    );

    Ok(BalanceOutcome::Updated { previous, current: balance })
}
