use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chain::RawTx;
use crate::error::AppResult;
use crate::ledger::RecordStore;
use crate::wallet::models::{Currency, Direction, Transaction, Wallet};

/// What a single reconcile call did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Direction and signed minor-unit amount of `tx` relative to `address`.
///
/// Any output paying `address` makes the transaction incoming and only the
/// output value is counted; inputs are ignored in that case. Otherwise the
/// inputs funded by `address` are summed and negated.
pub fn classify(address: &str, tx: &RawTx) -> (Direction, i128) {
    let mut received: i128 = 0;
    let mut found_as_output = false;

    for output in &tx.outputs {
        if output.address.as_deref() == Some(address) {
            received += output.value as i128;
            found_as_output = true;
        }
    }

    if found_as_output {
        return (Direction::Incoming, received);
    }

    let spent: i128 = tx
        .inputs
        .iter()
        .filter(|input| input.address.as_deref() == Some(address))
        .map(|input| input.value as i128)
        .sum();

    (Direction::Outgoing, -spent)
}

/// Minor units to whole coins, exact
pub fn to_coin_amount(minor_units: i128, currency: Currency) -> AppResult<Decimal> {
    Ok(Decimal::try_from_i128_with_scale(minor_units, currency.decimals())?)
}

/// Blocks on top of and including the one containing `tx`.
/// Unconfirmed, or a tip below the block height, gives 0.
pub fn confirmations(tx: &RawTx, chain_height: u64) -> u32 {
    match tx.confirmed_height() {
        Some(block_height) if chain_height >= block_height => {
            u32::try_from(chain_height - block_height + 1).unwrap_or(u32::MAX)
        }
        _ => 0,
    }
}

/// Merge one fetched transaction into the store.
///
/// Inserts if `(wallet, txid)` is unknown. Otherwise refreshes
/// `confirmations` and backfills a missing `timestamp`, writing only when
/// something changed. At most one write per call.
pub async fn reconcile_transaction(
    store: &dyn RecordStore,
    wallet: &Wallet,
    raw: &RawTx,
    chain_height: u64,
) -> AppResult<ReconcileOutcome> {
    let confirmations = confirmations(raw, chain_height);

    if let Some(mut existing) = store.find_transaction(wallet.id, &raw.txid).await? {
        let was_confirmed = existing.is_confirmed();
        let mut changed = false;

        if existing.confirmations != confirmations {
            existing.confirmations = confirmations;
            changed = true;
        }

        if existing.timestamp.is_none() && raw.block_time.is_some() {
            existing.timestamp = raw.block_time;
            changed = true;
        }

        if !changed {
            return Ok(ReconcileOutcome::Unchanged);
        }

        store.update_transaction(&existing).await?;
        match (was_confirmed, existing.is_confirmed()) {
            (false, true) => info!("✅ Transaction {} confirmed", existing.txid),
            (true, false) => warn!("⚠️ Transaction {} no longer confirmed", existing.txid),
            _ => debug!(
                "Updated transaction {}: {} confirmations",
                existing.txid, existing.confirmations
            ),
        }
        return Ok(ReconcileOutcome::Updated);
    }

    let (direction, minor_units) = classify(&wallet.address, raw);
    let amount = to_coin_amount(minor_units, wallet.currency)?;

    let tx = Transaction {
        id: Uuid::new_v4(),
        wallet_id: wallet.id,
        txid: raw.txid.clone(),
        amount,
        timestamp: raw.block_time,
        direction,
        confirmations,
    };

    store.insert_transaction(&tx).await?;
    info!(
        "➕ Inserted new transaction: {} ({} {} {})",
        tx.txid, tx.direction, tx.amount, wallet.currency
    );

    Ok(ReconcileOutcome::Inserted)
}
