use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::BigDecimal;
use sqlx::{prelude::FromRow, PgPool};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use super::RecordStore;
use crate::error::{AppError, AppResult};
use crate::wallet::models::{Currency, Direction, Transaction, Wallet};

#[derive(Debug, FromRow)]
struct WalletRow {
    id: Uuid,
    owner_id: Uuid,
    address: String,
    currency: Currency,
    label: Option<String>,
    balance: BigDecimal,
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    wallet_id: Uuid,
    txid: String,
    amount: BigDecimal,
    timestamp: Option<DateTime<Utc>>,
    direction: Direction,
    confirmations: i32,
}

fn to_decimal(value: &BigDecimal) -> AppResult<Decimal> {
    Ok(Decimal::from_str(&value.to_string())?)
}

fn to_big_decimal(value: Decimal) -> AppResult<BigDecimal> {
    BigDecimal::from_str(&value.to_string())
        .map_err(|e| AppError::Internal(format!("Decimal conversion error: {}", e)))
}

impl TryFrom<WalletRow> for Wallet {
    type Error = AppError;

    fn try_from(row: WalletRow) -> AppResult<Self> {
        Ok(Wallet {
            id: row.id,
            owner_id: row.owner_id,
            address: row.address,
            currency: row.currency,
            label: row.label,
            balance: to_decimal(&row.balance)?,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> AppResult<Self> {
        Ok(Transaction {
            id: row.id,
            wallet_id: row.wallet_id,
            txid: row.txid,
            amount: to_decimal(&row.amount)?,
            timestamp: row.timestamp,
            direction: row.direction,
            confirmations: row.confirmations.max(0) as u32,
        })
    }
}

/// Postgres-backed record store
pub struct PgRecordStore {
    pub pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the wallet/transaction tables if they do not exist yet
    pub async fn run_migrations(&self) -> AppResult<()> {
        info!("🔄 Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("✓ Database schema up to date");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list_wallets(&self) -> AppResult<Vec<Wallet>> {
        let rows = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT id, owner_id, address, currency, label, balance
            FROM wallets
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Wallet::try_from).collect()
    }

    async fn find_transaction(&self, wallet_id: Uuid, txid: &str) -> AppResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, wallet_id, txid, amount, timestamp, direction, confirmations
            FROM transactions
            WHERE wallet_id = $1 AND txid = $2
            "#,
        )
        .bind(wallet_id)
        .bind(txid)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Transaction::try_from).transpose()
    }

    async fn insert_transaction(&self, tx: &Transaction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, wallet_id, txid, amount, timestamp, direction, confirmations)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(tx.id)
        .bind(tx.wallet_id)
        .bind(&tx.txid)
        .bind(to_big_decimal(tx.amount)?)
        .bind(tx.timestamp)
        .bind(tx.direction)
        .bind(i32::try_from(tx.confirmations).unwrap_or(i32::MAX))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_transaction(&self, tx: &Transaction) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET confirmations = $3, timestamp = $4, updated_at = NOW()
            WHERE wallet_id = $1 AND txid = $2
            "#,
        )
        .bind(tx.wallet_id)
        .bind(&tx.txid)
        .bind(i32::try_from(tx.confirmations).unwrap_or(i32::MAX))
        .bind(tx.timestamp)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Transaction {} not found", tx.txid)));
        }

        Ok(())
    }

    async fn update_wallet_balance(&self, wallet_id: Uuid, balance: Decimal) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(wallet_id)
        .bind(to_big_decimal(balance)?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Wallet {} not found", wallet_id)));
        }

        Ok(())
    }
}
