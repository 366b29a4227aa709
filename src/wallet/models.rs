use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// Currency of a tracked wallet; selects the reconciliation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "currency_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Btc,
    Eth,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
        }
    }

    /// Minor units per whole coin, as a power of ten
    pub fn decimals(&self) -> u32 {
        match self {
            Currency::Btc => 8,
            Currency::Eth => 18,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Currency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BTC" => Ok(Currency::Btc),
            "ETH" => Ok(Currency::Eth),
            other => Err(AppError::Config(format!("Unknown currency: {}", other))),
        }
    }
}

/// Tracked wallet. `balance` is derived from upstream chain stats and is
/// never an authoritative input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub address: String,
    pub currency: Currency,
    pub label: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl Wallet {
    pub fn new(owner_id: Uuid, currency: Currency, address: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            address,
            currency,
            label: None,
            balance: Decimal::ZERO,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "tx_direction", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Incoming => write!(f, "incoming"),
            Direction::Outgoing => write!(f, "outgoing"),
        }
    }
}

/// One persisted record per (wallet, txid).
///
/// Only `confirmations` and `timestamp` change after creation; `timestamp`
/// is only ever backfilled, never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub txid: String,
    /// Positive for net inflow, negative for net outflow, in whole coins
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub timestamp: Option<DateTime<Utc>>,
    pub direction: Direction,
    pub confirmations: u32,
}

impl Transaction {
    pub fn is_confirmed(&self) -> bool {
        self.confirmations > 0
    }
}
