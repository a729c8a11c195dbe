//! Input transaction records and the immutable batch they collapse into.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MuleDetectionError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single row as handed to the core by an external loader, before
/// column-alias remapping. Every field is a raw string so the loader
/// does not need to know our numeric/timestamp formats.
#[derive(Debug, Clone, Default)]
pub struct RawTransactionRecord {
    pub transaction_id: Option<String>,
    pub from_account: Option<String>,
    pub sender_id: Option<String>,
    pub to_account: Option<String>,
    pub receiver_id: Option<String>,
    pub amount: Option<String>,
    pub timestamp: Option<String>,
}

/// An immutable, validated transaction. Duplicates by `transaction_id`
/// are not deduplicated — every row that parses contributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub transaction_id: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// The transaction batch owned by a single run. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct TransactionBatch {
    transactions: Vec<Transaction>,
}

impl TransactionBatch {
    /// Remap aliased columns, parse amounts and timestamps, and fail
    /// fast on the first structural error — this runs strictly before
    /// stage 1 and never produces partial results.
    pub fn from_records(
        records: &[RawTransactionRecord],
    ) -> Result<Self, MuleDetectionError> {
        let mut transactions = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let transaction_id = record
                .transaction_id
                .clone()
                .ok_or_else(|| MuleDetectionError::MissingColumn("transaction_id".to_string()))?;

            let from_account = record
                .from_account
                .clone()
                .or_else(|| record.sender_id.clone())
                .ok_or_else(|| {
                    MuleDetectionError::MissingColumn("from_account (or sender_id)".to_string())
                })?;

            let to_account = record
                .to_account
                .clone()
                .or_else(|| record.receiver_id.clone())
                .ok_or_else(|| {
                    MuleDetectionError::MissingColumn("to_account (or receiver_id)".to_string())
                })?;

            let amount_raw = record
                .amount
                .clone()
                .ok_or_else(|| MuleDetectionError::MissingColumn("amount".to_string()))?;
            let amount: f64 = amount_raw
                .trim()
                .parse()
                .ok()
                .filter(|a: &f64| a.is_finite() && *a >= 0.0)
                .ok_or_else(|| MuleDetectionError::InvalidAmount {
                    record_index: index,
                    value: amount_raw.clone(),
                })?;

            let timestamp_raw = record
                .timestamp
                .clone()
                .ok_or_else(|| MuleDetectionError::MissingColumn("timestamp".to_string()))?;
            let naive = NaiveDateTime::parse_from_str(timestamp_raw.trim(), TIMESTAMP_FORMAT)
                .map_err(|_| MuleDetectionError::InvalidTimestamp {
                    record_index: index,
                    value: timestamp_raw.clone(),
                })?;
            let timestamp = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);

            transactions.push(Transaction {
                transaction_id,
                from_account,
                to_account,
                amount,
                timestamp,
            });
        }

        Ok(Self { transactions })
    }

    /// Build directly from already-parsed transactions (e.g. in tests).
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
