//! Per-account statistical profiling and the legitimate-account
//! classifier that suppresses payroll/merchant/platform false positives.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::stats::{amount_consistency_score, population_stddev, regularity_score};
use crate::transaction::{Transaction, TransactionBatch};

/// Classification assigned to an account by the rule-based classifier.
/// Any account that is not `None` is excluded from pattern candidacy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LegitimateType {
    Payroll,
    Merchant,
    Platform,
    None,
}

impl LegitimateType {
    pub fn is_legitimate(self) -> bool {
        !matches!(self, LegitimateType::None)
    }
}

/// Statistical fingerprint of one account's transaction activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    pub out_count: usize,
    pub in_count: usize,
    pub out_total: f64,
    pub in_total: f64,
    pub out_avg: f64,
    pub out_std: f64,
    pub in_avg: f64,
    pub in_std: f64,
    pub unique_recipients: usize,
    pub unique_senders: usize,
    pub out_concentration: f64,
    pub in_concentration: f64,
    pub out_regularity: f64,
    pub in_regularity: f64,
    pub out_amount_consistency: f64,
    pub legitimate_type: LegitimateType,
}

/// All account profiles for one run, keyed by account id.
pub type ProfileTable = HashMap<String, AccountProfile>;

/// Build a profile for every account that appears as a transaction
/// endpoint, then classify it. Rules are evaluated in order (PAYROLL,
/// MERCHANT, PLATFORM); the first match wins, otherwise NONE.
pub fn profile_accounts(batch: &TransactionBatch) -> ProfileTable {
    let mut outgoing: HashMap<&str, Vec<&Transaction>> = HashMap::new();
    let mut incoming: HashMap<&str, Vec<&Transaction>> = HashMap::new();

    for txn in batch.transactions() {
        outgoing.entry(&txn.from_account).or_default().push(txn);
        incoming.entry(&txn.to_account).or_default().push(txn);
    }

    let mut accounts: Vec<&str> = outgoing.keys().chain(incoming.keys()).copied().collect();
    accounts.sort();
    accounts.dedup();

    let mut table = ProfileTable::with_capacity(accounts.len());
    for account in accounts {
        let out_txns = outgoing.get(account).map(|v| v.as_slice()).unwrap_or(&[]);
        let in_txns = incoming.get(account).map(|v| v.as_slice()).unwrap_or(&[]);
        let profile = build_profile(out_txns, in_txns);
        table.insert(account.to_string(), profile);
    }

    table
}

fn build_profile(out_txns: &[&Transaction], in_txns: &[&Transaction]) -> AccountProfile {
    let out_count = out_txns.len();
    let in_count = in_txns.len();

    let out_amounts: Vec<f64> = out_txns.iter().map(|t| t.amount).collect();
    let in_amounts: Vec<f64> = in_txns.iter().map(|t| t.amount).collect();

    let out_total: f64 = out_amounts.iter().sum();
    let in_total: f64 = in_amounts.iter().sum();

    let out_avg = if out_count > 0 { out_total / out_count as f64 } else { 0.0 };
    let in_avg = if in_count > 0 { in_total / in_count as f64 } else { 0.0 };
    let out_std = if out_count > 0 { population_stddev(&out_amounts) } else { 0.0 };
    let in_std = if in_count > 0 { population_stddev(&in_amounts) } else { 0.0 };

    let (unique_recipients, out_concentration) = concentration(out_txns.iter().map(|t| t.to_account.as_str()));
    let (unique_senders, in_concentration) = concentration(in_txns.iter().map(|t| t.from_account.as_str()));

    let out_timestamps: Vec<_> = out_txns.iter().map(|t| t.timestamp).collect();
    let in_timestamps: Vec<_> = in_txns.iter().map(|t| t.timestamp).collect();
    let out_regularity = regularity_score(&out_timestamps);
    let in_regularity = regularity_score(&in_timestamps);
    let out_amount_consistency = amount_consistency_score(&out_amounts);

    let mut profile = AccountProfile {
        out_count,
        in_count,
        out_total,
        in_total,
        out_avg,
        out_std,
        in_avg,
        in_std,
        unique_recipients,
        unique_senders,
        out_concentration,
        in_concentration,
        out_regularity,
        in_regularity,
        out_amount_consistency,
        legitimate_type: LegitimateType::None,
    };
    profile.legitimate_type = classify(&profile);
    profile
}

/// Distinct-counterpart count and the concentration of the most
/// frequent one (count of most frequent / total count).
fn concentration<'a>(counterparts: impl Iterator<Item = &'a str>) -> (usize, f64) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for c in counterparts {
        *counts.entry(c).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return (0, 0.0);
    }
    let max_count = counts.values().copied().max().unwrap_or(0);
    (counts.len(), max_count as f64 / total as f64)
}

fn classify(profile: &AccountProfile) -> LegitimateType {
    if profile.out_count >= 5
        && profile.unique_recipients >= 5
        && profile.out_regularity > 0.6
        && profile.out_amount_consistency > 0.5
    {
        return LegitimateType::Payroll;
    }

    if profile.out_count >= 20 && profile.out_total >= 100_000.0 && profile.out_amount_consistency > 0.4 {
        return LegitimateType::Merchant;
    }

    if profile.out_count >= 10 && profile.in_count >= 10 {
        let total_volume = profile.out_total + profile.in_total;
        let ratio = profile.out_total / (profile.in_total + 1.0);
        if total_volume >= 100_000.0
            && ratio > 0.3
            && ratio < 3.0
            && profile.out_regularity.max(profile.in_regularity) > 0.5
        {
            return LegitimateType::Platform;
        }
    }

    LegitimateType::None
}

/// Convenience used by detectors: is this account excluded as legitimate?
pub fn is_legitimate(table: &ProfileTable, account: &str) -> bool {
    table
        .get(account)
        .map(|p| p.legitimate_type.is_legitimate())
        .unwrap_or(false)
}
