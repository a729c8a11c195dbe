//! Smurfing detector.
//!
//! Groups each non-legitimate sender's outgoing transactions into
//! 12-hour tumbling windows aligned to wall-clock multiples of 12h,
//! and flags windows that look like a large sum fragmented into many
//! small, near-uniform transfers.

use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::config::PipelineConfig;
use crate::detectors::{Budget, DetectorOutcome, PartialReason, PatternType, Ring, RingDetail, RingIdAllocator};
use crate::profile::{is_legitimate, ProfileTable};
use crate::stats::{mean, population_stddev};
use crate::transaction::{Transaction, TransactionBatch};

const WINDOW_SECONDS: i64 = 12 * 3600;

pub fn detect(
    batch: &TransactionBatch,
    profiles: &ProfileTable,
    config: &PipelineConfig,
    budget: &Budget,
    ring_ids: &mut RingIdAllocator,
) -> DetectorOutcome {
    if budget.is_expired() {
        warn!("smurfing detector: wall-clock budget already expired at entry");
        return DetectorOutcome::partial(Vec::new(), PartialReason::BudgetExpired);
    }

    // BTreeMap keys give deterministic (sender, window) iteration order.
    let mut groups: BTreeMap<(String, i64), Vec<&Transaction>> = BTreeMap::new();
    for txn in batch.transactions() {
        if is_legitimate(profiles, &txn.from_account) {
            continue;
        }
        let window = txn.timestamp.timestamp().div_euclid(WINDOW_SECONDS);
        groups.entry((txn.from_account.clone(), window)).or_default().push(txn);
    }

    let mut rings = Vec::new();
    for ((source, _window), txns) in groups {
        if let Some(ring) = evaluate_window(profiles, config, &source, &txns, ring_ids) {
            rings.push(ring);
        }
    }

    DetectorOutcome::complete(rings)
}

fn evaluate_window(
    profiles: &ProfileTable,
    config: &PipelineConfig,
    source: &str,
    txns: &[&Transaction],
    ring_ids: &mut RingIdAllocator,
) -> Option<Ring> {
    let threshold = config.smurfing_threshold_amount;

    if txns.len() < config.smurfing_min_splits {
        return None;
    }

    let amounts: Vec<f64> = txns.iter().map(|t| t.amount).collect();
    let total: f64 = amounts.iter().sum();
    if total <= threshold {
        return None;
    }

    let avg = mean(&amounts);
    if avg >= threshold * 0.15 {
        return None;
    }

    let max_amount = amounts.iter().cloned().fold(f64::MIN, f64::max);
    if max_amount >= threshold * 0.60 {
        return None;
    }

    let mut seen_recipients = HashSet::new();
    let mut recipients = Vec::new();
    for t in txns {
        if seen_recipients.insert(t.to_account.clone()) {
            recipients.push(t.to_account.clone());
        }
    }

    let legitimate_recipients = recipients.iter().filter(|r| is_legitimate(profiles, r)).count();
    let legitimate_fraction = legitimate_recipients as f64 / recipients.len() as f64;
    if legitimate_fraction > 0.70 {
        return None;
    }

    let suspicious_score = compute_suspicious_score(&amounts, threshold);
    if suspicious_score < 0.40 {
        return None;
    }

    let mut member_accounts = Vec::with_capacity(recipients.len() + 1);
    member_accounts.push(source.to_string());
    member_accounts.extend(recipients.iter().cloned());

    Some(Ring {
        ring_id: ring_ids.allocate(),
        pattern_type: PatternType::Smurfing,
        member_accounts,
        total_amount: total,
        detail: RingDetail::Smurfing {
            source: source.to_string(),
            recipients,
            transaction_count: txns.len(),
            suspicious_score,
        },
    })
}

fn compute_suspicious_score(amounts: &[f64], threshold: f64) -> f64 {
    let avg = mean(amounts);
    let uniformity = if avg > 0.0 {
        1.0 - (population_stddev(amounts) / avg).min(1.0)
    } else {
        0.0
    };
    let below_count = amounts.iter().filter(|&&a| a < threshold * 0.1).count();
    let avoidance = below_count as f64 / amounts.len() as f64;
    uniformity * 0.6 + avoidance * 0.4
}
