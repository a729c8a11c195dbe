//! Ring aggregation and final report assembly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::detectors::PatternType;
use crate::scoring::ScoredRing;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuspiciousAccount {
    pub account_id: String,
    pub suspicion_score: f64,
    pub detected_patterns: Vec<PatternType>,
    pub ring_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FraudRingRecord {
    pub ring_id: String,
    pub pattern_type: PatternType,
    pub member_accounts: Vec<String>,
    pub risk_score: f64,
}

/// `budget_expired` and `detector_faults` surface the internal
/// `PartialReason`s the detectors logged, without making them errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub processing_time_seconds: f64,
    pub budget_expired: bool,
    pub detector_faults: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    pub fraud_rings: Vec<FraudRingRecord>,
    pub summary: Summary,
}

/// Accumulates ring and account records as rings arrive in detection
/// order, then emits the final sorted report.
#[derive(Debug, Default)]
pub struct RingAggregator {
    fraud_rings: Vec<FraudRingRecord>,
    accounts: Vec<SuspiciousAccount>,
    account_index: HashMap<String, usize>,
}

impl RingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ring(&mut self, ring: &ScoredRing) {
        self.fraud_rings.push(FraudRingRecord {
            ring_id: ring.ring_id.clone(),
            pattern_type: ring.pattern_type,
            member_accounts: ring.member_accounts.clone(),
            risk_score: ring.risk_score,
        });

        for member in &ring.member_accounts {
            match self.account_index.get(member) {
                Some(&idx) => {
                    let existing = &mut self.accounts[idx];
                    existing.suspicion_score = existing.suspicion_score.max(ring.risk_score);
                    if !existing.detected_patterns.contains(&ring.pattern_type) {
                        existing.detected_patterns.push(ring.pattern_type);
                    }
                }
                None => {
                    self.account_index.insert(member.clone(), self.accounts.len());
                    self.accounts.push(SuspiciousAccount {
                        account_id: member.clone(),
                        suspicion_score: ring.risk_score,
                        detected_patterns: vec![ring.pattern_type],
                        ring_id: ring.ring_id.clone(),
                    });
                }
            }
        }
    }

    /// Sorts accounts by suspicion score descending (stable on ties)
    /// and folds the accumulated lists into the final report.
    pub fn finish(
        mut self,
        total_accounts_analyzed: usize,
        processing_time_seconds: f64,
        budget_expired: bool,
        detector_faults: Vec<String>,
    ) -> Report {
        self.accounts
            .sort_by(|a, b| b.suspicion_score.partial_cmp(&a.suspicion_score).unwrap());

        let summary = Summary {
            total_accounts_analyzed,
            suspicious_accounts_flagged: self.accounts.len(),
            fraud_rings_detected: self.fraud_rings.len(),
            processing_time_seconds,
            budget_expired,
            detector_faults,
        };

        Report {
            suspicious_accounts: self.accounts,
            fraud_rings: self.fraud_rings,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(id: &str, pattern: PatternType, members: &[&str], score: f64) -> ScoredRing {
        ScoredRing {
            ring_id: id.to_string(),
            pattern_type: pattern,
            member_accounts: members.iter().map(|s| s.to_string()).collect(),
            risk_score: score,
            risk_level: crate::scoring::RiskLevel::Medium,
            component_scores: crate::scoring::ComponentScores::Circular(crate::scoring::CircularComponentScores {
                length_score: 0.0,
                amount_score: 0.0,
                time_score: 0.0,
            }),
        }
    }

    #[test]
    fn overlapping_rings_keep_max_score_and_dedup_patterns() {
        let mut agg = RingAggregator::new();
        agg.add_ring(&ring("RING_000", PatternType::CircularRouting, &["A", "B", "C"], 40.0));
        agg.add_ring(&ring("RING_001", PatternType::Smurfing, &["A", "D"], 70.0));

        let report = agg.finish(10, 1.5, false, vec![]);
        assert_eq!(report.fraud_rings.len(), 2);
        let a = report.suspicious_accounts.iter().find(|s| s.account_id == "A").unwrap();
        assert_eq!(a.suspicion_score, 70.0);
        assert_eq!(a.ring_id, "RING_000");
        assert_eq!(a.detected_patterns, vec![PatternType::CircularRouting, PatternType::Smurfing]);
    }

    #[test]
    fn accounts_sorted_descending_by_suspicion_score() {
        let mut agg = RingAggregator::new();
        agg.add_ring(&ring("RING_000", PatternType::CircularRouting, &["LOW"], 10.0));
        agg.add_ring(&ring("RING_001", PatternType::ShellNetwork, &["HIGH"], 90.0));

        let report = agg.finish(5, 0.2, false, vec![]);
        let scores: Vec<f64> = report.suspicious_accounts.iter().map(|s| s.suspicion_score).collect();
        assert_eq!(scores, vec![90.0, 10.0]);
    }

    #[test]
    fn every_ring_id_appears_on_both_sides() {
        let mut agg = RingAggregator::new();
        agg.add_ring(&ring("RING_000", PatternType::CircularRouting, &["A", "B"], 55.0));

        let report = agg.finish(2, 0.1, false, vec![]);
        let ring_ids_in_rings: std::collections::HashSet<_> = report.fraud_rings.iter().map(|r| r.ring_id.clone()).collect();
        let ring_ids_in_accounts: std::collections::HashSet<_> =
            report.suspicious_accounts.iter().map(|a| a.ring_id.clone()).collect();
        assert_eq!(ring_ids_in_rings, ring_ids_in_accounts);
        assert_eq!(report.summary.fraud_rings_detected, 1);
        assert_eq!(report.summary.suspicious_accounts_flagged, 2);
    }
}
