//! Per-ring risk scoring: pattern-specific component scores in
//! `[0, 1]`, combined with fixed weights into a 0-100 `risk_score`, and
//! bucketed into a coarse [`RiskLevel`].

use serde::{Deserialize, Serialize};

use crate::detectors::{PatternType, Ring, RingDetail};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Minimal,
}

impl RiskLevel {
    /// `combined` is the pre-scaled score in `[0, 1]`.
    fn from_combined(combined: f64) -> Self {
        if combined >= 0.8 {
            RiskLevel::Critical
        } else if combined >= 0.6 {
            RiskLevel::High
        } else if combined >= 0.4 {
            RiskLevel::Medium
        } else if combined >= 0.2 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }
}

/// The three weighted inputs behind a circular-routing ring's score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CircularComponentScores {
    pub length_score: f64,
    pub amount_score: f64,
    pub time_score: f64,
}

/// The three weighted inputs behind a smurfing ring's score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SmurfingComponentScores {
    pub amount_ratio_score: f64,
    pub frequency_score: f64,
    pub uniformity_score: f64,
}

/// The three weighted inputs behind a shell-network ring's score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ShellComponentScores {
    pub size_score: f64,
    pub centrality_score: f64,
    pub volume_score: f64,
}

/// Breakdown of whichever component scores produced a ring's combined
/// score, kept for internal reporting. The wire schema ([`crate::report::FraudRingRecord`])
/// intentionally drops this and exposes only the combined `risk_score`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ComponentScores {
    Circular(CircularComponentScores),
    Smurfing(SmurfingComponentScores),
    Shell(ShellComponentScores),
}

/// A ring plus its computed score, ready for report assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRing {
    pub ring_id: String,
    pub pattern_type: PatternType,
    pub member_accounts: Vec<String>,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub component_scores: ComponentScores,
}

pub fn score_ring(ring: &Ring) -> ScoredRing {
    let (combined, component_scores) = match &ring.detail {
        RingDetail::Circular { cycle_length, time_span_seconds } => {
            let scores = score_circular(*cycle_length, ring.total_amount, *time_span_seconds);
            let combined = scores.length_score * 0.30 + scores.amount_score * 0.40 + scores.time_score * 0.30;
            (combined, ComponentScores::Circular(scores))
        }
        RingDetail::Smurfing {
            transaction_count,
            suspicious_score,
            ..
        } => {
            let scores = score_smurfing(ring.total_amount, *transaction_count, *suspicious_score);
            let combined = scores.amount_ratio_score * 0.40 + scores.frequency_score * 0.30 + scores.uniformity_score * 0.30;
            (combined, ComponentScores::Smurfing(scores))
        }
        RingDetail::Shell {
            avg_centrality,
            total_volume,
        } => {
            let scores = score_shell(ring.member_accounts.len(), *avg_centrality, *total_volume);
            let combined = scores.size_score * 0.40 + scores.centrality_score * 0.30 + scores.volume_score * 0.30;
            (combined, ComponentScores::Shell(scores))
        }
    };

    let risk_score = (combined * 100.0 * 10.0).round() / 10.0;

    ScoredRing {
        ring_id: ring.ring_id.clone(),
        pattern_type: ring.pattern_type,
        member_accounts: ring.member_accounts.clone(),
        risk_score,
        risk_level: RiskLevel::from_combined(combined),
        component_scores,
    }
}

fn score_circular(length: usize, total_amount: f64, time_span_seconds: f64) -> CircularComponentScores {
    let length_score = if length <= 4 {
        (length as f64 - 2.0) / 3.0
    } else {
        (length as f64 / 15.0).min(1.0)
    };

    let amount_score = if total_amount < 50_000.0 {
        (((50_000.0 - total_amount) / 50_000.0) * 0.8).min(0.8)
    } else {
        0.3
    };

    let hours = time_span_seconds / 3600.0;
    let time_score = if hours < 1.0 {
        0.9
    } else if hours < 24.0 {
        0.6
    } else {
        (1.0 - hours / 168.0).max(0.0)
    };

    CircularComponentScores { length_score, amount_score, time_score }
}

fn score_smurfing(total_amount: f64, transaction_count: usize, uniformity_score: f64) -> SmurfingComponentScores {
    let amount_ratio_score = if total_amount > 100_000.0 {
        (total_amount / 200_000.0).min(1.0)
    } else if total_amount > 50_000.0 {
        0.6
    } else {
        0.3
    };

    let frequency_score = if transaction_count >= 20 {
        (transaction_count as f64 / 50.0).min(1.0)
    } else if transaction_count >= 10 {
        0.6
    } else {
        0.3
    };

    SmurfingComponentScores { amount_ratio_score, frequency_score, uniformity_score }
}

fn score_shell(component_size: usize, avg_centrality: f64, total_volume: f64) -> ShellComponentScores {
    let size_score = if component_size <= 5 {
        component_size as f64 / 5.0
    } else {
        0.4
    };

    let centrality_score = if avg_centrality > 0.3 {
        (avg_centrality * 1.5).min(1.0)
    } else {
        0.2
    };

    let volume_score = if total_volume < 5_000.0 {
        0.9
    } else if total_volume < 20_000.0 {
        0.6
    } else {
        0.2
    };

    ShellComponentScores { size_score, centrality_score, volume_score }
}
