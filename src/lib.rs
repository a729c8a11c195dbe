//! # Mule Ring Detector
//!
//! A money-muling fraud-ring detector over a directed transaction
//! graph.
//!
//! ## Features
//!
//! - **Circular fund-routing detection**: bounded simple-cycle
//!   enumeration over the account graph
//! - **Smurfing detection**: tumbling-window fragmentation analysis
//! - **Shell-network detection**: betweenness-centrality clustering of
//!   low-volume intermediary accounts
//! - **Legitimate-account classification**: payroll/merchant/platform
//!   accounts are excluded from pattern candidacy before detection runs
//! - **Bounded, budgeted execution**: every detector respects a shared
//!   wall-clock budget and hard result caps, never blocking a caller
//!   indefinitely

pub mod config;
pub mod detectors;
pub mod error;
pub mod graph;
pub mod profile;
pub mod report;
pub mod scoring;
pub mod stats;
pub mod transaction;

pub use config::PipelineConfig;
pub use detectors::{PatternType, Ring, RingDetail};
pub use error::MuleDetectionError;
pub use graph::{DirectedEdge, TransactionGraph};
pub use profile::{AccountProfile, LegitimateType, ProfileTable};
pub use report::{FraudRingRecord, Report, RingAggregator, Summary, SuspiciousAccount};
pub use scoring::{
    CircularComponentScores, ComponentScores, RiskLevel, ScoredRing, ShellComponentScores, SmurfingComponentScores,
};
pub use transaction::{RawTransactionRecord, Transaction, TransactionBatch};

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{error, info, warn};

use detectors::{circular, shell, smurfing, Budget, DetectorOutcome, PartialReason, RingIdAllocator};

/// Runs the full six-stage pipeline over one transaction batch: graph
/// build, profiling/classification, the three pattern detectors,
/// scoring, and report assembly.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Parses `records` into a [`TransactionBatch`], runs the pipeline,
    /// and returns the assembled [`Report`]. The only fatal error path
    /// is record parsing: once a valid batch exists, detector faults
    /// and budget expiry degrade the report rather than aborting the run.
    pub fn run(&self, records: &[RawTransactionRecord]) -> Result<Report, MuleDetectionError> {
        let batch = TransactionBatch::from_records(records)?;
        Ok(self.run_batch(&batch))
    }

    /// Same as [`Pipeline::run`] but starting from an already-parsed
    /// batch, for callers that build `Transaction` values directly.
    /// Infallible: once a batch exists, nothing past this point aborts
    /// the run, since each detector's panics are caught and contained
    /// as a [`PartialReason::Fault`].
    pub fn run_batch(&self, batch: &TransactionBatch) -> Report {
        let start = Instant::now();
        info!(transactions = batch.len(), "stage 1: building transaction graph");
        let graph = TransactionGraph::build(batch);

        info!(accounts = graph.node_count(), "stage 2: profiling accounts");
        let profiles = profile::profile_accounts(batch);

        let budget = Budget::new(self.config.budget_duration());
        let mut ring_ids = RingIdAllocator::new();
        let mut rings = Vec::new();
        let mut budget_expired = false;
        let mut detector_faults = Vec::new();

        info!("stage 3: running circular-routing detector");
        let outcome = run_contained("circular_routing", AssertUnwindSafe(|| {
            circular::detect(&graph, &profiles, &self.config, &budget, &mut ring_ids)
        }));
        absorb(outcome, "circular_routing", &mut rings, &mut budget_expired, &mut detector_faults);

        info!("stage 3: running smurfing detector");
        let outcome = run_contained("smurfing", AssertUnwindSafe(|| {
            smurfing::detect(batch, &profiles, &self.config, &budget, &mut ring_ids)
        }));
        absorb(outcome, "smurfing", &mut rings, &mut budget_expired, &mut detector_faults);

        info!("stage 3: running shell-network detector");
        let outcome = run_contained("shell_network", AssertUnwindSafe(|| {
            shell::detect(&graph, &profiles, &self.config, &budget, &mut ring_ids)
        }));
        absorb(outcome, "shell_network", &mut rings, &mut budget_expired, &mut detector_faults);

        info!(rings = rings.len(), "stage 4: scoring rings");
        let scored: Vec<ScoredRing> = rings.iter().map(scoring::score_ring).collect();

        info!("stage 5-6: aggregating rings and assembling report");
        let mut aggregator = RingAggregator::new();
        for ring in &scored {
            aggregator.add_ring(ring);
        }

        let processing_time_seconds = start.elapsed().as_secs_f64();
        aggregator.finish(graph.node_count(), processing_time_seconds, budget_expired, detector_faults)
    }
}

/// Runs one detector's closure, catching a panic and containing it as
/// a [`PartialReason::Fault`] instead of letting it unwind past the
/// pipeline. A panic in one detector never takes down the others.
fn run_contained<F>(label: &str, f: F) -> DetectorOutcome
where
    F: FnOnce() -> DetectorOutcome + panic::UnwindSafe,
{
    match panic::catch_unwind(f) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            error!(detector = label, panic = %message, "detector panicked; containing as a fault");
            DetectorOutcome::partial(Vec::new(), PartialReason::Fault)
        }
    }
}

/// Folds one detector's outcome into the pipeline's running state,
/// logging why it stopped early without turning that into an error.
fn absorb(
    outcome: DetectorOutcome,
    label: &str,
    rings: &mut Vec<Ring>,
    budget_expired: &mut bool,
    detector_faults: &mut Vec<String>,
) {
    rings.extend(outcome.rings);
    match outcome.partial {
        Some(PartialReason::BudgetExpired) => {
            *budget_expired = true;
            warn!(detector = label, "stopped early: wall-clock budget expired");
        }
        Some(PartialReason::CapReached) => {
            warn!(detector = label, "stopped early: result cap reached");
        }
        Some(PartialReason::Fault) => {
            detector_faults.push(label.to_string());
            warn!(detector = label, "stopped early: detector fault");
        }
        None => {}
    }
}
