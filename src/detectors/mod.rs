//! Pattern detectors. Each reads the shared graph, profile table, and
//! wall-clock budget, and appends rings through the shared
//! [`RingIdAllocator`], which the pipeline allocates from in a fixed
//! circular -> smurfing -> shell order.

pub mod circular;
pub mod shell;
pub mod smurfing;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// One of the three behavioral signals a ring was flagged for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    CircularRouting,
    Smurfing,
    ShellNetwork,
}

impl PatternType {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternType::CircularRouting => "circular_routing",
            PatternType::Smurfing => "smurfing",
            PatternType::ShellNetwork => "shell_network",
        }
    }
}

/// Pattern-specific fields a ring carries alongside its member list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RingDetail {
    Circular {
        cycle_length: usize,
        time_span_seconds: f64,
    },
    Smurfing {
        source: String,
        recipients: Vec<String>,
        transaction_count: usize,
        suspicious_score: f64,
    },
    Shell {
        avg_centrality: f64,
        total_volume: f64,
    },
}

/// One detected ring, before scoring. Rings are append-only during
/// detection and frozen before scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ring {
    pub ring_id: String,
    pub pattern_type: PatternType,
    pub member_accounts: Vec<String>,
    pub total_amount: f64,
    pub detail: RingDetail,
}

/// Append-only, monotonically increasing ring-id source shared across
/// all three detectors. Allocation order is circular -> smurfing ->
/// shell, matching the pipeline's ordering guarantee.
#[derive(Debug, Default)]
pub struct RingIdAllocator {
    next: usize,
}

impl RingIdAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn allocate(&mut self) -> String {
        let id = format!("RING_{:03}", self.next);
        self.next += 1;
        id
    }
}

/// Shared wall-clock budget for stage 3. Checked cooperatively at the
/// suspension points each detector defines in its own module.
#[derive(Debug, Clone)]
pub struct Budget {
    deadline: Instant,
}

impl Budget {
    pub fn new(limit: Duration) -> Self {
        Self {
            deadline: Instant::now() + limit,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Why a detector returned fewer results than exhaustive search would
/// have found. Never an error — budget expiry, cap limits, and
/// contained panics all degrade a run instead of aborting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialReason {
    BudgetExpired,
    CapReached,
    Fault,
}

/// Result of running one detector: the rings it accumulated, plus why
/// it stopped early if it did.
#[derive(Debug, Clone)]
pub struct DetectorOutcome {
    pub rings: Vec<Ring>,
    pub partial: Option<PartialReason>,
}

impl DetectorOutcome {
    pub fn complete(rings: Vec<Ring>) -> Self {
        Self { rings, partial: None }
    }

    pub fn partial(rings: Vec<Ring>, reason: PartialReason) -> Self {
        Self { rings, partial: Some(reason) }
    }
}
