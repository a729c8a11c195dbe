//! Circular fund-routing detector.
//!
//! Enumerates simple directed cycles bounded by `min_cycle_length` and
//! `max_cycle_length`, starting from at most [`K_START`] source
//! vertices in node-insertion order, capped at [`K_TOTAL`] emitted
//! rings, under the shared wall-clock [`Budget`]. Rotational
//! duplicates (same cycle, different starting vertex) are suppressed
//! by keying on the sorted member set.

use std::collections::HashSet;

use tracing::warn;

use crate::config::PipelineConfig;
use crate::detectors::{Budget, DetectorOutcome, PartialReason, PatternType, Ring, RingDetail, RingIdAllocator};
use crate::graph::TransactionGraph;
use crate::profile::{is_legitimate, ProfileTable};

/// At most this many source vertices are tried, in node-insertion order.
pub const K_START: usize = 100;
/// Hard cap on the number of cycles returned, regardless of budget.
pub const K_TOTAL: usize = 1000;

pub fn detect(
    graph: &TransactionGraph,
    profiles: &ProfileTable,
    config: &PipelineConfig,
    budget: &Budget,
    ring_ids: &mut RingIdAllocator,
) -> DetectorOutcome {
    let mut rings: Vec<Ring> = Vec::new();
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut partial: Option<PartialReason> = None;

    'sources: for source in graph.nodes().iter().take(K_START) {
        if budget.is_expired() {
            partial = Some(PartialReason::BudgetExpired);
            warn!("circular-routing detector: wall-clock budget expired before source {source}");
            break 'sources;
        }

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(source.clone());
        let mut path: Vec<String> = vec![source.clone()];
        let mut cap_hit = false;

        search(
            graph,
            source,
            source,
            &mut visited,
            &mut path,
            config.min_cycle_length,
            config.max_cycle_length,
            &mut |members| {
                let mut key = members.to_vec();
                key.sort();
                if !seen.insert(key) {
                    return true;
                }
                if let Some(ring) = evaluate_cycle(graph, profiles, config, members, ring_ids) {
                    rings.push(ring);
                }
                rings.len() < K_TOTAL
            },
            &mut cap_hit,
        );

        if cap_hit || rings.len() >= K_TOTAL {
            partial = Some(PartialReason::CapReached);
            warn!("circular-routing detector: reached cap of {K_TOTAL} rings");
            break 'sources;
        }
    }

    match partial {
        Some(reason) => DetectorOutcome::partial(rings, reason),
        None => DetectorOutcome::complete(rings),
    }
}

/// Reject cycles through a legitimate account or over the amount cap,
/// then assign a ring id to whatever survives.
fn evaluate_cycle(
    graph: &TransactionGraph,
    profiles: &ProfileTable,
    config: &PipelineConfig,
    members: &[String],
    ring_ids: &mut RingIdAllocator,
) -> Option<Ring> {
    if members.iter().any(|m| is_legitimate(profiles, m)) {
        return None;
    }

    let len = members.len();
    let mut edges = Vec::with_capacity(len);
    for i in 0..len {
        let from = &members[i];
        let to = &members[(i + 1) % len];
        edges.push(graph.edge(from, to)?);
    }

    let total_amount: f64 = edges.iter().map(|e| e.avg_amount()).sum();
    if total_amount > config.circular_max_total_amount {
        return None;
    }

    let timestamps: Vec<_> = edges.iter().map(|e| e.last_timestamp).collect();
    let time_span_seconds = if timestamps.len() >= 2 {
        let max_t = *timestamps.iter().max().unwrap();
        let min_t = *timestamps.iter().min().unwrap();
        (max_t - min_t).num_seconds() as f64
    } else {
        0.0
    };

    Some(Ring {
        ring_id: ring_ids.allocate(),
        pattern_type: PatternType::CircularRouting,
        member_accounts: members.to_vec(),
        total_amount,
        detail: RingDetail::Circular {
            cycle_length: len,
            time_span_seconds,
        },
    })
}

/// Depth-bounded DFS enumerating simple cycles through `source`.
/// `on_cycle` is invoked with the cycle's member path (source first,
/// not repeated at the end) and returns whether the search should
/// continue; returning `false` stops the whole search immediately.
#[allow(clippy::too_many_arguments)]
fn search(
    graph: &TransactionGraph,
    source: &str,
    current: &str,
    visited: &mut HashSet<String>,
    path: &mut Vec<String>,
    min_len: usize,
    max_len: usize,
    on_cycle: &mut dyn FnMut(&[String]) -> bool,
    stop: &mut bool,
) {
    if *stop {
        return;
    }
    for neighbor in graph.successors(current) {
        if *stop {
            return;
        }
        if neighbor == source {
            if path.len() >= min_len && !on_cycle(path) {
                *stop = true;
                return;
            }
            continue;
        }
        if path.len() < max_len && !visited.contains(neighbor) {
            visited.insert(neighbor.clone());
            path.push(neighbor.clone());
            search(graph, source, neighbor, visited, path, min_len, max_len, on_cycle, stop);
            path.pop();
            visited.remove(neighbor);
        }
    }
}
