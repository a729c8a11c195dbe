//! The directed, per-pair-aggregated transaction graph.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transaction::TransactionBatch;

/// The aggregate of every transaction from one account to another.
/// `avg_amount` is always recomputed from `total_amount` / `count`,
/// never stored stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectedEdge {
    pub count: usize,
    pub total_amount: f64,
    /// Amounts of the contributing transactions, in insertion order.
    pub amounts: Vec<f64>,
    pub last_timestamp: DateTime<Utc>,
}

impl DirectedEdge {
    fn new(amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            total_amount: amount,
            amounts: vec![amount],
            last_timestamp: timestamp,
        }
    }

    fn add(&mut self, amount: f64, timestamp: DateTime<Utc>) {
        self.count += 1;
        self.total_amount += amount;
        self.amounts.push(amount);
        if timestamp > self.last_timestamp {
            self.last_timestamp = timestamp;
        }
    }

    pub fn avg_amount(&self) -> f64 {
        self.total_amount / self.count as f64
    }
}

/// Directed multigraph aggregated to at most one edge per ordered pair.
/// Nodes are kept in first-seen insertion order so that traversal and
/// sampling order is deterministic given the same input.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    nodes: Vec<String>,
    node_seen: HashSet<String>,
    edges: HashMap<(String, String), DirectedEdge>,
    successors: HashMap<String, Vec<String>>,
    predecessors: HashMap<String, Vec<String>>,
}

impl TransactionGraph {
    pub fn build(batch: &TransactionBatch) -> Self {
        let mut graph = Self::default();

        for txn in batch.transactions() {
            graph.touch_node(&txn.from_account);
            graph.touch_node(&txn.to_account);

            let key = (txn.from_account.clone(), txn.to_account.clone());
            match graph.edges.get_mut(&key) {
                Some(edge) => edge.add(txn.amount, txn.timestamp),
                None => {
                    graph
                        .edges
                        .insert(key, DirectedEdge::new(txn.amount, txn.timestamp));
                    graph
                        .successors
                        .entry(txn.from_account.clone())
                        .or_default()
                        .push(txn.to_account.clone());
                    graph
                        .predecessors
                        .entry(txn.to_account.clone())
                        .or_default()
                        .push(txn.from_account.clone());
                }
            }
        }

        graph
    }

    fn touch_node(&mut self, account: &str) {
        if self.node_seen.insert(account.to_string()) {
            self.nodes.push(account.to_string());
        }
    }

    /// Nodes in first-seen insertion order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&DirectedEdge> {
        self.edges
            .get(&(from.to_string(), to.to_string()))
    }

    pub fn successors(&self, account: &str) -> &[String] {
        self.successors
            .get(account)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn predecessors(&self, account: &str) -> &[String] {
        self.predecessors
            .get(account)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Count of distinct neighbors in either direction (self excluded
    /// from its own neighbor set, even for self-loops).
    pub fn undirected_degree(&self, account: &str) -> usize {
        let mut neighbors: HashSet<&str> = HashSet::new();
        for n in self.successors(account) {
            if n != account {
                neighbors.insert(n.as_str());
            }
        }
        for n in self.predecessors(account) {
            if n != account {
                neighbors.insert(n.as_str());
            }
        }
        neighbors.len()
    }

    pub fn contains_node(&self, account: &str) -> bool {
        self.node_seen.contains(account)
    }
}
