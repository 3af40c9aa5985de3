//! Undirected, weighted gene interaction graphs.
//!
//! A `Network` stores every undirected interaction as two directed edges so
//! that edge selection by source covers both endpoints.

use std::collections::HashSet;

use ferroclust_common::error::{FerroclustError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A directed, scored edge between two genes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub source: String,
    pub target: String,
    pub score: f64,
}

impl NetworkEdge {
    pub fn new(source: &str, target: &str, score: f64) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            score,
        }
    }

    /// Same edge with source and target swapped.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            score: self.score,
        }
    }
}

/// A named interaction network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    name: String,
    edges: Vec<NetworkEdge>,
}

impl Network {
    /// Build a symmetrised network.
    ///
    /// Each `(source, target)` pair appears exactly once per direction: a
    /// one-directional input edge gets its reverse synthesised with the same
    /// score, a direction that is already present is not added twice.
    pub fn create(name: &str, edges: impl IntoIterator<Item = NetworkEdge>) -> Self {
        let mut added: HashSet<(String, String)> = HashSet::new();
        let mut network_edges = Vec::new();

        for edge in edges {
            let reverse = edge.reversed();
            if added.insert((edge.source.clone(), edge.target.clone())) {
                network_edges.push(edge);
            }
            if added.insert((reverse.source.clone(), reverse.target.clone())) {
                network_edges.push(reverse);
            }
        }

        Self {
            name: name.to_string(),
            edges: network_edges,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn edges(&self) -> &[NetworkEdge] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Sum of all edge scores.
    pub fn total_score(&self) -> f64 {
        self.edges.iter().map(|e| e.score).sum()
    }

    /// Rescale every edge so that the scores sum to `target`.
    ///
    /// A network whose total is zero cannot be rescaled and yields
    /// `DegenerateInput`; no edge is touched in that case.
    pub fn normalize_scores_to(&mut self, target: f64) -> Result<()> {
        let total = self.total_score();
        if total == target {
            return Ok(());
        }
        if total == 0.0 {
            return Err(FerroclustError::DegenerateInput(format!(
                "network '{}' has a total edge score of 0 and cannot be normalised to {}",
                self.name, target
            )));
        }
        let scale = target / total;
        for edge in &mut self.edges {
            edge.score *= scale;
        }
        debug!("Rescaled network '{}' from {} to {}", self.name, total, target);
        Ok(())
    }

    /// Edges whose source is one of `nodes`.
    pub fn edges_with_source_in(&self, nodes: &HashSet<&str>) -> Vec<&NetworkEdge> {
        self.edges
            .iter()
            .filter(|e| nodes.contains(e.source.as_str()))
            .collect()
    }
}
