//! Read access to the current cluster membership.
//!
//! The scoring layer never mutates membership; the driver updates it between
//! iterations and hands a shared reference to every `compute` call.

use std::collections::{BTreeMap, BTreeSet};

/// Read-only view of which rows (genes) and columns (conditions) belong to
/// each cluster. Clusters are numbered `1..=num_clusters()`.
pub trait Membership: Send + Sync {
    fn num_clusters(&self) -> usize;

    /// Gene names assigned to `cluster`, sorted.
    fn rows_for_cluster(&self, cluster: usize) -> Vec<String>;

    /// Condition names assigned to `cluster`, sorted.
    fn columns_for_cluster(&self, cluster: usize) -> Vec<String>;
}

// ── In-memory Implementation ─────────────────────────────────────────────────

/// Plain in-memory membership, used by the runner and by tests.
#[derive(Debug, Clone, Default)]
pub struct ClusterMembership {
    num_clusters: usize,
    rows: BTreeMap<usize, BTreeSet<String>>,
    columns: BTreeMap<usize, BTreeSet<String>>,
}

impl ClusterMembership {
    pub fn new(num_clusters: usize) -> Self {
        Self {
            num_clusters,
            rows: BTreeMap::new(),
            columns: BTreeMap::new(),
        }
    }

    /// Assign a gene to a cluster.
    pub fn with_row(mut self, cluster: usize, gene: &str) -> Self {
        self.rows.entry(cluster).or_default().insert(gene.to_string());
        self
    }

    /// Assign a condition to a cluster.
    pub fn with_column(mut self, cluster: usize, condition: &str) -> Self {
        self.columns.entry(cluster).or_default().insert(condition.to_string());
        self
    }

    /// Build from `cluster -> genes` and `cluster -> conditions` maps.
    pub fn from_assignments(
        num_clusters: usize,
        rows: BTreeMap<usize, Vec<String>>,
        columns: BTreeMap<usize, Vec<String>>,
    ) -> Self {
        Self {
            num_clusters,
            rows: rows.into_iter().map(|(c, g)| (c, g.into_iter().collect())).collect(),
            columns: columns.into_iter().map(|(c, g)| (c, g.into_iter().collect())).collect(),
        }
    }
}

impl Membership for ClusterMembership {
    fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    fn rows_for_cluster(&self, cluster: usize) -> Vec<String> {
        self.rows
            .get(&cluster)
            .map(|genes| genes.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn columns_for_cluster(&self, cluster: usize) -> Vec<String> {
        self.columns
            .get(&cluster)
            .map(|conds| conds.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_sorted_and_unique() {
        let m = ClusterMembership::new(2)
            .with_row(1, "YFL")
            .with_row(1, "ABC")
            .with_row(1, "ABC")
            .with_column(2, "cond1");
        assert_eq!(m.rows_for_cluster(1), vec!["ABC", "YFL"]);
        assert!(m.rows_for_cluster(2).is_empty());
        assert_eq!(m.columns_for_cluster(2), vec!["cond1"]);
        assert_eq!(m.num_clusters(), 2);
    }
}
