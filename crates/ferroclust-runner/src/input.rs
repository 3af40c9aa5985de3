//! JSON run input: expression matrix, initial membership and networks.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use ferroclust_common::matrix::DataMatrix;
use ferroclust_common::membership::ClusterMembership;
use ferroclust_network::{Network, NetworkEdge, StaticOrganism};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInput {
    #[serde(default = "default_organism")]
    pub organism: String,
    pub matrix: DataMatrix,
    pub membership: MembershipInput,
    #[serde(default)]
    pub networks: Vec<NetworkInput>,
}

fn default_organism() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipInput {
    pub num_clusters: usize,
    /// cluster -> genes
    #[serde(default)]
    pub rows: BTreeMap<usize, Vec<String>>,
    /// cluster -> conditions
    #[serde(default)]
    pub columns: BTreeMap<usize, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInput {
    pub name: String,
    pub edges: Vec<NetworkEdge>,
}

impl RunInput {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading input {}", path.display()))?;
        let input: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing input {}", path.display()))?;
        input.validate()?;
        Ok(input)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.membership.num_clusters == 0 {
            anyhow::bail!("membership must declare at least one cluster");
        }
        let out_of_range = self
            .membership
            .rows
            .keys()
            .chain(self.membership.columns.keys())
            .find(|&&c| c == 0 || c > self.membership.num_clusters);
        if let Some(cluster) = out_of_range {
            anyhow::bail!(
                "cluster {cluster} is outside 1..={}",
                self.membership.num_clusters
            );
        }
        Ok(())
    }

    pub fn membership(&self) -> ClusterMembership {
        ClusterMembership::from_assignments(
            self.membership.num_clusters,
            self.membership.rows.clone(),
            self.membership.columns.clone(),
        )
    }

    /// Organism holding every input network, deduplicated on creation.
    pub fn organism(&self) -> StaticOrganism {
        self.networks
            .iter()
            .fold(StaticOrganism::new(&self.organism), |organism, input| {
                organism.with(Network::create(&input.name, input.edges.iter().cloned()))
            })
    }
}
