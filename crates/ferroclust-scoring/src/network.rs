//! Network scoring function.
//!
//! Scores every gene against every cluster by its one-step connectivity to
//! the cluster's current members, summed over all networks of the organism.

use std::sync::Arc;

use ferroclust_common::config::ScoringConfig;
use ferroclust_common::error::Result;
use ferroclust_common::matrix::{DataMatrix, ScoreMatrix};
use ferroclust_network::{compute_network_scores, Network, Organism};
use tracing::{info, warn};

use crate::function::{IterationContext, LeafFunction, ScoringFunction, ScoringStrategy};
use crate::scaling::ScalingFunction;
use crate::schedule::Schedule;

pub const NETWORK_FUNCTION_ID: &str = "network";

pub struct NetworkScoring {
    organism: Arc<dyn Organism>,
    matrix: Arc<DataMatrix>,
    blend_weight: f64,
}

impl NetworkScoring {
    /// `blend_weight` multiplies every network's contribution; it is
    /// independent of the combiner's scaling ramp.
    pub fn new(organism: Arc<dyn Organism>, matrix: Arc<DataMatrix>, blend_weight: f64) -> Self {
        Self { organism, matrix, blend_weight }
    }

    /// Wrap into a leaf with the configured schedule and network ramp.
    pub fn into_function(self, config: &ScoringConfig) -> Result<ScoringFunction> {
        let schedule = Schedule::try_from(config.schedules.network)?;
        let scaling = ScalingFunction::network_from_config(config);
        Ok(LeafFunction::new(NETWORK_FUNCTION_ID, Box::new(self), schedule, Some(scaling)).into())
    }

    /// Copies of the organism's networks, each rescaled to the largest total
    /// edge score among them. Networks that cannot be rescaled are skipped.
    pub fn retrieve_networks(&self) -> Vec<Network> {
        let networks = self.organism.networks();
        let mut max_score = 0.0f64;
        for network in networks {
            info!("Network '{}' with {} edges", network.name(), network.num_edges());
            max_score = max_score.max(network.total_score());
        }

        networks
            .iter()
            .cloned()
            .filter_map(|mut network| match network.normalize_scores_to(max_score) {
                Ok(()) => Some(network),
                Err(e) => {
                    warn!("Skipping network '{}': {}", network.name(), e);
                    None
                }
            })
            .collect()
    }
}

impl ScoringStrategy for NetworkScoring {
    fn do_compute(
        &mut self,
        ctx: &IterationContext<'_>,
        _reference: Option<&ScoreMatrix>,
    ) -> Result<ScoreMatrix> {
        let genes = self.matrix.row_names();
        let num_clusters = ctx.membership.num_clusters();
        let mut result = ScoreMatrix::for_clusters(genes.to_vec(), num_clusters);

        for network in self.retrieve_networks() {
            info!("Compute scores for network '{}'", network.name());
            for cluster in 1..=num_clusters {
                let members = ctx.membership.rows_for_cluster(cluster);
                let scores = compute_network_scores(&network, &members, genes);
                for (row, gene) in genes.iter().enumerate() {
                    if let Some(score) = scores.get(gene) {
                        let current = result.get(row, cluster - 1);
                        result.set(row, cluster - 1, current + score * self.blend_weight);
                    }
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferroclust_common::membership::ClusterMembership;
    use ferroclust_network::{NetworkEdge, StaticOrganism};

    fn expression(genes: &[&str]) -> Arc<DataMatrix> {
        let rows = genes.iter().map(|g| g.to_string()).collect();
        Arc::new(DataMatrix::new(rows, vec!["c1".to_string(), "c2".to_string()]))
    }

    #[test]
    fn test_single_network_scores() {
        let organism = StaticOrganism::new("tst").with(Network::create(
            "string",
            vec![NetworkEdge::new("A", "B", 2.0), NetworkEdge::new("A", "C", 4.0)],
        ));
        let mut scoring = NetworkScoring::new(Arc::new(organism), expression(&["A", "B", "C"]), 0.5);
        let membership = ClusterMembership::new(2).with_row(1, "A");

        let result = scoring
            .do_compute(&IterationContext::new(1, &membership), None)
            .unwrap();

        assert_eq!(result.shape(), (3, 2));
        assert_eq!(result.get(0, 0), 0.0);
        assert!((result.get(1, 0) - 0.5 * -(3.0f64).ln()).abs() < 1e-12);
        assert!((result.get(2, 0) - 0.5 * -(5.0f64).ln()).abs() < 1e-12);
        // cluster 2 is empty
        assert!(result.row(1)[1] == 0.0 && result.row(2)[1] == 0.0);
    }

    #[test]
    fn test_networks_rescaled_to_max_total() {
        let strong = Network::create("strong", vec![NetworkEdge::new("A", "B", 5.0)]);
        let weak = Network::create("weak", vec![NetworkEdge::new("A", "C", 1.0)]);
        let organism = StaticOrganism::new("tst").with(strong).with(weak);
        let scoring = NetworkScoring::new(Arc::new(organism), expression(&["A", "B", "C"]), 0.5);

        let networks = scoring.retrieve_networks();
        assert_eq!(networks.len(), 2);
        assert!((networks[0].total_score() - 10.0).abs() < 1e-12);
        assert!((networks[1].total_score() - 10.0).abs() < 1e-12);
        assert!((networks[1].edges()[0].score - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_network_is_skipped() {
        let good = Network::create("good", vec![NetworkEdge::new("A", "B", 1.0)]);
        let empty = Network::create("empty", Vec::new());
        let organism = StaticOrganism::new("tst").with(empty).with(good);
        let mut scoring = NetworkScoring::new(Arc::new(organism), expression(&["A", "B"]), 0.5);

        let networks = scoring.retrieve_networks();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].name(), "good");

        let membership = ClusterMembership::new(1).with_row(1, "A");
        let result = scoring
            .do_compute(&IterationContext::new(1, &membership), None)
            .unwrap();
        assert!(result.values().iter().all(|v| v.is_finite()));
        assert!((result.get(1, 0) - 0.5 * -(2.0f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_organism_networks_untouched() {
        let organism = Arc::new(
            StaticOrganism::new("tst")
                .with(Network::create("a", vec![NetworkEdge::new("A", "B", 5.0)]))
                .with(Network::create("b", vec![NetworkEdge::new("A", "C", 1.0)])),
        );
        let scoring = NetworkScoring::new(organism.clone(), expression(&["A", "B", "C"]), 0.5);
        scoring.retrieve_networks();
        assert!((organism.networks()[1].total_score() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_into_function_uses_network_schedule() {
        let organism = StaticOrganism::new("tst");
        let f = NetworkScoring::new(Arc::new(organism), expression(&["A"]), 0.5)
            .into_function(&ScoringConfig::default())
            .unwrap();
        let ScoringFunction::Leaf(leaf) = &f else {
            panic!("network scoring is a leaf");
        };
        assert_eq!(leaf.id(), NETWORK_FUNCTION_ID);
        assert_eq!(leaf.schedule(), Schedule::new(1, 7).unwrap());
        assert_eq!(f.scaling(1501), 0.5);
    }
}
