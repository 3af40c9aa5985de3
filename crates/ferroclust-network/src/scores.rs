//! Network proximity scores for one cluster.

use std::collections::{HashMap, HashSet};

use crate::graph::Network;

/// Score every gene reachable from `cluster_genes` in one step.
///
/// For each target `g` of an edge whose source is in the cluster and whose
/// target is in `all_genes`:
///
/// ```text
/// score(g) = -ln( Σ incident edge scores / |cluster_genes| + 1 )
/// ```
///
/// The divisor is the cluster size, not the number of contributing edges.
/// Genes without an incident edge are absent from the result.
pub fn compute_network_scores(
    network: &Network,
    cluster_genes: &[String],
    all_genes: &[String],
) -> HashMap<String, f64> {
    let cluster: HashSet<&str> = cluster_genes.iter().map(String::as_str).collect();
    let universe: HashSet<&str> = all_genes.iter().map(String::as_str).collect();

    let mut incident: HashMap<&str, Vec<f64>> = HashMap::new();
    for edge in network.edges_with_source_in(&cluster) {
        if universe.contains(edge.target.as_str()) {
            incident.entry(edge.target.as_str()).or_default().push(edge.score);
        }
    }

    let cluster_size = cluster.len() as f64;
    incident
        .into_iter()
        .map(|(gene, scores)| {
            let raw = scores.iter().sum::<f64>() / cluster_size;
            (gene.to_string(), -(raw + 1.0).ln())
        })
        .collect()
}
