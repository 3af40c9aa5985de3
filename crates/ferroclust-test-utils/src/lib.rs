//! Shared fixtures for ferroclust tests.
//!
//! The fixture world has six genes in two clusters, four conditions, and two
//! interaction networks of different total weight.

use ferroclust_common::matrix::{DataMatrix, ScoreMatrix};
use ferroclust_common::membership::ClusterMembership;
use ferroclust_network::{Network, NetworkEdge, StaticOrganism};

pub const GENES: [&str; 6] = ["G1", "G2", "G3", "G4", "G5", "G6"];
pub const CONDITIONS: [&str; 4] = ["heat", "cold", "salt", "ph"];

pub fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Six genes x four conditions of expression ratios.
pub fn expression_matrix() -> DataMatrix {
    DataMatrix::from_rows(
        names(&GENES),
        names(&CONDITIONS),
        vec![
            vec![1.2, -0.4, 0.3, 2.1],
            vec![1.0, -0.6, 0.1, 1.8],
            vec![1.4, -0.2, 0.2, 2.4],
            vec![-0.8, 1.5, -1.1, 0.2],
            vec![-1.0, 1.1, -0.9, 0.0],
            vec![0.3, 0.2, 0.4, -0.5],
        ],
    )
    .expect("fixture matrix is rectangular")
}

/// G1-G3 with heat/ph in cluster 1, G4-G5 with cold/salt in cluster 2.
/// G6 is unassigned.
pub fn membership() -> ClusterMembership {
    ClusterMembership::new(2)
        .with_row(1, "G1")
        .with_row(1, "G2")
        .with_row(1, "G3")
        .with_column(1, "heat")
        .with_column(1, "ph")
        .with_row(2, "G4")
        .with_row(2, "G5")
        .with_column(2, "cold")
        .with_column(2, "salt")
}

/// A dense network (total 12) and a sparse one (total 2).
pub fn organism() -> StaticOrganism {
    let string = Network::create(
        "string",
        vec![
            NetworkEdge::new("G1", "G2", 2.0),
            NetworkEdge::new("G2", "G3", 1.0),
            NetworkEdge::new("G4", "G5", 2.0),
            NetworkEdge::new("G3", "G6", 1.0),
        ],
    );
    let operons = Network::create("operons", vec![NetworkEdge::new("G1", "G6", 1.0)]);
    StaticOrganism::new("tst").with(string).with(operons)
}

/// Genes x clusters matrix filled from a row-major value list.
pub fn score_matrix(genes: &[&str], num_clusters: usize, values: Vec<f64>) -> ScoreMatrix {
    ScoreMatrix::for_clusters(names(genes), num_clusters)
        .with_values(values)
        .expect("value count matches genes x clusters")
}

/// Assert two matrices have the same names and elementwise-close values.
pub fn assert_matrix_close(actual: &DataMatrix, expected: &DataMatrix, tolerance: f64) {
    pretty_assertions::assert_eq!(actual.row_names(), expected.row_names());
    pretty_assertions::assert_eq!(actual.column_names(), expected.column_names());
    for (i, (a, e)) in actual.values().iter().zip(expected.values()).enumerate() {
        assert!(
            (a - e).abs() <= tolerance,
            "value {i} differs: {a} vs {e} (tolerance {tolerance})"
        );
    }
}

/// Assert two matrices have the same names and bit-identical values.
pub fn assert_matrix_identical(actual: &DataMatrix, expected: &DataMatrix) {
    pretty_assertions::assert_eq!(actual.row_names(), expected.row_names());
    pretty_assertions::assert_eq!(actual.column_names(), expected.column_names());
    let differing: Vec<usize> = actual
        .values()
        .iter()
        .zip(expected.values())
        .enumerate()
        .filter(|(_, (a, e))| a.to_bits() != e.to_bits())
        .map(|(i, _)| i)
        .collect();
    assert!(differing.is_empty(), "values differ at {differing:?}");
}
