//! ferroclust-network — Gene interaction networks and network-based gene scores.

pub mod graph;
pub mod scores;
pub mod organism;

pub use graph::{Network, NetworkEdge};
pub use organism::{Organism, StaticOrganism};
pub use scores::compute_network_scores;
