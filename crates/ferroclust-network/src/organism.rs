//! Organism data access.
//!
//! Provides an abstraction over species-specific data sources so the network
//! scoring function can obtain interaction networks without knowing how they
//! were loaded.

use crate::graph::Network;

/// Trait for accessing organism-specific networks.
pub trait Organism: Send + Sync {
    /// Short organism code (e.g. "hsa").
    fn code(&self) -> &str;

    /// Every interaction network known for this organism.
    fn networks(&self) -> &[Network];
}

/// Organism backed by networks loaded up front.
#[derive(Debug, Clone)]
pub struct StaticOrganism {
    code: String,
    networks: Vec<Network>,
}

impl StaticOrganism {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            networks: Vec::new(),
        }
    }

    /// Add a network.
    pub fn with(mut self, network: Network) -> Self {
        self.networks.push(network);
        self
    }
}

impl Organism for StaticOrganism {
    fn code(&self) -> &str {
        &self.code
    }

    fn networks(&self) -> &[Network] {
        &self.networks
    }
}
