//! Per-function activity history, kept for post-hoc audit.

use serde::{Deserialize, Serialize};

/// One entry per `compute` call: whether the schedule was active and which
/// weight applied. Serialises as `{"name", "active": [...], "scaling": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub name: String,
    pub active: Vec<bool>,
    pub scaling: Vec<f64>,
}

impl RunLog {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: Vec::new(),
            scaling: Vec::new(),
        }
    }

    pub fn log(&mut self, was_active: bool, scaling: f64) {
        self.active.push(was_active);
        self.scaling.push(scaling);
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// `(was_active, scaling)` pairs in call order.
    pub fn entries(&self) -> impl Iterator<Item = (bool, f64)> + '_ {
        self.active.iter().copied().zip(self.scaling.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_log_and_export() {
        let mut log = RunLog::new("network");
        log.log(true, 0.0);
        log.log(false, 0.25);

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries().collect::<Vec<_>>(), vec![(true, 0.0), (false, 0.25)]);
        assert_eq!(
            serde_json::to_value(&log).unwrap(),
            json!({"name": "network", "active": [true, false], "scaling": [0.0, 0.25]})
        );
    }
}
