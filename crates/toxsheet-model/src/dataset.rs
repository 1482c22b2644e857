use serde::{Deserialize, Serialize};

use crate::{Observation, Substance};

/// The two record sets of the toxicology database, loaded fresh per extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub substances: Vec<Substance>,
    pub observations: Vec<Observation>,
}

impl Dataset {
    pub fn new(substances: Vec<Substance>, observations: Vec<Observation>) -> Self {
        Self {
            substances,
            observations,
        }
    }

    /// First substance row with this identifier.
    pub fn substance(&self, id: &str) -> Option<&Substance> {
        self.substances.iter().find(|s| s.id == id)
    }
}
