//! Rubric configuration.
//!
//! Loaded from a JSON file keyed by phase number:
//!
//! ```json
//! {
//!   "3": { "points": 125.0, "extra_credit": ["Castling", "EnPassant"], "extra_credit_value": 0.05 },
//!   "4": { "points": 100.0 }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use marker::types::ExtraCreditPolicy;
use serde::{Deserialize, Serialize};

use crate::context::Phase;
use crate::error::GradingError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricConfigItem {
    pub points: f64,
    #[serde(default)]
    pub extra_credit: Vec<String>,
    /// Bonus fraction per fully-passed category.
    #[serde(default)]
    pub extra_credit_value: f64,
}

impl RubricConfigItem {
    pub fn extra_credit_policy(&self) -> ExtraCreditPolicy {
        ExtraCreditPolicy::new(self.extra_credit.iter().cloned(), self.extra_credit_value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RubricConfig {
    phases: HashMap<String, RubricConfigItem>,
}

impl RubricConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GradingError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GradingError::RubricConfig(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, GradingError> {
        let config: RubricConfig = serde_json::from_str(contents)
            .map_err(|e| GradingError::RubricConfig(format!("Invalid rubric JSON: {e}")))?;
        if let Some((phase, _)) = config.phases.iter().find(|(_, item)| item.points < 0.0) {
            return Err(GradingError::RubricConfig(format!(
                "Phase {phase} has negative points"
            )));
        }
        Ok(config)
    }

    pub fn with_phase(mut self, phase: Phase, item: RubricConfigItem) -> Self {
        self.phases.insert(phase.number().to_string(), item);
        self
    }

    pub fn item(&self, phase: Phase) -> Result<&RubricConfigItem, GradingError> {
        self.phases
            .get(&phase.number().to_string())
            .ok_or_else(|| GradingError::RubricConfig(format!("No rubric configured for {phase}")))
    }
}
