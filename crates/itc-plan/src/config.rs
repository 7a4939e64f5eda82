//! Planner configuration.

use serde::{Deserialize, Serialize};

/// Parameters governing the heuristic concentration solver.
///
/// Passed explicitly into planning entry points; there is no process-global
/// planner state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Lower bound of the target Wiseman c-parameter window.
    #[serde(default = "default_c_low")]
    pub c_low: f64,
    /// Upper bound of the target Wiseman c-parameter window.
    #[serde(default = "default_c_high")]
    pub c_high: f64,
}

fn default_c_low() -> f64 {
    1.0
}

fn default_c_high() -> f64 {
    500.0
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            c_low: default_c_low(),
            c_high: default_c_high(),
        }
    }
}
