use serde::{Deserialize, Serialize};

/// Estado de un paso visto desde la sesión (para indicadores de progreso).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
    /// Saltado por una bifurcación.
    Skipped,
}
