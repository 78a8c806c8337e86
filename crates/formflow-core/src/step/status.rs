use serde::{Deserialize, Serialize};

/// Estado derivado de un `StepInstance`.
///
/// - `Open`: sin datos confirmados ni borrador (puede tener datos de prefill).
/// - `Draft`: datos guardados con `save_temporary`.
/// - `Completed`: datos confirmados con `complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Open,
    Draft,
    Completed,
}
