//! Tipos de evento y estructura `FormFlowEvent`.
//!
//! El engine emite un evento por cada operación aplicada con éxito sobre una
//! instancia. Una operación que falla no emite nada. Los eventos son
//! informativos: el estado de la instancia vive en el `InstanceRepository`.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::definition::FormFlowDefinitionId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormFlowEventKind {
    /// Primera emisión de una instancia: fija definición y step inicial.
    InstanceStarted {
        definition_id: FormFlowDefinitionId,
        definition_hash: String,
        step_instance_id: Uuid,
        step_key: String,
    },
    StepSavedAsDraft {
        step_instance_id: Uuid,
        step_key: String,
        order: usize,
    },
    StepCompleted {
        step_instance_id: Uuid,
        step_key: String,
        order: usize,
        next_step_instance_id: Option<Uuid>,
    },
    /// Una reescritura divergente descartó `removed` steps con order mayor a
    /// `after_order`.
    TailInvalidated { after_order: usize, removed: usize },
    /// `back`: el puntero volvió a un step anterior.
    StepReopened {
        step_instance_id: Uuid,
        step_key: String,
        order: usize,
    },
    InstanceCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormFlowEvent {
    pub seq: u64, // orden de append dentro de la instancia
    pub instance_id: Uuid,
    pub kind: FormFlowEventKind,
    pub ts: DateTime<Utc>,
}
