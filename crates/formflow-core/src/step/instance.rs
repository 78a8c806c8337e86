use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::StepStatus;

/// Una visita concreta a un step, propiedad exclusiva de un
/// `FormFlowInstance`. Los campos sólo se mutan a través de las operaciones
/// de la instancia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInstance {
    id: Uuid,
    step_key: String,
    order: usize,
    submission_data: Option<Value>,
    is_draft: bool,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StepInstance {
    pub(crate) fn open(step_key: impl Into<String>, order: usize, prefill: Option<Value>) -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(),
               step_key: step_key.into(),
               order,
               submission_data: prefill,
               is_draft: false,
               completed: false,
               created_at: now,
               updated_at: now }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step_key(&self) -> &str {
        &self.step_key
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn submission_data(&self) -> Option<&Value> {
        self.submission_data.as_ref()
    }

    pub fn is_draft(&self) -> bool {
        self.is_draft
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn status(&self) -> StepStatus {
        if self.is_draft {
            StepStatus::Draft
        } else if self.completed {
            StepStatus::Completed
        } else {
            StepStatus::Open
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Escribe datos confirmados (`draft = false`) o borrador (`draft = true`).
    /// Devuelve `false` si nada cambió; en ese caso no toca `updated_at`.
    pub(crate) fn write(&mut self, data: Value, draft: bool) -> bool {
        let completed = !draft || self.completed;
        let unchanged = self.submission_data.as_ref() == Some(&data) && self.is_draft == draft && self.completed == completed;
        if unchanged {
            return false;
        }
        self.submission_data = Some(data);
        self.is_draft = draft;
        self.completed = completed;
        self.updated_at = Utc::now();
        true
    }

    /// Siembra datos de prefill en un step que aún no tiene datos.
    pub(crate) fn write_prefill(&mut self, data: Value) {
        if self.submission_data.is_none() {
            self.submission_data = Some(data);
            self.updated_at = Utc::now();
        }
    }
}
