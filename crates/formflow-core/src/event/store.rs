use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use super::{FormFlowEvent, FormFlowEventKind};

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, instance_id: Uuid, kind: FormFlowEventKind) -> FormFlowEvent;
    /// Lista eventos de una instancia (orden ascendente por seq).
    fn list(&self, instance_id: Uuid) -> Vec<FormFlowEvent>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<FormFlowEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, instance_id: Uuid, kind: FormFlowEventKind) -> FormFlowEvent {
        let events = self.inner.entry(instance_id).or_default();
        let ev = FormFlowEvent { seq: events.len() as u64,
                                 instance_id,
                                 kind,
                                 ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, instance_id: Uuid) -> Vec<FormFlowEvent> {
        self.inner.get(&instance_id).cloned().unwrap_or_default()
    }
}
