use std::collections::HashMap;

use uuid::Uuid;

use crate::engine::FormFlowInstance;

/// `load(id)` / `save(instance)` con semántica de snapshot completo: lo que se
/// carga es una copia; los cambios sólo existen tras `save`.
pub trait InstanceRepository {
    fn load(&self, id: Uuid) -> Option<FormFlowInstance>;
    fn save(&mut self, instance: &FormFlowInstance);
}

#[derive(Debug, Default)]
pub struct InMemoryInstanceRepository {
    inner: HashMap<Uuid, FormFlowInstance>,
}

impl InMemoryInstanceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl InstanceRepository for InMemoryInstanceRepository {
    fn load(&self, id: Uuid) -> Option<FormFlowInstance> {
        self.inner.get(&id).cloned()
    }

    fn save(&mut self, instance: &FormFlowInstance) {
        self.inner.insert(instance.id(), instance.clone());
    }
}
