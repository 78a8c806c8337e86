//! Fachada `FormFlowEngine`.
//!
//! Implementa el ciclo cargar -> mutar -> persistir sobre los repositorios:
//! cada operación carga un snapshot de la instancia, aplica la operación en
//! memoria y sólo si tuvo éxito guarda el snapshot y agrega los eventos.
//! Serializar operaciones concurrentes sobre una misma instancia es
//! responsabilidad del caller.

use serde_json::Value;
use uuid::Uuid;

use super::instance::WriteReport;
use super::{FlowCtx, FormFlowInstance};
use crate::definition::FormFlowDefinition;
use crate::errors::FormFlowError;
use crate::event::{EventStore, FormFlowEvent, FormFlowEventKind, InMemoryEventStore};
use crate::expression::ExpressionEvaluator;
use crate::merge::TreeMerger;
use crate::repo::{DefinitionRepository, DefinitionVersion, InMemoryDefinitionRepository, InMemoryInstanceRepository,
                  InstanceRepository};
use crate::step::StepInstance;

pub struct FormFlowEngine<D, I, E, X>
    where D: DefinitionRepository,
          I: InstanceRepository,
          E: EventStore,
          X: ExpressionEvaluator
{
    definitions: D,
    instances: I,
    event_store: E,
    evaluator: X,
    merger: TreeMerger,
}

impl<X: ExpressionEvaluator> FormFlowEngine<InMemoryDefinitionRepository, InMemoryInstanceRepository, InMemoryEventStore, X> {
    /// Engine con stores en memoria.
    pub fn in_memory(evaluator: X) -> Self {
        Self::new_with_stores(InMemoryDefinitionRepository::new(),
                              InMemoryInstanceRepository::new(),
                              InMemoryEventStore::default(),
                              evaluator)
    }

    /// Registra una definición en el store en memoria.
    pub fn register_definition(&mut self, definition: FormFlowDefinition) -> Result<(), FormFlowError> {
        self.definitions.register(definition)
    }
}

impl<D, I, E, X> FormFlowEngine<D, I, E, X>
    where D: DefinitionRepository,
          I: InstanceRepository,
          E: EventStore,
          X: ExpressionEvaluator
{
    pub fn new_with_stores(definitions: D, instances: I, event_store: E, evaluator: X) -> Self {
        Self { definitions,
               instances,
               event_store,
               evaluator,
               merger: TreeMerger::default() }
    }

    /// Reemplaza el merger (p. ej. otros campos clave para arrays).
    pub fn with_merger(mut self, merger: TreeMerger) -> Self {
        self.merger = merger;
        self
    }

    pub fn merger(&self) -> &TreeMerger {
        &self.merger
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    pub fn instances(&self) -> &I {
        &self.instances
    }

    /// Crea y persiste una instancia nueva de la definición pedida.
    pub fn start(&mut self, key: &str, version: DefinitionVersion) -> Result<Uuid, FormFlowError> {
        let definition = self.definitions
                             .find_definition(key, version)
                             .ok_or_else(|| FormFlowError::DefinitionNotFound(format!("{key}:{version}")))?;
        let ctx = FlowCtx::new(&definition, &self.evaluator, &self.merger);
        let instance = FormFlowInstance::start(&ctx)?;
        let first = instance.current_step()?;
        let kind = FormFlowEventKind::InstanceStarted { definition_id: definition.id().clone(),
                                                        definition_hash: definition.definition_hash().to_string(),
                                                        step_instance_id: first.id(),
                                                        step_key: first.step_key().to_string() };
        self.instances.save(&instance);
        self.event_store.append_kind(instance.id(), kind);
        Ok(instance.id())
    }

    pub fn load(&self, instance_id: Uuid) -> Result<FormFlowInstance, FormFlowError> {
        self.instances.load(instance_id).ok_or(FormFlowError::InstanceNotFound(instance_id))
    }

    pub fn current_step(&self, instance_id: Uuid) -> Result<StepInstance, FormFlowError> {
        self.load(instance_id)?.current_step().cloned()
    }

    pub fn history(&self, instance_id: Uuid) -> Result<Vec<StepInstance>, FormFlowError> {
        Ok(self.load(instance_id)?.history().to_vec())
    }

    pub fn submission_data_context(&self, instance_id: Uuid) -> Result<Value, FormFlowError> {
        Ok(self.load(instance_id)?.submission_data_context(&self.merger))
    }

    pub fn complete(&mut self,
                    instance_id: Uuid,
                    step_instance_id: Uuid,
                    data: Value)
                    -> Result<Option<Uuid>, FormFlowError> {
        let mut instance = self.load(instance_id)?;
        let definition = self.definition_for(&instance)?;
        let ctx = FlowCtx::new(&definition, &self.evaluator, &self.merger);
        let report = instance.complete_reporting(&ctx, step_instance_id, data)?;

        self.instances.save(&instance);
        self.append_invalidation(instance_id, &report);
        self.event_store.append_kind(instance_id,
                                     FormFlowEventKind::StepCompleted { step_instance_id: report.step_instance_id,
                                                                        step_key: report.step_key.clone(),
                                                                        order: report.order,
                                                                        next_step_instance_id: report.next });
        if report.next.is_none() {
            self.event_store.append_kind(instance_id, FormFlowEventKind::InstanceCompleted);
        }
        Ok(report.next)
    }

    pub fn save_temporary(&mut self, instance_id: Uuid, data: Value) -> Result<(), FormFlowError> {
        let mut instance = self.load(instance_id)?;
        let definition = self.definition_for(&instance)?;
        let ctx = FlowCtx::new(&definition, &self.evaluator, &self.merger);
        let report = instance.save_temporary_reporting(&ctx, data)?;

        self.instances.save(&instance);
        self.append_invalidation(instance_id, &report);
        self.event_store.append_kind(instance_id,
                                     FormFlowEventKind::StepSavedAsDraft { step_instance_id: report.step_instance_id,
                                                                           step_key: report.step_key,
                                                                           order: report.order });
        Ok(())
    }

    pub fn back(&mut self, instance_id: Uuid) -> Result<StepInstance, FormFlowError> {
        let mut instance = self.load(instance_id)?;
        let previous = instance.back()?.clone();
        self.instances.save(&instance);
        self.event_store.append_kind(instance_id,
                                     FormFlowEventKind::StepReopened { step_instance_id: previous.id(),
                                                                       step_key: previous.step_key().to_string(),
                                                                       order: previous.order() });
        Ok(previous)
    }

    pub fn events_for(&self, instance_id: Uuid) -> Vec<FormFlowEvent> {
        self.event_store.list(instance_id)
    }

    fn definition_for(&self, instance: &FormFlowInstance) -> Result<FormFlowDefinition, FormFlowError> {
        let id = instance.definition_id();
        self.definitions
            .find_definition(&id.key, DefinitionVersion::Exact(id.version))
            .ok_or_else(|| FormFlowError::DefinitionNotFound(id.to_string()))
    }

    fn append_invalidation(&mut self, instance_id: Uuid, report: &WriteReport) {
        if report.invalidated > 0 {
            self.event_store.append_kind(instance_id,
                                         FormFlowEventKind::TailInvalidated { after_order: report.order,
                                                                              removed: report.invalidated });
        }
    }
}
