//! `FormFlowInstance`: máquina de estados de una ejecución de un form flow.
//!
//! La historia es un `Vec<StepInstance>` ordenado por `order` (sin huecos) más
//! un mapa id -> índice. El puntero `current_step_instance_id` apunta al step
//! abierto; `None` significa que el flujo terminó.
//!
//! Política de invalidación al reescribir un step que no es el último de la
//! historia (tras `back`):
//! - datos iguales (igualdad estructural) -> la cola se conserva y el
//!   siguiente step existente se reutiliza;
//! - datos distintos -> toda la cola (confirmada o borrador) se descarta.
//!
//! Ninguna operación deja escrituras parciales: todo lo que puede fallar
//! (expresiones, resolución) se calcula antes de mutar.

use std::collections::HashMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::resolver::TransitionResolver;
use super::FlowCtx;
use crate::constants::{CONTEXT_VARIABLE, DATA_VARIABLE};
use crate::definition::{FormFlowDefinitionId, StepDefinition};
use crate::errors::FormFlowError;
use crate::expression::variables;
use crate::merge::TreeMerger;
use crate::step::StepInstance;

/// Resumen de una escritura, usado por el engine para emitir eventos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WriteReport {
    pub step_instance_id: Uuid,
    pub step_key: String,
    pub order: usize,
    /// Steps descartados de la cola.
    pub invalidated: usize,
    /// Siguiente step (sólo en `complete`).
    pub next: Option<Uuid>,
}

enum NextStep {
    Terminal,
    Reuse { prefill: Option<Value> },
    Open { key: String, prefill: Option<Value> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InstanceDocument", into = "InstanceDocument")]
pub struct FormFlowInstance {
    id: Uuid,
    definition_id: FormFlowDefinitionId,
    history: Vec<StepInstance>,
    current_step_instance_id: Option<Uuid>,
    index: HashMap<Uuid, usize>,
}

impl FormFlowInstance {
    /// Crea la instancia con el step inicial en `order = 0` (con su prefill).
    pub fn start(ctx: &FlowCtx<'_>) -> Result<Self, FormFlowError> {
        let definition = ctx.definition;
        let first = definition.step(definition.start_step())?;
        let prefill = prefill(ctx, first, &ctx.merger.merge_all(std::iter::empty()))?;
        let step = StepInstance::open(first.key.clone(), 0, prefill);
        let current = step.id();

        let mut instance = Self { id: Uuid::new_v4(),
                                  definition_id: definition.id().clone(),
                                  history: Vec::new(),
                                  current_step_instance_id: Some(current),
                                  index: HashMap::new() };
        instance.push(step);
        debug!("instance {} started at step '{}'", instance.id, first.key);
        Ok(instance)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn definition_id(&self) -> &FormFlowDefinitionId {
        &self.definition_id
    }

    pub fn current_step_instance_id(&self) -> Option<Uuid> {
        self.current_step_instance_id
    }

    pub fn is_terminated(&self) -> bool {
        self.current_step_instance_id.is_none()
    }

    /// El step abierto actualmente.
    pub fn current_step(&self) -> Result<&StepInstance, FormFlowError> {
        Ok(&self.history[self.current_index()?])
    }

    /// Historia completa, incluido el último step aunque siga abierto.
    pub fn history(&self) -> &[StepInstance] {
        &self.history
    }

    pub fn step_instance(&self, id: Uuid) -> Option<&StepInstance> {
        self.index.get(&id).map(|&i| &self.history[i])
    }

    /// Contexto fusionado sobre toda la historia (borradores incluidos).
    pub fn submission_data_context(&self, merger: &TreeMerger) -> Value {
        merger.merge_all(self.history.iter().map(StepInstance::submission_data))
    }

    /// Confirma los datos del step actual y avanza. Devuelve el id del nuevo
    /// step actual o `None` si el flujo terminó.
    pub fn complete(&mut self,
                    ctx: &FlowCtx<'_>,
                    step_instance_id: Uuid,
                    data: Value)
                    -> Result<Option<Uuid>, FormFlowError> {
        Ok(self.complete_reporting(ctx, step_instance_id, data)?.next)
    }

    /// Guarda un borrador en el step actual sin avanzar.
    pub fn save_temporary(&mut self, ctx: &FlowCtx<'_>, data: Value) -> Result<(), FormFlowError> {
        self.save_temporary_reporting(ctx, data).map(|_| ())
    }

    /// Mueve el puntero al step anterior. No modifica la historia.
    pub fn back(&mut self) -> Result<&StepInstance, FormFlowError> {
        let idx = self.current_index()?;
        if idx == 0 {
            return Err(FormFlowError::NoPreviousStep);
        }
        let previous = &self.history[idx - 1];
        self.current_step_instance_id = Some(previous.id());
        debug!("instance {} moved back to '{}' (order {})", self.id, previous.step_key(), previous.order());
        Ok(previous)
    }

    pub(crate) fn complete_reporting(&mut self,
                                     ctx: &FlowCtx<'_>,
                                     step_instance_id: Uuid,
                                     data: Value)
                                     -> Result<WriteReport, FormFlowError> {
        let idx = self.current_index()?;
        let current = &self.history[idx];
        if current.id() != step_instance_id {
            warn!("stale submission on instance {}: {} is not the current step {}",
                  self.id,
                  step_instance_id,
                  current.id());
            return Err(FormFlowError::StaleStep { expected: current.id(),
                                                  actual: step_instance_id });
        }
        let step_key = current.step_key().to_string();
        let step_def = ctx.definition.step(&step_key)?;

        let stored = self.transform(ctx, step_def, idx, data)?;
        let context = self.context_with(ctx.merger, idx, &stored);
        let next_key = TransitionResolver::resolve(ctx.definition, ctx.evaluator, &step_key, &context)?;
        let mut keep_tail = self.tail_survives(idx, &stored);

        let plan = match next_key {
            None => NextStep::Terminal,
            Some(key) => match self.history.get(idx + 1) {
                Some(existing) if keep_tail && existing.step_key() == key => {
                    let prefill = match existing.submission_data() {
                        Some(_) => None,
                        None => prefill(ctx, ctx.definition.step(&key)?, &context)?,
                    };
                    NextStep::Reuse { prefill }
                }
                _ => {
                    let prefill = prefill(ctx, ctx.definition.step(&key)?, &context)?;
                    NextStep::Open { key, prefill }
                }
            },
        };
        // Una cola que no coincide con el step resuelto ya no es válida.
        if !matches!(plan, NextStep::Reuse { .. }) {
            keep_tail = false;
        }

        // A partir de aquí no hay operaciones falibles.
        let invalidated = if keep_tail { 0 } else { self.truncate_after(idx) };
        self.history[idx].write(stored, false);

        let next = match plan {
            NextStep::Terminal => {
                info!("instance {} reached a terminal state after '{}'", self.id, step_key);
                None
            }
            NextStep::Reuse { prefill } => {
                let next = &mut self.history[idx + 1];
                if let Some(p) = prefill {
                    next.write_prefill(p);
                }
                debug!("instance {} resumes at existing step '{}'", self.id, next.step_key());
                Some(next.id())
            }
            NextStep::Open { key, prefill } => {
                let step = StepInstance::open(key, idx + 1, prefill);
                let id = step.id();
                debug!("instance {} opened step '{}' at order {}", self.id, step.step_key(), idx + 1);
                self.push(step);
                Some(id)
            }
        };
        self.current_step_instance_id = next;

        Ok(WriteReport { step_instance_id,
                         step_key,
                         order: idx,
                         invalidated,
                         next })
    }

    pub(crate) fn save_temporary_reporting(&mut self,
                                           ctx: &FlowCtx<'_>,
                                           data: Value)
                                           -> Result<WriteReport, FormFlowError> {
        let idx = self.current_index()?;
        let current = &self.history[idx];
        let step_key = current.step_key().to_string();
        let step_instance_id = current.id();
        let step_def = ctx.definition.step(&step_key)?;
        let stored = self.transform(ctx, step_def, idx, data)?;

        let invalidated = if self.tail_survives(idx, &stored) { 0 } else { self.truncate_after(idx) };
        self.history[idx].write(stored, true);
        debug!("instance {} saved draft for '{}'", self.id, step_key);

        Ok(WriteReport { step_instance_id,
                         step_key,
                         order: idx,
                         invalidated,
                         next: self.current_step_instance_id })
    }

    fn current_index(&self) -> Result<usize, FormFlowError> {
        let id = self.current_step_instance_id.ok_or(FormFlowError::NoCurrentStep)?;
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| FormFlowError::Internal(format!("current step {id} missing from history")))
    }

    fn push(&mut self, step: StepInstance) {
        self.index.insert(step.id(), self.history.len());
        self.history.push(step);
    }

    /// Descarta todos los steps con `order > idx`; devuelve cuántos.
    fn truncate_after(&mut self, idx: usize) -> usize {
        let removed: Vec<StepInstance> = self.history.drain(idx + 1..).collect();
        for step in &removed {
            self.index.remove(&step.id());
        }
        if !removed.is_empty() {
            warn!("instance {} invalidated {} step(s) after order {}", self.id, removed.len(), idx);
        }
        removed.len()
    }

    /// La cola sobrevive si no existe o si los datos no cambian.
    fn tail_survives(&self, idx: usize, stored: &Value) -> bool {
        idx + 1 >= self.history.len() || self.history[idx].submission_data() == Some(stored)
    }

    /// Contexto fusionado de `history[..idx]`.
    fn context_before(&self, merger: &TreeMerger, idx: usize) -> Value {
        merger.merge_all(self.history[..idx].iter().map(StepInstance::submission_data))
    }

    /// Contexto de `history[..idx]` más `data` como contribución del step `idx`.
    fn context_with(&self, merger: &TreeMerger, idx: usize, data: &Value) -> Value {
        merger.merge(&self.context_before(merger, idx), data)
    }

    fn transform(&self,
                 ctx: &FlowCtx<'_>,
                 step: &StepDefinition,
                 idx: usize,
                 data: Value)
                 -> Result<Value, FormFlowError> {
        match &step.submit_transform_expression {
            None => Ok(data),
            Some(expr) => {
                let vars = variables([(CONTEXT_VARIABLE, self.context_before(ctx.merger, idx)),
                                      (DATA_VARIABLE, data)]);
                Ok(ctx.evaluator.evaluate(expr, &vars)?)
            }
        }
    }
}

/// Datos iniciales de un step recién abierto; `null` equivale a sin datos.
fn prefill(ctx: &FlowCtx<'_>, step: &StepDefinition, context: &Value) -> Result<Option<Value>, FormFlowError> {
    let Some(expr) = &step.prefill_expression else {
        return Ok(None);
    };
    let vars = variables([(CONTEXT_VARIABLE, context.clone())]);
    match ctx.evaluator.evaluate(expr, &vars)? {
        Value::Null => Ok(None),
        v => Ok(Some(v)),
    }
}

/// Forma serializada de la instancia (sin el índice, que se reconstruye).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDocument {
    pub id: Uuid,
    pub definition_id: FormFlowDefinitionId,
    pub history: Vec<StepInstance>,
    pub current_step_instance_id: Option<Uuid>,
}

impl TryFrom<InstanceDocument> for FormFlowInstance {
    type Error = FormFlowError;

    fn try_from(doc: InstanceDocument) -> Result<Self, Self::Error> {
        let mut index = HashMap::with_capacity(doc.history.len());
        for (i, step) in doc.history.iter().enumerate() {
            if step.order() != i {
                return Err(FormFlowError::Internal(format!("history gap: step {} has order {} at position {}",
                                                           step.id(),
                                                           step.order(),
                                                           i)));
            }
            index.insert(step.id(), i);
        }
        if let Some(current) = doc.current_step_instance_id {
            if !index.contains_key(&current) {
                return Err(FormFlowError::Internal(format!("current step {current} not in history")));
            }
        }
        Ok(Self { id: doc.id,
                  definition_id: doc.definition_id,
                  history: doc.history,
                  current_step_instance_id: doc.current_step_instance_id,
                  index })
    }
}

impl From<FormFlowInstance> for InstanceDocument {
    fn from(instance: FormFlowInstance) -> Self {
        Self { id: instance.id,
               definition_id: instance.definition_id,
               history: instance.history,
               current_step_instance_id: instance.current_step_instance_id }
    }
}
