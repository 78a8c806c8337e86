//! Runner de scripts: lleva una definición a través de una lista de acciones
//! de usuario sobre un engine en memoria y devuelve el estado resultante.
//!
//! Formato del script:
//!
//! ```json
//! {"actions": [
//!   {"action": "complete", "step": "applicant", "data": {"age": 30}},
//!   {"action": "save", "data": {"employer": "ACME"}},
//!   {"action": "back"}
//! ]}
//! ```
//!
//! `step` es opcional; si está presente debe coincidir con el step actual.
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use formflow_core::{DefinitionVersion, ExpressionEvaluator, FormFlowDefinition, FormFlowEngine, FormFlowError,
                    FormFlowEvent, StepInstance, TreeMerger};

use crate::errors::CliError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Complete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<String>,
        #[serde(default = "empty_object")]
        data: Value,
    },
    Save {
        #[serde(default = "empty_object")]
        data: Value,
    },
    Back,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub actions: Vec<Action>,
}

/// Estado final tras ejecutar un script.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub instance_id: Uuid,
    pub terminated: bool,
    pub current_step: Option<String>,
    pub history: Vec<StepInstance>,
    pub context: Value,
    pub events: Vec<FormFlowEvent>,
}

pub fn load_definition(path: &Path) -> Result<FormFlowDefinition, CliError> {
    let raw = fs::read_to_string(path)?;
    Ok(FormFlowDefinition::from_json(&raw)?)
}

pub fn load_script(path: &Path) -> Result<Script, CliError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Ejecuta `script` sobre una instancia nueva de `definition`. La primera
/// acción que falla corta la ejecución.
pub fn run_script<X>(definition: FormFlowDefinition,
                     script: &Script,
                     evaluator: X,
                     merger: TreeMerger)
                     -> Result<RunReport, CliError>
    where X: ExpressionEvaluator
{
    let id = definition.id().clone();
    let mut engine = FormFlowEngine::in_memory(evaluator).with_merger(merger);
    engine.register_definition(definition)?;
    let instance_id = engine.start(&id.key, DefinitionVersion::Exact(id.version))?;
    info!("started instance {instance_id} of {id}");

    for (index, action) in script.actions.iter().enumerate() {
        let at = |source: FormFlowError| CliError::Action { index, source };
        match action {
            Action::Complete { step, data } => {
                let current = engine.current_step(instance_id).map_err(at)?;
                if let Some(expected) = step {
                    if current.step_key() != expected {
                        return Err(CliError::Script(format!("acción {index}: se esperaba el step '{expected}' pero el actual es '{}'",
                                                            current.step_key())));
                    }
                }
                engine.complete(instance_id, current.id(), data.clone()).map_err(at)?;
            }
            Action::Save { data } => engine.save_temporary(instance_id, data.clone()).map_err(at)?,
            Action::Back => {
                engine.back(instance_id).map_err(at)?;
            }
        }
    }

    let instance = engine.load(instance_id)?;
    let current_step = instance.current_step().ok().map(|s| s.step_key().to_string());
    Ok(RunReport { instance_id,
                   terminated: instance.is_terminated(),
                   current_step,
                   history: instance.history().to_vec(),
                   context: instance.submission_data_context(engine.merger()),
                   events: engine.events_for(instance_id) })
}
