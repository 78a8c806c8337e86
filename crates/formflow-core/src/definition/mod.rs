//! Definición inmutable y versionada de un form flow.
//!
//! Una `FormFlowDefinition` describe los steps (en orden de declaración) y
//! las transiciones, posiblemente condicionadas, entre ellos. Se valida al
//! construirse y lleva un `definition_hash` (blake3 sobre JSON canónico) que
//! identifica el grafo de forma estable.

mod builder;

pub use builder::DefinitionBuilder;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::ENGINE_VERSION;
use crate::errors::FormFlowError;
use crate::hashing::hash_value;

/// Identidad (key, version) de una definición.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormFlowDefinitionId {
    pub key: String,
    pub version: u32,
}

impl FormFlowDefinitionId {
    pub fn new(key: impl Into<String>, version: u32) -> Self {
        Self { key: key.into(),
               version }
    }
}

impl fmt::Display for FormFlowDefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.version)
    }
}

/// Transición saliente. `to = None` termina el flujo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl TransitionDefinition {
    pub fn is_unconditional(&self) -> bool {
        self.condition.is_none()
    }
}

/// Declaración de un step dentro de la definición.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefill_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_transform_expression: Option<String>,
    #[serde(default)]
    pub transitions: Vec<TransitionDefinition>,
    /// Marca explícita de fin: si ninguna transición aplica, el flujo termina
    /// en lugar de fallar con `UndefinedTransition`.
    #[serde(default)]
    pub terminal: bool,
}

impl StepDefinition {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(),
               prefill_expression: None,
               submit_transform_expression: None,
               transitions: Vec::new(),
               terminal: false }
    }

    /// Transición incondicional hacia `target`.
    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.transitions.push(TransitionDefinition { condition: None,
                                                     to: Some(target.into()) });
        self
    }

    /// Transición hacia `target` cuando `condition` es verdadera.
    pub fn when(mut self, condition: impl Into<String>, target: impl Into<String>) -> Self {
        self.transitions.push(TransitionDefinition { condition: Some(condition.into()),
                                                     to: Some(target.into()) });
        self
    }

    /// Fin del flujo cuando `condition` es verdadera.
    pub fn end_when(mut self, condition: impl Into<String>) -> Self {
        self.transitions.push(TransitionDefinition { condition: Some(condition.into()),
                                                     to: None });
        self
    }

    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn prefill(mut self, expression: impl Into<String>) -> Self {
        self.prefill_expression = Some(expression.into());
        self
    }

    pub fn submit_transform(mut self, expression: impl Into<String>) -> Self {
        self.submit_transform_expression = Some(expression.into());
        self
    }
}

/// Forma serializada de la definición (lista ordenada de steps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionDocument {
    pub key: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_step: Option<String>,
    pub steps: Vec<StepDefinition>,
}

/// Definición validada e inmutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DefinitionDocument", into = "DefinitionDocument")]
pub struct FormFlowDefinition {
    id: FormFlowDefinitionId,
    start_step: String,
    steps: IndexMap<String, StepDefinition>,
    definition_hash: String,
}

impl FormFlowDefinition {
    /// Valida y construye. `start_step = None` usa el primer step declarado.
    pub fn new(id: FormFlowDefinitionId,
               start_step: Option<String>,
               steps: Vec<StepDefinition>)
               -> Result<Self, FormFlowError> {
        if steps.is_empty() {
            return Err(FormFlowError::InvalidDefinition(format!("definition {id} has no steps")));
        }
        let mut index: IndexMap<String, StepDefinition> = IndexMap::with_capacity(steps.len());
        for step in steps {
            if index.contains_key(&step.key) {
                return Err(FormFlowError::InvalidDefinition(format!("duplicate step key '{}'", step.key)));
            }
            index.insert(step.key.clone(), step);
        }
        let start_step = match start_step {
            Some(s) => s,
            None => index.keys().next().cloned().unwrap_or_default(),
        };
        if !index.contains_key(&start_step) {
            return Err(FormFlowError::InvalidDefinition(format!("start step '{start_step}' is not declared")));
        }
        for step in index.values() {
            for target in step.transitions.iter().filter_map(|t| t.to.as_ref()) {
                if !index.contains_key(target) {
                    return Err(FormFlowError::InvalidDefinition(format!("step '{}' transitions to undeclared step '{}'",
                                                                        step.key, target)));
                }
            }
        }

        let mut def = Self { id,
                             start_step,
                             steps: index,
                             definition_hash: String::new() };
        def.definition_hash = def.compute_hash()?;
        Ok(def)
    }

    pub fn builder(key: impl Into<String>, version: u32) -> DefinitionBuilder {
        DefinitionBuilder::new(FormFlowDefinitionId::new(key, version))
    }

    /// Parsea y valida una definición desde JSON.
    pub fn from_json(raw: &str) -> Result<Self, FormFlowError> {
        serde_json::from_str(raw).map_err(|e| FormFlowError::InvalidDefinition(e.to_string()))
    }

    pub fn id(&self) -> &FormFlowDefinitionId {
        &self.id
    }

    pub fn start_step(&self) -> &str {
        &self.start_step
    }

    pub fn definition_hash(&self) -> &str {
        &self.definition_hash
    }

    pub fn step(&self, key: &str) -> Result<&StepDefinition, FormFlowError> {
        self.steps.get(key).ok_or_else(|| FormFlowError::UnknownStep(key.to_string()))
    }

    pub fn steps(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.values()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn to_document(&self) -> DefinitionDocument {
        DefinitionDocument { key: self.id.key.clone(),
                             version: self.id.version,
                             start_step: Some(self.start_step.clone()),
                             steps: self.steps.values().cloned().collect() }
    }

    fn compute_hash(&self) -> Result<String, FormFlowError> {
        let doc = serde_json::to_value(self.to_document()).map_err(|e| FormFlowError::Internal(e.to_string()))?;
        Ok(hash_value(&json!({
                          "engine_version": ENGINE_VERSION,
                          "definition": doc,
                      })))
    }
}

impl TryFrom<DefinitionDocument> for FormFlowDefinition {
    type Error = FormFlowError;

    fn try_from(doc: DefinitionDocument) -> Result<Self, Self::Error> {
        Self::new(FormFlowDefinitionId::new(doc.key, doc.version), doc.start_step, doc.steps)
    }
}

impl From<FormFlowDefinition> for DefinitionDocument {
    fn from(def: FormFlowDefinition) -> Self {
        def.to_document()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> FormFlowDefinition {
        FormFlowDefinition::builder("intake", 1).step(StepDefinition::new("a").to("b"))
                                                .step(StepDefinition::new("b").to("c"))
                                                .step(StepDefinition::new("c"))
                                                .build()
                                                .expect("valid definition")
    }

    #[test]
    fn start_step_defaults_to_first_declared() {
        let def = abc();
        assert_eq!(def.start_step(), "a");
        assert_eq!(def.len(), 3);
        assert_eq!(def.steps().map(|s| s.key.as_str()).collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn rejects_unknown_transition_target() {
        let err = FormFlowDefinition::builder("x", 1).step(StepDefinition::new("a").to("missing"))
                                                     .build()
                                                     .unwrap_err();
        assert!(matches!(err, FormFlowError::InvalidDefinition(msg) if msg.contains("missing")));
    }

    #[test]
    fn rejects_duplicate_keys_and_empty_definitions() {
        let dup = FormFlowDefinition::builder("x", 1).step(StepDefinition::new("a"))
                                                     .step(StepDefinition::new("a"))
                                                     .build();
        assert!(matches!(dup, Err(FormFlowError::InvalidDefinition(_))));
        assert!(matches!(FormFlowDefinition::builder("x", 1).build(), Err(FormFlowError::InvalidDefinition(_))));
    }

    #[test]
    fn rejects_undeclared_start_step() {
        let res = FormFlowDefinition::builder("x", 1).start_at("zzz").step(StepDefinition::new("a")).build();
        assert!(matches!(res, Err(FormFlowError::InvalidDefinition(_))));
    }

    #[test]
    fn hash_is_stable_and_sensitive_to_graph() {
        assert_eq!(abc().definition_hash(), abc().definition_hash());
        let other = FormFlowDefinition::builder("intake", 1).step(StepDefinition::new("a").to("c"))
                                                            .step(StepDefinition::new("b").to("c"))
                                                            .step(StepDefinition::new("c"))
                                                            .build()
                                                            .unwrap();
        assert_ne!(abc().definition_hash(), other.definition_hash());
    }

    #[test]
    fn json_round_trip_preserves_definition() {
        let raw = r#"{
            "key": "loan",
            "version": 2,
            "steps": [
                {"key": "applicant", "transitions": [{"condition": "context.age >= 18", "to": "income"}, {"to": "rejected"}]},
                {"key": "income", "prefill_expression": "context.defaults", "terminal": true},
                {"key": "rejected"}
            ]
        }"#;
        let def = FormFlowDefinition::from_json(raw).expect("parse");
        assert_eq!(def.id(), &FormFlowDefinitionId::new("loan", 2));
        assert_eq!(def.step("applicant").unwrap().transitions.len(), 2);
        assert!(def.step("income").unwrap().terminal);

        let back: FormFlowDefinition = serde_json::from_value(serde_json::to_value(&def).unwrap()).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn from_json_validates() {
        let raw = r#"{"key": "k", "version": 1, "steps": [{"key": "a", "transitions": [{"to": "b"}]}]}"#;
        assert!(matches!(FormFlowDefinition::from_json(raw), Err(FormFlowError::InvalidDefinition(_))));
    }
}
