//! Errores del motor de form flows.

use thiserror::Error;
use uuid::Uuid;

use crate::expression::ExpressionError;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum FormFlowError {
    #[error("flow has no current step (already terminated)")]
    NoCurrentStep,
    #[error("stale step instance: expected {expected}, got {actual}")]
    StaleStep { expected: Uuid, actual: Uuid },
    #[error("current step is the first step, there is no previous step")]
    NoPreviousStep,
    #[error("expression error: {0}")]
    Expression(#[from] ExpressionError),
    #[error("no transition matched from step '{step_key}' and the step is not terminal")]
    UndefinedTransition { step_key: String },
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
    #[error("unknown step '{0}'")]
    UnknownStep(String),
    #[error("definition not found: {0}")]
    DefinitionNotFound(String),
    #[error("instance not found: {0}")]
    InstanceNotFound(Uuid),
    #[error("internal: {0}")]
    Internal(String),
}
