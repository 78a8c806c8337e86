//! Selección del siguiente step.

use log::debug;
use serde_json::Value;

use crate::constants::CONTEXT_VARIABLE;
use crate::definition::FormFlowDefinition;
use crate::errors::FormFlowError;
use crate::expression::{is_truthy, variables, ExpressionEvaluator};

/// Función pura `(definition, from_step_key, merged_context) -> Option<key>`.
///
/// Las transiciones se evalúan en orden de declaración; gana la primera
/// incondicional o la primera cuyo guard sea verdadero. Un step sin
/// transiciones termina el flujo. Si hay transiciones pero ninguna aplica, el
/// flujo termina sólo si el step está marcado `terminal`; en otro caso es un
/// error de configuración.
pub struct TransitionResolver;

impl TransitionResolver {
    pub fn resolve(definition: &FormFlowDefinition,
                   evaluator: &dyn ExpressionEvaluator,
                   from_step_key: &str,
                   context: &Value)
                   -> Result<Option<String>, FormFlowError> {
        let step = definition.step(from_step_key)?;
        if step.transitions.is_empty() {
            debug!("step '{from_step_key}' has no transitions, flow ends");
            return Ok(None);
        }

        let vars = variables([(CONTEXT_VARIABLE, context.clone())]);
        for transition in &step.transitions {
            let matched = match &transition.condition {
                None => true,
                Some(condition) => is_truthy(&evaluator.evaluate(condition, &vars)?),
            };
            if matched {
                debug!("step '{}' -> {:?}", from_step_key, transition.to);
                return Ok(transition.to.clone());
            }
        }

        if step.terminal {
            debug!("no transition matched from terminal step '{from_step_key}', flow ends");
            Ok(None)
        } else {
            Err(FormFlowError::UndefinedTransition { step_key: from_step_key.to_string() })
        }
    }
}
