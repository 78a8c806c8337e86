//! `ExpressionEvaluator` sobre rhai.
//!
//! Las expresiones pueden escribirse tal cual (`context.age >= 18`) o como
//! plantilla (`{{ context.age >= 18 }}`). Las variables (`context`, `data`) se
//! exponen como constantes del scope. Un valor JSON `null` llega como `()`,
//! y leer una propiedad inexistente de un mapa también devuelve `()`.
use log::debug;
use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use serde_json::Value;

use formflow_core::{ExpressionError, ExpressionEvaluator, Variables};

pub struct RhaiEvaluator {
    engine: Engine,
}

impl Default for RhaiEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl RhaiEvaluator {
    pub fn new() -> Self {
        Self { engine: Engine::new() }
    }

    /// Quita el envoltorio `{{ }}` si existe.
    pub fn to_code_string(expression: &str) -> &str {
        let code = expression.trim();
        match code.strip_prefix("{{").and_then(|c| c.strip_suffix("}}")) {
            Some(inner) => inner.trim(),
            None => code,
        }
    }
}

impl ExpressionEvaluator for RhaiEvaluator {
    fn evaluate(&self, expression: &str, variables: &Variables) -> Result<Value, ExpressionError> {
        let code = Self::to_code_string(expression);
        if code.is_empty() {
            return Err(ExpressionError::Malformed { expression: expression.to_string(),
                                                    message: "empty expression".into() });
        }
        let ast = self.engine
                      .compile(code)
                      .map_err(|err| ExpressionError::Malformed { expression: expression.to_string(),
                                                                  message: err.to_string() })?;

        let mut scope = Scope::new();
        for (name, value) in variables {
            let value = to_dynamic(value).map_err(|err| evaluation_error(expression, &err))?;
            scope.push_constant(name.as_str(), value);
        }

        let result = self.engine
                         .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
                         .map_err(|err| evaluation_error(expression, &err))?;
        let value: Value = from_dynamic(&result).map_err(|err| evaluation_error(expression, &err))?;
        debug!("expression `{code}` -> {value}");
        Ok(value)
    }
}

fn evaluation_error(expression: &str, err: &EvalAltResult) -> ExpressionError {
    match err {
        EvalAltResult::ErrorVariableNotFound(name, _) => {
            ExpressionError::MissingVariable { expression: expression.to_string(),
                                               name: name.clone() }
        }
        other => ExpressionError::Evaluation { expression: expression.to_string(),
                                               message: other.to_string() },
    }
}
