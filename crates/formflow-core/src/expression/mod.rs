//! Contrato del evaluador de expresiones.
//!
//! El motor nunca interpreta expresiones por sí mismo: guards de transición,
//! prefill y submit-transform se delegan a un `ExpressionEvaluator` inyectado.
//! Las variables expuestas son un conjunto cerrado (ver `constants`).

use serde_json::{Map, Value};
use thiserror::Error;

/// Variables disponibles para una evaluación.
pub type Variables = Map<String, Value>;

/// Fallo tipado del evaluador. Nunca se recupera localmente: el motor aborta
/// la operación en curso.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ExpressionError {
    #[error("malformed expression `{expression}`: {message}")]
    Malformed { expression: String, message: String },
    #[error("expression `{expression}` references missing variable `{name}`")]
    MissingVariable { expression: String, name: String },
    #[error("evaluation of `{expression}` failed: {message}")]
    Evaluation { expression: String, message: String },
}

/// Capacidad externa `evaluate(expression, variables) -> Value`.
///
/// Implementaciones deben ser deterministas y sin efectos secundarios.
pub trait ExpressionEvaluator {
    fn evaluate(&self, expression: &str, variables: &Variables) -> Result<Value, ExpressionError>;
}

impl<F> ExpressionEvaluator for F where F: Fn(&str, &Variables) -> Result<Value, ExpressionError>
{
    fn evaluate(&self, expression: &str, variables: &Variables) -> Result<Value, ExpressionError> {
        self(expression, variables)
    }
}

/// Evaluador para definiciones sin expresiones: cualquier llamada falla.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExpressions;

impl ExpressionEvaluator for NoExpressions {
    fn evaluate(&self, expression: &str, _variables: &Variables) -> Result<Value, ExpressionError> {
        Err(ExpressionError::Evaluation { expression: expression.to_string(),
                                         message: "no expression evaluator configured".to_string() })
    }
}

/// Interpretación booleana del resultado de un guard.
///
/// `null`, `false`, `0`, `""`, `"false"`, `[]` y `{}` son falsos.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Construye el mapa de variables a partir de pares nombre/valor.
pub fn variables<'a, I>(pairs: I) -> Variables
    where I: IntoIterator<Item = (&'a str, Value)>
{
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
