//! Contexto de ejecución de una operación sobre una instancia.

use crate::definition::FormFlowDefinition;
use crate::expression::ExpressionEvaluator;
use crate::merge::TreeMerger;

/// Agrupa los colaboradores de sólo lectura que necesita cada operación de
/// `FormFlowInstance`: la definición, el evaluador y el merger.
#[derive(Clone, Copy)]
pub struct FlowCtx<'a> {
    pub definition: &'a FormFlowDefinition,
    pub evaluator: &'a dyn ExpressionEvaluator,
    pub merger: &'a TreeMerger,
}

impl<'a> FlowCtx<'a> {
    #[inline]
    pub fn new(definition: &'a FormFlowDefinition,
               evaluator: &'a dyn ExpressionEvaluator,
               merger: &'a TreeMerger)
               -> Self {
        Self { definition,
               evaluator,
               merger }
    }
}
