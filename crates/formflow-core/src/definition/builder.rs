//! Builder fluido para `FormFlowDefinition`.
//!
//! ```ignore
//! let def = FormFlowDefinition::builder("intake", 1)
//!     .step(StepDefinition::new("a").to("b"))
//!     .step(StepDefinition::new("b"))
//!     .build()?;
//! ```

use super::{FormFlowDefinition, FormFlowDefinitionId, StepDefinition};
use crate::errors::FormFlowError;

#[derive(Debug)]
pub struct DefinitionBuilder {
    id: FormFlowDefinitionId,
    start_step: Option<String>,
    steps: Vec<StepDefinition>,
}

impl DefinitionBuilder {
    pub fn new(id: FormFlowDefinitionId) -> Self {
        Self { id,
               start_step: None,
               steps: Vec::new() }
    }

    /// Fija el step inicial (por defecto, el primero declarado).
    pub fn start_at(mut self, key: impl Into<String>) -> Self {
        self.start_step = Some(key.into());
        self
    }

    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    pub fn build(self) -> Result<FormFlowDefinition, FormFlowError> {
        FormFlowDefinition::new(self.id, self.start_step, self.steps)
    }
}
