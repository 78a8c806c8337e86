//! formflow-core: motor de form flows reanudables con historia reescribible.
//!
//! Una `FormFlowInstance` recorre los steps de una `FormFlowDefinition`:
//! tras cada `complete` el `TransitionResolver` elige el siguiente step a
//! partir del contexto fusionado (`TreeMerger`) de toda la historia. `back`
//! retrocede sin borrar nada; reenviar un step con datos distintos invalida
//! los steps posteriores, reenviarlo con los mismos datos los conserva.
pub mod constants;
pub mod definition;
pub mod engine;
pub mod errors;
pub mod event;
pub mod expression;
pub mod hashing;
pub mod merge;
pub mod repo;
pub mod step;

pub use definition::{DefinitionBuilder, FormFlowDefinition, FormFlowDefinitionId, StepDefinition, TransitionDefinition};
pub use engine::{FlowCtx, FormFlowEngine, FormFlowInstance, TransitionResolver};
pub use errors::FormFlowError;
pub use event::{EventStore, FormFlowEvent, FormFlowEventKind, InMemoryEventStore};
pub use expression::{is_truthy, ExpressionError, ExpressionEvaluator, NoExpressions, Variables};
pub use merge::{merge_json, MergeOptions, TreeMerger};
pub use repo::{DefinitionRepository, DefinitionVersion, InMemoryDefinitionRepository, InMemoryInstanceRepository,
               InstanceRepository};
pub use step::{StepInstance, StepStatus};
