//! Engine module: máquina de estados de instancias, resolución de
//! transiciones y la fachada `FormFlowEngine` sobre los repositorios.

pub mod core;
pub mod flow_ctx;
pub mod instance;
pub mod resolver;

pub use self::core::FormFlowEngine;
pub use flow_ctx::FlowCtx;
pub use instance::{FormFlowInstance, InstanceDocument};
pub use resolver::TransitionResolver;
