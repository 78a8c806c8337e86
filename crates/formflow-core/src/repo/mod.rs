//! Colaboradores de persistencia: definiciones (sólo lectura para el motor) e
//! instancias (snapshot completo por llamada).

mod definitions;
mod instances;

pub use definitions::{DefinitionRepository, DefinitionVersion, InMemoryDefinitionRepository};
pub use instances::{InMemoryInstanceRepository, InstanceRepository};
