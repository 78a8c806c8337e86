//! Eventos de auditoría de instancias y trait EventStore.

mod store;
mod types;

pub use store::{EventStore, InMemoryEventStore};
pub use types::{FormFlowEvent, FormFlowEventKind};
