//! Instancias de step: una visita concreta a un step de la definición.

mod instance;
mod status;

pub use instance::StepInstance;
pub use status::StepStatus;
