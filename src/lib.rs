//! FormFlow
//!
//! Capa de aplicación sobre `formflow-core`:
//! - `config`: configuración desde el entorno (`.env`).
//! - `evaluator`: evaluador de expresiones basado en rhai.
//! - `script`: runner que ejecuta una lista de acciones sobre una definición.
//! - `errors`: errores de la aplicación.
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub mod config;
pub mod errors;
pub mod evaluator;
pub mod script;

pub use evaluator::RhaiEvaluator;
