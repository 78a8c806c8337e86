use formflow_core::FormFlowError;
use thiserror::Error;

/// Errores de la aplicación (CLI y runner de scripts).
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error(transparent)]
    Flow(#[from] FormFlowError),
    #[error("Acción {index}: {source}")]
    Action {
        index: usize,
        #[source]
        source: FormFlowError,
    },
    #[error("Script inválido: {0}")]
    Script(String),
}
