//! Configuración de la aplicación.
//! Carga `.env` una sola vez y lee `FORMFLOW_MERGE_KEYS`: campos clave (separados
//! por coma, en orden de prioridad) con los que se fusionan arrays del contexto.
use std::env;

use dotenvy::dotenv;
use formflow_core::constants::DEFAULT_MERGE_KEY;
use formflow_core::{MergeOptions, TreeMerger};
use once_cell::sync::Lazy;

use crate::errors::CliError;

pub const MERGE_KEYS_VAR: &str = "FORMFLOW_MERGE_KEYS";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub merge_keys: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { merge_keys: vec![DEFAULT_MERGE_KEY.to_string()] }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, CliError> {
        Lazy::force(&DOTENV_LOADED);
        match env::var(MERGE_KEYS_VAR) {
            Ok(raw) => Self::with_merge_keys(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Parsea una lista `a,b,c`; ignora espacios y entradas vacías.
    pub fn with_merge_keys(raw: &str) -> Result<Self, CliError> {
        let merge_keys: Vec<String> = raw.split(',')
                                         .map(str::trim)
                                         .filter(|k| !k.is_empty())
                                         .map(String::from)
                                         .collect();
        if merge_keys.is_empty() {
            return Err(CliError::Config(format!("{MERGE_KEYS_VAR} no contiene ningún campo clave")));
        }
        Ok(Self { merge_keys })
    }

    pub fn merger(&self) -> TreeMerger {
        TreeMerger::new(MergeOptions { key_fields: self.merge_keys.clone() })
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
