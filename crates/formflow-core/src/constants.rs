//! Constantes del motor de form flows.
//!
//! Agrupa los nombres de variables expuestos a las expresiones y los valores
//! por defecto del merge. Cambiar los nombres de variables rompe las
//! expresiones ya escritas en definiciones existentes.

/// Versión lógica del motor. Entra en el `definition_hash` para que un cambio
/// incompatible del motor produzca fingerprints distintos.
pub const ENGINE_VERSION: &str = "FF1.0";

/// Variable con el contexto fusionado (merge de la historia).
pub const CONTEXT_VARIABLE: &str = "context";

/// Variable con los datos enviados por el usuario (sólo en submit-transform).
pub const DATA_VARIABLE: &str = "data";

/// Campo identificador por defecto de los items de arrays fusionables.
pub const DEFAULT_MERGE_KEY: &str = "code";
