use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::definition::FormFlowDefinition;
use crate::errors::FormFlowError;

/// Versión pedida al buscar una definición.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionVersion {
    Exact(u32),
    Latest,
}

impl fmt::Display for DefinitionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionVersion::Exact(v) => write!(f, "{v}"),
            DefinitionVersion::Latest => f.write_str("latest"),
        }
    }
}

/// `findDefinition(key, version | latest)`.
pub trait DefinitionRepository {
    fn find_definition(&self, key: &str, version: DefinitionVersion) -> Option<FormFlowDefinition>;
}

/// Registro en memoria; las definiciones son inmutables una vez registradas.
#[derive(Debug, Default)]
pub struct InMemoryDefinitionRepository {
    inner: HashMap<String, BTreeMap<u32, FormFlowDefinition>>,
}

impl InMemoryDefinitionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una definición. Re-registrar el mismo grafo es idempotente;
    /// un grafo distinto bajo el mismo (key, version) se rechaza.
    pub fn register(&mut self, definition: FormFlowDefinition) -> Result<(), FormFlowError> {
        let id = definition.id().clone();
        let versions = self.inner.entry(id.key.clone()).or_default();
        match versions.get(&id.version) {
            Some(existing) if existing.definition_hash() == definition.definition_hash() => Ok(()),
            Some(_) => Err(FormFlowError::InvalidDefinition(format!("definition {id} already registered with a different graph"))),
            None => {
                versions.insert(id.version, definition);
                Ok(())
            }
        }
    }
}

impl DefinitionRepository for InMemoryDefinitionRepository {
    fn find_definition(&self, key: &str, version: DefinitionVersion) -> Option<FormFlowDefinition> {
        let versions = self.inner.get(key)?;
        match version {
            DefinitionVersion::Exact(v) => versions.get(&v).cloned(),
            DefinitionVersion::Latest => versions.values().next_back().cloned(),
        }
    }
}
