//! Merge determinista de documentos JSON (contexto de submission).
//!
//! Semántica, aplicada nivel a nivel:
//! - Objetos: deep-merge clave a clave; claves ausentes en `b` conservan el
//!   valor de `a`.
//! - Arrays cuyos elementos (en ambos lados) son objetos con un campo clave
//!   configurado: merge elemento a elemento por ese campo. Items en ambos
//!   lados se fusionan como objetos, items sólo en `b` se agregan al final,
//!   items sólo en `a` se conservan.
//! - Cualquier otro caso (escalares, arrays sin clave, tipos distintos): `b`
//!   reemplaza a `a`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::DEFAULT_MERGE_KEY;

/// Opciones del merge: campos que identifican items de arrays, por prioridad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    pub key_fields: Vec<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self { key_fields: vec![DEFAULT_MERGE_KEY.to_string()] }
    }
}

/// Función pura de merge con override; ver docs del módulo.
#[derive(Debug, Clone, Default)]
pub struct TreeMerger {
    options: MergeOptions,
}

impl TreeMerger {
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    pub fn with_key_fields<I, S>(fields: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self::new(MergeOptions { key_fields: fields.into_iter().map(Into::into).collect() })
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Fusiona `b` sobre `a`.
    pub fn merge(&self, a: &Value, b: &Value) -> Value {
        match (a, b) {
            (Value::Object(ma), Value::Object(mb)) => Value::Object(self.merge_objects(ma, mb)),
            (Value::Array(aa), Value::Array(ab)) => match self.shared_key_field(aa, ab) {
                Some(field) => Value::Array(self.merge_keyed(aa, ab, field)),
                None => b.clone(),
            },
            (_, other) => other.clone(),
        }
    }

    /// Pliega los documentos de izquierda a derecha. Los `None` se ignoran;
    /// sin documentos el resultado es `{}`.
    pub fn merge_all<'a, I>(&self, documents: I) -> Value
        where I: IntoIterator<Item = Option<&'a Value>>
    {
        documents.into_iter()
                 .flatten()
                 .fold(Value::Object(Map::new()), |acc, doc| self.merge(&acc, doc))
    }

    fn merge_objects(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Map<String, Value> {
        let mut out = a.clone();
        for (k, vb) in b {
            let merged = match out.get(k) {
                Some(va) => self.merge(va, vb),
                None => vb.clone(),
            };
            out.insert(k.clone(), merged);
        }
        out
    }

    /// Primer campo clave presente en todos los elementos de ambos arrays.
    /// Dos arrays vacíos no tienen clave (el reemplazo es equivalente).
    fn shared_key_field(&self, a: &[Value], b: &[Value]) -> Option<&str> {
        if a.is_empty() && b.is_empty() {
            return None;
        }
        self.options
            .key_fields
            .iter()
            .map(String::as_str)
            .find(|field| a.iter().chain(b.iter()).all(|item| item_key(item, field).is_some()))
    }

    fn merge_keyed(&self, a: &[Value], b: &[Value], field: &str) -> Vec<Value> {
        let mut out: Vec<Value> = a.to_vec();
        for item in b {
            let key = item_key(item, field);
            // Con claves duplicadas se usa la primera coincidencia.
            match out.iter().position(|existing| item_key(existing, field) == key) {
                Some(idx) => out[idx] = self.merge(&out[idx], item),
                None => out.push(item.clone()),
            }
        }
        out
    }
}

fn item_key<'v>(item: &'v Value, field: &str) -> Option<&'v Value> {
    item.as_object().and_then(|o| o.get(field))
}

/// Merge con las opciones por defecto (clave `code`).
pub fn merge_json(a: &Value, b: &Value) -> Value {
    TreeMerger::default().merge(a, b)
}
