use serde::{Deserialize, Serialize};

/// Niño del roster, tal como lo devuelve el backend (ordenado por nombre)
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Child {
    pub id: String,
    pub full_name: String,
}

/// Entrada del roster cacheado localmente para modo offline.
/// El caché completo se reemplaza de forma atómica en cada fetch exitoso
/// (clear + insert), nunca se parchea entrada por entrada.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct CachedChild {
    pub child_id: String,
    pub full_name: String,
    /// Timestamp del snapshot (UTC, milisegundos)
    pub cached_at: i64,
}

impl CachedChild {
    pub fn to_child(&self) -> Child {
        Child {
            id: self.child_id.clone(),
            full_name: self.full_name.clone(),
        }
    }
}
