use serde::{Deserialize, Serialize};

/// Estado de sincronización visible para la UI
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SyncState {
    Synced,
    Pending { count: usize },
    Syncing,
    Offline { pending_count: usize },
    Error { message: String },
}

/// Resultado de una pasada de sincronización (efímero, no se persiste).
/// Nunca se lanza como error: toda falla interna del Sync Engine se
/// convierte en un SyncResult con success = false.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResult {
    pub success: bool,
    /// Ediciones confirmadas por el remoto en esta pasada
    pub synced: usize,
    /// Ediciones que quedaron pendientes (se reintentan en la próxima pasada)
    pub failed: usize,
    /// Una descripción por grupo de fecha fallido, en orden
    pub errors: Vec<String>,
}

impl SyncResult {
    /// Pasada trivial: no había nada pendiente
    pub fn empty() -> Self {
        Self {
            success: true,
            synced: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }
}

/// Resultado de un guardado desde la vista de captura
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Escrito directo en el remoto
    SavedRemote,
    /// Encolado localmente, se sincronizará al reconectar
    SavedOffline,
}
