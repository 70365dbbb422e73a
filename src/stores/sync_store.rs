// ============================================================================
// SYNC STORE - ESTADO DE SINCRONIZACIÓN PARA LA UI
// ============================================================================

use crate::models::{SyncResult, SyncState};

#[derive(Clone, Debug, PartialEq)]
pub struct SyncStore {
    pub sync_state: SyncState,
    /// Ediciones en cola local esperando confirmación remota
    pub pending_count: usize,
    pub is_online: bool,
    pub last_sync_attempt: Option<i64>,
}

impl Default for SyncStore {
    fn default() -> Self {
        Self {
            sync_state: SyncState::Synced,
            pending_count: 0,
            is_online: true,
            last_sync_attempt: None,
        }
    }
}

impl SyncStore {
    /// Estado visible combinando pasada en curso, último resultado y cola.
    /// Una pasada fallida se muestra como Error mientras quede backlog;
    /// con la cola vacía el error viejo deja de ser relevante.
    pub fn view_state(
        is_syncing: bool,
        last_result: Option<&SyncResult>,
        pending_count: usize,
        is_online: bool,
    ) -> SyncState {
        if is_syncing {
            return SyncState::Syncing;
        }
        if let Some(result) = last_result {
            if !result.success && pending_count > 0 {
                let message = result
                    .errors
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "sincronización fallida".to_string());
                return SyncState::Error { message };
            }
        }
        let mut store = SyncStore {
            is_online,
            ..Default::default()
        };
        store.refresh(pending_count);
        store.sync_state
    }

    /// Recalcula el estado visible a partir del conteo pendiente y la red
    pub fn refresh(&mut self, pending_count: usize) {
        self.pending_count = pending_count;
        self.sync_state = match (self.is_online, pending_count) {
            (_, 0) => SyncState::Synced,
            (true, count) => SyncState::Pending { count },
            (false, count) => SyncState::Offline {
                pending_count: count,
            },
        };
    }
}
