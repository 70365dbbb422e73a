// ============================================================================
// SYNC ENGINE - DRENA LA COLA LOCAL CONTRA EL REMOTO
// ============================================================================
// Agrupa las ediciones pendientes por fecha de servicio (el conflict target
// remoto es (child_id, service_date), así cada grupo es UN solo upsert en
// vez de un round-trip por registro), intenta todos los grupos sin
// cortocircuito, reconcilia éxito/falla por grupo y poda lo confirmado.
//
// sync_pending nunca lanza: toda falla se convierte en un SyncResult.
// ============================================================================

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDate;

use crate::models::{AttendanceRow, PendingAttendanceEdit, SyncResult};
use crate::services::api_client::AttendanceRemote;
use crate::services::offline_db::{OfflineDb, StorageBackend};

pub struct SyncService<B: StorageBackend, R: AttendanceRemote> {
    db: Rc<OfflineDb<B>>,
    remote: R,
}

impl<B: StorageBackend, R: AttendanceRemote + Clone> Clone for SyncService<B, R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            remote: self.remote.clone(),
        }
    }
}

impl<B: StorageBackend, R: AttendanceRemote> SyncService<B, R> {
    pub fn new(db: Rc<OfflineDb<B>>, remote: R) -> Self {
        Self { db, remote }
    }

    /// Cantidad de ediciones pendientes (para el badge de la UI).
    /// Falla de storage cuenta como 0: sin capacidad offline no hay cola.
    pub fn pending_count(&self) -> usize {
        self.db.count_unsynced().unwrap_or(0)
    }

    /// Una pasada completa de sincronización. Ver el header del módulo.
    ///
    /// Dos pasadas concurrentes son seguras a nivel de datos (upsert y prune
    /// idempotentes) pero la "perdedora" puede contar de más en su
    /// SyncResult; limitación aceptada, no hay guard de serialización.
    pub async fn sync_pending(&self) -> SyncResult {
        // 1. Leer la cola. Si la lectura falla, se reporta, no se propaga.
        let edits = match self.db.list_unsynced() {
            Ok(edits) => edits,
            Err(e) => {
                log::error!("❌ No se pudo leer la cola local: {}", e);
                return SyncResult {
                    success: false,
                    synced: 0,
                    failed: 0,
                    errors: vec![format!("no se pudo leer la cola local: {}", e)],
                };
            }
        };

        // 2. Cola vacía: éxito trivial, sin ninguna llamada de red
        if edits.is_empty() {
            log::info!("📭 No hay ediciones pendientes");
            return SyncResult::empty();
        }

        log::info!("🔄 Iniciando sincronización: {} ediciones pendientes", edits.len());

        // 3. Agrupar por fecha de servicio
        let mut groups: BTreeMap<NaiveDate, Vec<PendingAttendanceEdit>> = BTreeMap::new();
        for edit in edits {
            groups.entry(edit.service_date).or_default().push(edit);
        }

        // 4. Un upsert por grupo; los grupos son independientes, una falla
        //    no aborta los restantes
        let mut synced = 0usize;
        let mut failed = 0usize;
        let mut errors: Vec<String> = Vec::new();
        let mut confirmed_keys: Vec<String> = Vec::new();

        for (date, group) in &groups {
            let rows: Vec<AttendanceRow> = group.iter().map(AttendanceRow::from).collect();
            match self.remote.upsert_attendance(&rows).await {
                Ok(()) => {
                    log::info!(
                        "✅ Grupo {} sincronizado: {} ediciones",
                        date.format("%Y-%m-%d"),
                        group.len()
                    );
                    synced += group.len();
                    confirmed_keys.extend(group.iter().map(PendingAttendanceEdit::key));
                }
                Err(e) => {
                    log::error!("❌ Grupo {} falló: {}", date.format("%Y-%m-%d"), e);
                    failed += group.len();
                    errors.push(format!("fecha {}: {}", date.format("%Y-%m-%d"), e));
                }
            }
        }

        // 5. Reconciliar y podar, pase lo que pase con los grupos
        if let Err(e) = self.db.mark_synced(&confirmed_keys) {
            log::error!("❌ Error marcando ediciones sincronizadas: {}", e);
            errors.push(format!("error marcando sincronizadas: {}", e));
        }
        if let Err(e) = self.db.prune_synced() {
            log::error!("❌ Error podando sincronizadas: {}", e);
            errors.push(format!("error en prune: {}", e));
        }

        let success = failed == 0 && errors.is_empty();
        if success {
            log::info!("✅ Sincronización exitosa: {} ediciones", synced);
        } else {
            log::warn!(
                "⚠️ Sincronización parcial: {} ok, {} pendientes quedan en cola",
                synced,
                failed
            );
        }

        SyncResult {
            success,
            synced,
            failed,
            errors,
        }
    }
}
