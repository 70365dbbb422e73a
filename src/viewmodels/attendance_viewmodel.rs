// ============================================================================
// ATTENDANCE VIEWMODEL - LÓGICA DE CAPTURA DE ASISTENCIA
// ============================================================================
// Decide por cada guardado si escribe directo al remoto o cae a la cola
// local, y combina estado remoto + local para mostrar (lo local siempre
// gana por clave: es la intención más reciente del usuario).
// Los hooks actualizan el estado de UI; acá solo lógica de negocio.
// ============================================================================

use std::collections::HashMap;
use std::rc::Rc;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{AttendanceRecord, AttendanceRow, Child, EditInput, SaveOutcome, SyncResult};
use crate::services::api_client::AttendanceRemote;
use crate::services::offline_db::{OfflineDb, StorageBackend};
use crate::services::sync_service::SyncService;
use crate::utils::constants::{MAX_NOTES_LEN, ROSTER_MAX_AGE_HOURS};

/// De dónde salió el roster cargado
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RosterSource {
    /// Fetch remoto exitoso (y caché refrescado)
    Remote,
    /// Offline limpio, servido desde caché fresco
    CacheOffline,
    /// El fetch remoto FALLÓ (no mero offline); servido desde caché.
    /// La UI debe distinguir este estado degradado del offline limpio.
    CacheDegraded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterLoad {
    pub children: Vec<Child>,
    pub source: RosterSource,
}

pub struct AttendanceViewModel<B: StorageBackend, R: AttendanceRemote> {
    db: Rc<OfflineDb<B>>,
    remote: R,
    sync: SyncService<B, R>,
}

impl<B: StorageBackend, R: AttendanceRemote + Clone> AttendanceViewModel<B, R> {
    pub fn new(db: Rc<OfflineDb<B>>, remote: R) -> Self {
        let sync = SyncService::new(db.clone(), remote.clone());
        Self { db, remote, sync }
    }

    /// Drena la cola pendiente (delegado al Sync Engine)
    pub async fn sync_pending(&self) -> SyncResult {
        self.sync.sync_pending().await
    }

    pub fn pending_count(&self) -> usize {
        self.sync.pending_count()
    }

    /// Carga el roster. Online: fetch remoto + refresco incondicional del
    /// caché. Offline: exige caché fresco; sin caché fresco devuelve
    /// NoDataAvailable para que la UI avise, nunca una lista vacía muda.
    pub async fn load_roster(&self, online: bool) -> Result<RosterLoad, AppError> {
        if !online {
            return self.roster_from_cache(RosterSource::CacheOffline);
        }

        match self.remote.list_children().await {
            Ok(children) => {
                // Side effect de cache-fill: si el storage falla se degrada
                // con warning, el roster ya está en mano
                if let Err(e) = self.db.replace_roster(&children) {
                    log::warn!("⚠️ Roster obtenido pero no se pudo cachear: {}", e);
                }
                Ok(RosterLoad {
                    children,
                    source: RosterSource::Remote,
                })
            }
            Err(e) => {
                // Falla activa del fetch, distinto del offline limpio
                log::warn!("⚠️ Fetch de roster falló, degradando a caché: {}", e);
                self.roster_from_cache(RosterSource::CacheDegraded)
            }
        }
    }

    fn roster_from_cache(&self, source: RosterSource) -> Result<RosterLoad, AppError> {
        // StorageUnavailable equivale a "sin caché": modo degradado, no crash
        let fresh = self.db.is_roster_fresh(ROSTER_MAX_AGE_HOURS).unwrap_or(false);
        if !fresh {
            return Err(AppError::NoDataAvailable);
        }
        let children = self
            .db
            .get_roster()
            .unwrap_or_default()
            .iter()
            .map(|c| c.to_child())
            .collect();
        Ok(RosterLoad { children, source })
    }

    /// Asistencia combinada para una fecha: siempre primero lo pendiente
    /// local; si hay red, lo remoto siembra el mapa y después lo local se
    /// superpone por child_id.
    pub async fn load_attendance_for_date(
        &self,
        date: NaiveDate,
        online: bool,
    ) -> HashMap<String, AttendanceRecord> {
        let local = match self.db.list_by_date(date) {
            Ok(edits) => edits,
            Err(e) => {
                log::warn!("⚠️ No se pudieron leer ediciones locales: {}", e);
                Vec::new()
            }
        };

        let mut merged: HashMap<String, AttendanceRecord> = HashMap::new();

        if online {
            match self.remote.list_attendance(date).await {
                Ok(rows) => {
                    for row in rows {
                        merged.insert(
                            row.child_id.clone(),
                            AttendanceRecord {
                                child_id: row.child_id,
                                present: row.present,
                                notes: row.notes,
                                pending_local: false,
                            },
                        );
                    }
                }
                Err(e) => {
                    log::warn!("⚠️ Fetch de asistencia remota falló, solo local: {}", e);
                }
            }
        }

        // Lo local pisa lo remoto para la misma clave: una edición pendiente
        // no puede ser aplastada por una lectura remota vieja
        for edit in local {
            merged.insert(
                edit.child_id.clone(),
                AttendanceRecord {
                    child_id: edit.child_id.clone(),
                    present: edit.present,
                    notes: edit.notes.clone(),
                    pending_local: !edit.synced,
                },
            );
        }

        merged
    }

    /// Guarda un lote de ediciones para una fecha.
    /// Valida TODO antes de cualquier I/O: una sola nota pasada de largo
    /// aborta el guardado completo, sin commit parcial.
    pub async fn save(
        &self,
        date: NaiveDate,
        edits: Vec<EditInput>,
        online: bool,
    ) -> Result<SaveOutcome, AppError> {
        for edit in &edits {
            if let Some(notes) = &edit.notes {
                if notes.chars().count() > MAX_NOTES_LEN {
                    return Err(AppError::Validation(format!(
                        "la nota de {} supera los {} caracteres",
                        edit.child_id, MAX_NOTES_LEN
                    )));
                }
            }
            if edit.service_date != date {
                return Err(AppError::Validation(format!(
                    "edición de {} con fecha {} en un guardado de {}",
                    edit.child_id, edit.service_date, date
                )));
            }
        }

        if edits.is_empty() {
            // No-op: no se escribe nada en ningún lado, el outcome solo
            // refleja el modo actual
            return Ok(if online {
                SaveOutcome::SavedRemote
            } else {
                SaveOutcome::SavedOffline
            });
        }

        if online {
            let rows: Vec<AttendanceRow> = edits.iter().map(AttendanceRow::from).collect();
            match self.remote.upsert_attendance(&rows).await {
                Ok(()) => {
                    // El guardado online también drena el backlog no
                    // relacionado que haya quedado en cola
                    let backlog = self.sync.sync_pending().await;
                    if backlog.synced > 0 {
                        log::info!("🔄 Backlog drenado tras guardado: {} ediciones", backlog.synced);
                    }
                    Ok(SaveOutcome::SavedRemote)
                }
                Err(e) => {
                    // Red o server caído: a la cola local, nunca perder
                    // la asistencia capturada
                    if e.is_network_class() {
                        log::warn!("📴 Sin red durante el guardado, encolando offline");
                    } else {
                        log::warn!("⚠️ Upsert remoto falló ({}), encolando offline", e);
                    }
                    self.db.put(edits)?;
                    Ok(SaveOutcome::SavedOffline)
                }
            }
        } else {
            self.db.put(edits)?;
            Ok(SaveOutcome::SavedOffline)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteAttendance;
    use crate::services::offline_db::MemoryBackend;
    use crate::services::test_support::MockRemote;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn input(child: &str, d: &str, present: bool) -> EditInput {
        EditInput {
            child_id: child.to_string(),
            service_date: date(d),
            present,
            notes: None,
            recorded_by: Some("maestra1".to_string()),
        }
    }

    fn setup() -> (
        Rc<OfflineDb<MemoryBackend>>,
        MockRemote,
        AttendanceViewModel<MemoryBackend, MockRemote>,
    ) {
        let db = Rc::new(OfflineDb::with_backend(MemoryBackend::new()));
        let remote = MockRemote::with_children(&[("A", "Ana"), ("B", "Benito")]);
        let vm = AttendanceViewModel::new(db.clone(), remote.clone());
        (db, remote, vm)
    }

    #[tokio::test]
    async fn local_pending_edit_overrides_remote_row() {
        let (db, remote, vm) = setup();
        remote.attendance.borrow_mut().insert(
            date("2024-01-01"),
            vec![RemoteAttendance {
                child_id: "A".to_string(),
                present: true,
                notes: None,
            }],
        );
        db.put(vec![input("A", "2024-01-01", false)]).unwrap();

        let merged = vm.load_attendance_for_date(date("2024-01-01"), true).await;
        let record = merged.get("A").unwrap();
        assert!(!record.present);
        assert!(record.pending_local);
    }

    #[tokio::test]
    async fn remote_rows_without_local_edit_pass_through() {
        let (_, remote, vm) = setup();
        remote.attendance.borrow_mut().insert(
            date("2024-01-01"),
            vec![RemoteAttendance {
                child_id: "B".to_string(),
                present: true,
                notes: Some("llegó tarde".to_string()),
            }],
        );

        let merged = vm.load_attendance_for_date(date("2024-01-01"), true).await;
        let record = merged.get("B").unwrap();
        assert!(record.present);
        assert!(!record.pending_local);
        assert_eq!(record.notes.as_deref(), Some("llegó tarde"));
    }

    #[tokio::test]
    async fn oversized_note_aborts_whole_save_before_any_io() {
        let (db, remote, vm) = setup();
        let mut bad = input("A", "2024-01-01", true);
        bad.notes = Some("x".repeat(MAX_NOTES_LEN + 1));
        let edits = vec![input("B", "2024-01-01", true), bad];

        let result = vm.save(date("2024-01-01"), edits, true).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        // Sin commit parcial: nada escrito ni local ni remoto
        assert_eq!(db.count_unsynced().unwrap(), 0);
        assert!(remote.upsert_calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn offline_save_queues_locally() {
        let (db, remote, vm) = setup();
        let outcome = vm
            .save(date("2024-01-01"), vec![input("A", "2024-01-01", true)], false)
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::SavedOffline);
        assert_eq!(db.count_unsynced().unwrap(), 1);
        assert!(remote.upsert_calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn network_failure_falls_back_to_local_queue() {
        let (db, remote, vm) = setup();
        *remote.network_down.borrow_mut() = true;

        let outcome = vm
            .save(date("2024-01-01"), vec![input("A", "2024-01-01", true)], true)
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::SavedOffline);
        assert_eq!(db.count_unsynced().unwrap(), 1);
    }

    #[tokio::test]
    async fn online_save_drains_unrelated_backlog() {
        let (db, remote, vm) = setup();
        // Backlog viejo de otra fecha
        db.put(vec![input("B", "2024-02-20", true)]).unwrap();

        let outcome = vm
            .save(date("2024-03-10"), vec![input("A", "2024-03-10", true)], true)
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::SavedRemote);
        // El guardado directo + el drenado del backlog
        assert_eq!(remote.upsert_calls.borrow().len(), 2);
        assert_eq!(db.count_unsynced().unwrap(), 0);
    }

    #[tokio::test]
    async fn online_roster_load_refills_cache() {
        let (db, _, vm) = setup();
        let load = vm.load_roster(true).await.unwrap();
        assert_eq!(load.source, RosterSource::Remote);
        assert_eq!(load.children.len(), 2);
        assert!(db.is_roster_fresh(ROSTER_MAX_AGE_HOURS).unwrap());
    }

    #[tokio::test]
    async fn offline_roster_needs_fresh_cache() {
        let (_, _, vm) = setup();
        // Sin caché: offline limpio debe señalar NoDataAvailable
        assert!(matches!(
            vm.load_roster(false).await,
            Err(AppError::NoDataAvailable)
        ));

        // Con caché fresco: offline sirve desde caché
        vm.load_roster(true).await.unwrap();
        let load = vm.load_roster(false).await.unwrap();
        assert_eq!(load.source, RosterSource::CacheOffline);
        assert_eq!(load.children.len(), 2);
    }

    #[tokio::test]
    async fn failed_remote_fetch_degrades_to_cache() {
        let (_, remote, vm) = setup();
        vm.load_roster(true).await.unwrap();

        *remote.children_error.borrow_mut() =
            Some(AppError::Network("fetch failed".to_string()));
        let load = vm.load_roster(true).await.unwrap();
        assert_eq!(load.source, RosterSource::CacheDegraded);
        assert_eq!(load.children.len(), 2);
    }

    #[tokio::test]
    async fn failed_remote_fetch_without_cache_is_no_data() {
        let (_, remote, vm) = setup();
        *remote.children_error.borrow_mut() =
            Some(AppError::Network("fetch failed".to_string()));
        assert!(matches!(
            vm.load_roster(true).await,
            Err(AppError::NoDataAvailable)
        ));
    }

    #[tokio::test]
    async fn empty_save_is_a_noop_in_both_modes() {
        let (db, remote, vm) = setup();

        let online = vm.save(date("2024-01-01"), Vec::new(), true).await.unwrap();
        assert_eq!(online, SaveOutcome::SavedRemote);

        let offline = vm.save(date("2024-01-01"), Vec::new(), false).await.unwrap();
        assert_eq!(offline, SaveOutcome::SavedOffline);

        // Ni cola local ni llamadas remotas
        assert_eq!(db.count_unsynced().unwrap(), 0);
        assert!(remote.upsert_calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn mismatched_date_is_rejected() {
        let (_, _, vm) = setup();
        let result = vm
            .save(date("2024-01-02"), vec![input("A", "2024-01-01", true)], false)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
