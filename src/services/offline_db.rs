// ============================================================================
// ALMACENAMIENTO LOCAL DURABLE (ediciones pendientes + roster cacheado)
// ============================================================================
// Cada familia de registros vive como UN documento JSON en localStorage:
// escribir el documento completo es el alcance de la transacción, así un
// put por lotes es atómico (o entran las N ediciones, o ninguna).
//
// Documentos:
//   asistencia_pending_v1     -> BTreeMap<clave, PendingAttendanceEdit>
//   asistencia_pending_idx_v1 -> Vec<clave>  (índice de no-sincronizadas)
//   asistencia_ninos_v1       -> Vec<CachedChild>
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use chrono::{NaiveDate, Utc};

use crate::error::AppError;
use crate::models::{CachedChild, Child, EditInput, PendingAttendanceEdit};
use crate::utils::constants::{PENDING_INDEX_KEY, PENDING_STORE_KEY, ROSTER_CACHE_KEY};

/// Backend de almacenamiento clave → documento string.
/// Seam para tests (MemoryBackend) y para el browser (LocalStorageBackend).
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Backend sobre window.localStorage
#[derive(Clone, Default)]
pub struct LocalStorageBackend;

impl LocalStorageBackend {
    fn storage(&self) -> Result<web_sys::Storage, AppError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| {
                AppError::StorageUnavailable("no se pudo acceder a localStorage".to_string())
            })
    }
}

impl StorageBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.storage()?
            .get_item(key)
            .map_err(|_| AppError::StorageUnavailable(format!("error leyendo '{}'", key)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|_| AppError::StorageUnavailable(format!("error guardando '{}'", key)))
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.storage()?
            .remove_item(key)
            .map_err(|_| AppError::StorageUnavailable(format!("error eliminando '{}'", key)))
    }
}

/// Backend en memoria (tests y entornos sin localStorage).
/// Los clones comparten el mismo mapa subyacente.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Store local durable. Dueño exclusivo de los registros persistidos;
/// Sync Engine y ViewModel solo manejan proyecciones en memoria.
pub struct OfflineDb<B: StorageBackend> {
    backend: B,
    /// Último timestamp emitido, para que created_at sea monótono
    /// incluso con varias inserciones en el mismo milisegundo
    last_stamp: Cell<i64>,
}

pub type AppDb = OfflineDb<LocalStorageBackend>;

impl OfflineDb<LocalStorageBackend> {
    pub fn new() -> Self {
        Self::with_backend(LocalStorageBackend)
    }
}

impl Default for OfflineDb<LocalStorageBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: StorageBackend> OfflineDb<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            last_stamp: Cell::new(0),
        }
    }

    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let stamp = now.max(self.last_stamp.get() + 1);
        self.last_stamp.set(stamp);
        stamp
    }

    // ==========================================
    // DOCUMENTO DE EDICIONES PENDIENTES
    // ==========================================

    fn load_pending_map(&self) -> Result<BTreeMap<String, PendingAttendanceEdit>, AppError> {
        match self.backend.get(PENDING_STORE_KEY)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(map) => Ok(map),
                Err(e) => {
                    // Documento corrupto: irrecuperable, arrancar de cero
                    log::error!("❌ Documento de pendientes corrupto, se descarta: {}", e);
                    Ok(BTreeMap::new())
                }
            },
            None => Ok(BTreeMap::new()),
        }
    }

    fn save_pending_map(
        &self,
        map: &BTreeMap<String, PendingAttendanceEdit>,
    ) -> Result<(), AppError> {
        let json = serde_json::to_string(map)
            .map_err(|e| AppError::StorageUnavailable(format!("error serializando: {}", e)))?;
        self.backend.set(PENDING_STORE_KEY, &json)
    }

    /// Reescribe el índice de claves no-sincronizadas a partir del mapa.
    /// El índice es redundante: si falla su escritura solo queda stale y
    /// las lecturas caen al full scan.
    fn rebuild_index(&self, map: &BTreeMap<String, PendingAttendanceEdit>) {
        let keys: Vec<&String> = map
            .iter()
            .filter(|(_, e)| !e.synced)
            .map(|(k, _)| k)
            .collect();
        match serde_json::to_string(&keys) {
            Ok(json) => {
                if let Err(e) = self.backend.set(PENDING_INDEX_KEY, &json) {
                    log::warn!("⚠️ No se pudo actualizar el índice de pendientes: {}", e);
                }
            }
            Err(e) => log::warn!("⚠️ Error serializando índice: {}", e),
        }
    }

    fn load_index(&self) -> Option<Vec<String>> {
        let json = self.backend.get(PENDING_INDEX_KEY).ok()??;
        serde_json::from_str(&json).ok()
    }

    /// Upsert por lotes de ediciones pendientes. Para cada entrada deriva la
    /// clave (niño, fecha), estampa created_at, marca synced = false y pisa
    /// cualquier edición pendiente previa con la misma clave.
    /// Atómico: una escritura parcial no es observable.
    pub fn put(&self, edits: Vec<EditInput>) -> Result<(), AppError> {
        if edits.is_empty() {
            return Ok(());
        }
        let mut map = self.load_pending_map()?;
        let count = edits.len();
        for input in edits {
            let edit = PendingAttendanceEdit::from_input(input, self.next_stamp());
            map.insert(edit.key(), edit);
        }
        self.save_pending_map(&map)?;
        self.rebuild_index(&map);
        log::info!("💾 {} ediciones encoladas ({} pendientes en total)", count, map.len());
        Ok(())
    }

    /// Todas las ediciones con synced = false.
    /// Usa el índice si está disponible y consistente; ante cualquier
    /// inconsistencia cae en silencio al full scan + filtro.
    pub fn list_unsynced(&self) -> Result<Vec<PendingAttendanceEdit>, AppError> {
        let map = self.load_pending_map()?;

        if let Some(keys) = self.load_index() {
            let mut out = Vec::with_capacity(keys.len());
            let mut consistent = true;
            for key in &keys {
                match map.get(key) {
                    Some(edit) if !edit.synced => out.push(edit.clone()),
                    _ => {
                        consistent = false;
                        break;
                    }
                }
            }
            let total = map.values().filter(|e| !e.synced).count();
            if consistent && out.len() == total {
                return Ok(out);
            }
            log::warn!("⚠️ Índice de pendientes desincronizado, usando full scan");
        }

        Ok(map.into_values().filter(|e| !e.synced).collect())
    }

    /// Todas las ediciones (sincronizadas o no) para una fecha de servicio.
    /// Permite que un día reabierto muestre lo pendiente local encima de lo remoto.
    pub fn list_by_date(&self, date: NaiveDate) -> Result<Vec<PendingAttendanceEdit>, AppError> {
        let map = self.load_pending_map()?;
        Ok(map
            .into_values()
            .filter(|e| e.service_date == date)
            .collect())
    }

    /// Marca synced = true para cada clave encontrada; claves inexistentes
    /// se ignoran sin error.
    pub fn mark_synced(&self, keys: &[String]) -> Result<(), AppError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut map = self.load_pending_map()?;
        let mut flipped = 0usize;
        for key in keys {
            if let Some(edit) = map.get_mut(key) {
                edit.synced = true;
                flipped += 1;
            }
        }
        self.save_pending_map(&map)?;
        self.rebuild_index(&map);
        log::info!("✅ {} ediciones marcadas como sincronizadas", flipped);
        Ok(())
    }

    /// Borra todo registro con synced = true. Se llama después de cada pasada
    /// de sync, exitosa o no, para acotar el crecimiento del almacenamiento.
    pub fn prune_synced(&self) -> Result<(), AppError> {
        let mut map = self.load_pending_map()?;
        let before = map.len();
        map.retain(|_, e| !e.synced);
        if map.len() != before {
            log::info!("🗑️ Prune: {} registros sincronizados eliminados", before - map.len());
        }
        self.save_pending_map(&map)?;
        self.rebuild_index(&map);
        Ok(())
    }

    /// Conteo para el badge de la UI. Pasa por el listado validado:
    /// un índice stale nunca infla ni desinfla el conteo.
    pub fn count_unsynced(&self) -> Result<usize, AppError> {
        Ok(self.list_unsynced()?.len())
    }

    // ==========================================
    // ROSTER CACHEADO
    // ==========================================

    /// Reemplaza el caché completo del roster (clear + insert) en una sola
    /// escritura de documento: nunca quedan entradas viejas mezcladas.
    pub fn replace_roster(&self, children: &[Child]) -> Result<(), AppError> {
        let cached_at = Utc::now().timestamp_millis();
        let entries: Vec<CachedChild> = children
            .iter()
            .map(|c| CachedChild {
                child_id: c.id.clone(),
                full_name: c.full_name.clone(),
                cached_at,
            })
            .collect();
        let json = serde_json::to_string(&entries)
            .map_err(|e| AppError::StorageUnavailable(format!("error serializando: {}", e)))?;
        self.backend.set(ROSTER_CACHE_KEY, &json)?;
        log::info!("💾 Roster cacheado: {} niños", entries.len());
        Ok(())
    }

    pub fn get_roster(&self) -> Result<Vec<CachedChild>, AppError> {
        match self.backend.get(ROSTER_CACHE_KEY)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    log::error!("❌ Caché de roster corrupto, se descarta: {}", e);
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    /// El caché es válido solo si la entrada MÁS VIEJA está dentro de la
    /// ventana: una sola entrada stale invalida el caché completo.
    /// Un caché vacío nunca es fresco.
    pub fn is_roster_fresh(&self, max_age_hours: i64) -> Result<bool, AppError> {
        let entries = self.get_roster()?;
        let oldest = match entries.iter().map(|e| e.cached_at).min() {
            Some(ts) => ts,
            None => return Ok(false),
        };
        let age_ms = Utc::now().timestamp_millis() - oldest;
        Ok(age_ms <= max_age_hours * 3_600_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::edit_key;

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

    fn mem_db() -> (MemoryBackend, OfflineDb<MemoryBackend>) {
        let backend = MemoryBackend::new();
        let db = OfflineDb::with_backend(backend.clone());
        (backend, db)
    }

    #[test]
    fn put_last_write_wins_per_key() {
        let (_, db) = mem_db();
        db.put(vec![input("A", "2024-01-01", true)]).unwrap();
        db.put(vec![input("A", "2024-01-01", false)]).unwrap();

        let pending = db.list_unsynced().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].child_id, "A");
        assert!(!pending[0].present);
        assert!(!pending[0].synced);
    }

    #[test]
    fn created_at_is_monotonic_within_a_batch() {
        let (_, db) = mem_db();
        db.put(vec![
            input("A", "2024-01-01", true),
            input("B", "2024-01-01", true),
            input("C", "2024-01-01", true),
        ])
        .unwrap();

        let mut stamps: Vec<i64> = db
            .list_unsynced()
            .unwrap()
            .iter()
            .map(|e| e.created_at)
            .collect();
        let original = stamps.clone();
        stamps.sort_unstable();
        stamps.dedup();
        assert_eq!(stamps.len(), 3, "timestamps repetidos: {:?}", original);
    }

    #[test]
    fn mark_synced_ignores_missing_keys() {
        let (_, db) = mem_db();
        db.put(vec![input("A", "2024-01-01", true)]).unwrap();
        db.mark_synced(&[
            edit_key("A", date("2024-01-01")),
            "fantasma_2024-01-01".to_string(),
        ])
        .unwrap();
        assert_eq!(db.count_unsynced().unwrap(), 0);
    }

    #[test]
    fn prune_removes_synced_everywhere() {
        let (_, db) = mem_db();
        db.put(vec![input("A", "2024-01-01", true)]).unwrap();
        db.mark_synced(&[edit_key("A", date("2024-01-01"))]).unwrap();
        db.prune_synced().unwrap();

        assert!(db.list_unsynced().unwrap().is_empty());
        assert!(db.list_by_date(date("2024-01-01")).unwrap().is_empty());
    }

    #[test]
    fn list_by_date_includes_synced_records_until_pruned() {
        let (_, db) = mem_db();
        db.put(vec![input("A", "2024-01-01", true), input("B", "2024-01-02", true)])
            .unwrap();
        db.mark_synced(&[edit_key("A", date("2024-01-01"))]).unwrap();

        let day = db.list_by_date(date("2024-01-01")).unwrap();
        assert_eq!(day.len(), 1);
        assert!(day[0].synced);
        assert!(db.list_unsynced().unwrap().iter().all(|e| e.child_id == "B"));
    }

    /// Backend que falla al escribir una clave específica, para forzar
    /// la falla de la "transacción" del documento principal.
    struct FailingBackend {
        inner: MemoryBackend,
        fail_key: String,
    }

    impl StorageBackend for FailingBackend {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
            if key == self.fail_key {
                return Err(AppError::StorageUnavailable("quota excedida".to_string()));
            }
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), AppError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_batch_put_persists_nothing() {
        let inner = MemoryBackend::new();
        let db = OfflineDb::with_backend(FailingBackend {
            inner: inner.clone(),
            fail_key: PENDING_STORE_KEY.to_string(),
        });

        let batch = vec![
            input("A", "2024-01-01", true),
            input("B", "2024-01-01", true),
            input("C", "2024-01-01", false),
            input("D", "2024-01-01", true),
            input("E", "2024-01-01", false),
        ];
        assert!(matches!(db.put(batch), Err(AppError::StorageUnavailable(_))));

        // Ninguna de las 5 quedó persistida (no un parcial 3-de-5)
        let readable = OfflineDb::with_backend(inner);
        assert!(readable.list_unsynced().unwrap().is_empty());
        assert_eq!(readable.count_unsynced().unwrap(), 0);
    }

    #[test]
    fn list_unsynced_falls_back_when_index_is_corrupt() {
        let (backend, db) = mem_db();
        db.put(vec![input("A", "2024-01-01", true), input("B", "2024-01-01", false)])
            .unwrap();

        backend.set(PENDING_INDEX_KEY, "esto no es json").unwrap();
        assert_eq!(db.list_unsynced().unwrap().len(), 2);

        backend.remove(PENDING_INDEX_KEY).unwrap();
        assert_eq!(db.list_unsynced().unwrap().len(), 2);
        assert_eq!(db.count_unsynced().unwrap(), 2);
    }

    #[test]
    fn list_unsynced_falls_back_when_index_references_missing_keys() {
        let (backend, db) = mem_db();
        db.put(vec![input("A", "2024-01-01", true)]).unwrap();

        backend
            .set(
                PENDING_INDEX_KEY,
                &serde_json::to_string(&["A_2024-01-01", "Z_2024-01-01"]).unwrap(),
            )
            .unwrap();
        let pending = db.list_unsynced().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].child_id, "A");
    }

    #[test]
    fn stale_index_does_not_skew_count() {
        let (backend, db) = mem_db();
        db.put(vec![input("A", "2024-01-01", true)]).unwrap();

        // Índice con una clave fantasma: el conteo sigue la verdad del mapa
        backend
            .set(
                PENDING_INDEX_KEY,
                &serde_json::to_string(&["A_2024-01-01", "Z_2024-01-01"]).unwrap(),
            )
            .unwrap();
        assert_eq!(db.count_unsynced().unwrap(), 1);

        // Índice que perdió una escritura: mismo resultado
        backend.remove(PENDING_INDEX_KEY).unwrap();
        assert_eq!(db.count_unsynced().unwrap(), 1);
    }

    #[test]
    fn roster_replace_is_clear_then_insert() {
        let (_, db) = mem_db();
        let first = vec![
            Child { id: "A".to_string(), full_name: "Ana".to_string() },
            Child { id: "B".to_string(), full_name: "Benito".to_string() },
        ];
        db.replace_roster(&first).unwrap();

        let second = vec![Child { id: "C".to_string(), full_name: "Clara".to_string() }];
        db.replace_roster(&second).unwrap();

        let roster = db.get_roster().unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].child_id, "C");
    }

    fn seed_roster(backend: &MemoryBackend, cached_at: i64) {
        let entries = vec![CachedChild {
            child_id: "A".to_string(),
            full_name: "Ana".to_string(),
            cached_at,
        }];
        backend
            .set(ROSTER_CACHE_KEY, &serde_json::to_string(&entries).unwrap())
            .unwrap();
    }

    #[test]
    fn roster_freshness_boundary() {
        let (backend, db) = mem_db();
        let now = Utc::now().timestamp_millis();

        // 24h + 1ms de antigüedad: stale
        seed_roster(&backend, now - 24 * 3_600_000 - 1);
        assert!(!db.is_roster_fresh(24).unwrap());

        // 23h de antigüedad: fresco
        seed_roster(&backend, now - 23 * 3_600_000);
        assert!(db.is_roster_fresh(24).unwrap());
    }

    #[test]
    fn empty_roster_cache_is_never_fresh() {
        let (_, db) = mem_db();
        assert!(!db.is_roster_fresh(24).unwrap());
        db.replace_roster(&[]).unwrap();
        assert!(!db.is_roster_fresh(24).unwrap());
    }

    #[test]
    fn one_stale_entry_invalidates_whole_cache() {
        let (backend, db) = mem_db();
        let now = Utc::now().timestamp_millis();
        let entries = vec![
            CachedChild {
                child_id: "A".to_string(),
                full_name: "Ana".to_string(),
                cached_at: now,
            },
            CachedChild {
                child_id: "B".to_string(),
                full_name: "Benito".to_string(),
                cached_at: now - 25 * 3_600_000,
            },
        ];
        backend
            .set(ROSTER_CACHE_KEY, &serde_json::to_string(&entries).unwrap())
            .unwrap();
        assert!(!db.is_roster_fresh(24).unwrap());
    }
}
