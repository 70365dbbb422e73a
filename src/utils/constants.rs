/// URL base del backend
/// Configurada en tiempo de compilación:
/// - Desarrollo: http://localhost:3000 (por defecto)
/// - Producción: via BACKEND_URL env var (.env cargado por build.rs)
pub const BACKEND_URL: &str = match option_env!("BACKEND_URL") {
    Some(url) => url,
    None => "http://localhost:3000",
};

/// Recurso estático same-origin para el probe de conectividad (HEAD, sin caché).
/// navigator.onLine solo refleja el estado del link, no que el backend responda.
pub const PROBE_URL: &str = "/manifest.json";

// Claves de documentos en localStorage
pub const PENDING_STORE_KEY: &str = "asistencia_pending_v1";
pub const PENDING_INDEX_KEY: &str = "asistencia_pending_idx_v1";
pub const ROSTER_CACHE_KEY: &str = "asistencia_ninos_v1";

/// Largo máximo de la nota de asistencia
pub const MAX_NOTES_LEN: usize = 500;

/// Ventana de frescura del roster cacheado (horas)
pub const ROSTER_MAX_AGE_HOURS: i64 = 24;

/// Reintento periódico de la cola pendiente (ms) - además del trigger
/// por reconexión, drena grupos que fallaron estando "online"
pub const SYNC_RETRY_INTERVAL_MS: u32 = 5 * 60 * 1000;
