// ============================================================================
// ERRORES TIPADOS DE LA APP
// ============================================================================
// Todos los servicios devuelven Result<_, AppError> - nada de errores String
// cruzando límites de módulo, nada de catch silencioso
// ============================================================================

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    /// El almacenamiento local no se puede abrir o escribir.
    /// Quien llama debe degradar a "sin capacidad offline", nunca crashear.
    #[error("almacenamiento local no disponible: {0}")]
    StorageUnavailable(String),

    /// Offline y sin caché fresco: hay que avisarle al usuario,
    /// nunca mostrar una lista vacía en silencio.
    #[error("sin datos disponibles en modo offline")]
    NoDataAvailable,

    /// Falla a nivel fetch/timeout/offline explícito.
    /// En los paths de guardado dispara el fallback a la cola local.
    #[error("error de red: {0}")]
    Network(String),

    /// El backend respondió con estado HTTP no-OK.
    #[error("error del servidor: {0}")]
    Remote(String),

    /// Entrada rechazada antes de cualquier I/O (ej. nota demasiado larga).
    #[error("validación: {0}")]
    Validation(String),
}

impl AppError {
    /// ¿La falla es consistente con pérdida de conectividad?
    pub fn is_network_class(&self) -> bool {
        matches!(self, AppError::Network(_))
    }
}
