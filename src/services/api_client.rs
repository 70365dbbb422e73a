// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP (Stateless)
// ============================================================================
// NO tiene lógica de negocio, solo hace requests HTTP contra el backend
// ============================================================================

use chrono::NaiveDate;
use gloo_net::http::Request;

use crate::error::AppError;
use crate::models::{AttendanceRow, Child, RemoteAttendance};
use crate::utils::constants::BACKEND_URL;

/// Colaborador remoto de la tabla de asistencia. Seam para inyectar un
/// mock en los tests del Sync Engine y el ViewModel.
#[allow(async_fn_in_trait)]
pub trait AttendanceRemote {
    /// Roster completo, ordenado por nombre
    async fn list_children(&self) -> Result<Vec<Child>, AppError>;

    /// Filas de asistencia remotas para una fecha de servicio
    async fn list_attendance(&self, date: NaiveDate) -> Result<Vec<RemoteAttendance>, AppError>;

    /// Upsert por lotes con conflict target (child_id, service_date):
    /// una fila existente para ese niño+fecha se sobreescribe, no se duplica.
    async fn upsert_attendance(&self, rows: &[AttendanceRow]) -> Result<(), AppError>;
}

/// Cliente API - SOLO comunicación HTTP (stateless)
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            base_url: BACKEND_URL.to_string(),
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendanceRemote for ApiClient {
    async fn list_children(&self) -> Result<Vec<Child>, AppError> {
        let url = format!("{}/v1/children", self.base_url);
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Network error: {}", e)))?;
        if !response.ok() {
            return Err(AppError::Remote(format!(
                "HTTP {}: {}",
                response.status(),
                response.status_text()
            )));
        }
        response
            .json::<Vec<Child>>()
            .await
            .map_err(|e| AppError::Remote(format!("Parse error: {}", e)))
    }

    async fn list_attendance(&self, date: NaiveDate) -> Result<Vec<RemoteAttendance>, AppError> {
        let url = format!(
            "{}/v1/attendance?service_date={}",
            self.base_url,
            date.format("%Y-%m-%d")
        );
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Network error: {}", e)))?;
        if !response.ok() {
            return Err(AppError::Remote(format!(
                "HTTP {}: {}",
                response.status(),
                response.status_text()
            )));
        }
        response
            .json::<Vec<RemoteAttendance>>()
            .await
            .map_err(|e| AppError::Remote(format!("Parse error: {}", e)))
    }

    async fn upsert_attendance(&self, rows: &[AttendanceRow]) -> Result<(), AppError> {
        let url = format!("{}/v1/attendance/upsert", self.base_url);

        log::info!("📤 Enviando upsert de {} filas de asistencia", rows.len());

        let response = Request::post(&url)
            .json(&rows)
            .map_err(|e| AppError::Network(format!("Serialization error: {}", e)))?
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Network error: {}", e)))?;

        if !response.ok() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Remote(format!("HTTP {}: {}", status, error_text)));
        }

        Ok(())
    }
}
