use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Edición de asistencia tal como la captura la vista (sin timestamps)
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct EditInput {
    pub child_id: String,
    pub service_date: NaiveDate,
    pub present: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub recorded_by: Option<String>,
}

/// Edición pendiente persistida en el almacenamiento local.
/// Clave compuesta: exactamente una edición pendiente por (niño, fecha);
/// una nueva edición para la misma clave pisa la anterior (last-write-wins).
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct PendingAttendanceEdit {
    pub child_id: String,
    pub service_date: NaiveDate,
    pub present: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub recorded_by: Option<String>,
    /// Timestamp de captura (UTC, milisegundos)
    pub created_at: i64,
    /// false hasta que el Sync Engine confirme el upsert remoto.
    /// Un registro con synced = true es transitorio: vive solo hasta el
    /// próximo prune.
    #[serde(default)]
    pub synced: bool,
}

impl PendingAttendanceEdit {
    /// Clave primaria `{child_id}_{YYYY-MM-DD}`
    pub fn key(&self) -> String {
        edit_key(&self.child_id, self.service_date)
    }

    pub fn from_input(input: EditInput, created_at: i64) -> Self {
        Self {
            child_id: input.child_id,
            service_date: input.service_date,
            present: input.present,
            notes: input.notes,
            recorded_by: input.recorded_by,
            created_at,
            synced: false,
        }
    }
}

pub fn edit_key(child_id: &str, service_date: NaiveDate) -> String {
    format!("{}_{}", child_id, service_date.format("%Y-%m-%d"))
}

/// Fila de la tabla remota de asistencia (shape del wire).
/// El upsert remoto resuelve conflictos por (child_id, service_date):
/// una fila existente para ese niño+fecha se sobreescribe, no se duplica.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct AttendanceRow {
    pub child_id: String,
    pub service_date: NaiveDate,
    pub present: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub recorded_by: Option<String>,
}

impl From<&PendingAttendanceEdit> for AttendanceRow {
    fn from(edit: &PendingAttendanceEdit) -> Self {
        Self {
            child_id: edit.child_id.clone(),
            service_date: edit.service_date,
            present: edit.present,
            notes: edit.notes.clone(),
            recorded_by: edit.recorded_by.clone(),
        }
    }
}

impl From<&EditInput> for AttendanceRow {
    fn from(input: &EditInput) -> Self {
        Self {
            child_id: input.child_id.clone(),
            service_date: input.service_date,
            present: input.present,
            notes: input.notes.clone(),
            recorded_by: input.recorded_by.clone(),
        }
    }
}

/// Fila de asistencia remota para una fecha (lo que devuelve el backend)
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct RemoteAttendance {
    pub child_id: String,
    pub present: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Proyección combinada remoto + local para mostrar en la vista.
/// Para una misma clave lo local siempre gana: una edición pendiente
/// representa la intención más reciente del usuario, no puede ser pisada
/// por una lectura remota vieja.
#[derive(Clone, PartialEq, Debug)]
pub struct AttendanceRecord {
    pub child_id: String,
    pub present: bool,
    pub notes: Option<String>,
    /// true si el valor viene de una edición local aún no confirmada
    pub pending_local: bool,
}
