// Doble de test del colaborador remoto. Los clones comparten estado,
// así el test puede inspeccionar las llamadas después de inyectarlo.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{AttendanceRow, Child, RemoteAttendance};
use crate::services::api_client::AttendanceRemote;

#[derive(Clone, Default)]
pub struct MockRemote {
    pub children: Rc<RefCell<Vec<Child>>>,
    /// Si está seteado, list_children falla con este error
    pub children_error: Rc<RefCell<Option<AppError>>>,
    pub attendance: Rc<RefCell<HashMap<NaiveDate, Vec<RemoteAttendance>>>>,
    /// Fechas cuyos upserts devuelven error de servidor
    pub fail_dates: Rc<RefCell<HashSet<NaiveDate>>>,
    /// Si true, todo upsert falla como error de red
    pub network_down: Rc<RefCell<bool>>,
    pub upsert_calls: Rc<RefCell<Vec<Vec<AttendanceRow>>>>,
}

impl MockRemote {
    pub fn with_children(names: &[(&str, &str)]) -> Self {
        let mock = Self::default();
        *mock.children.borrow_mut() = names
            .iter()
            .map(|(id, name)| Child {
                id: (*id).to_string(),
                full_name: (*name).to_string(),
            })
            .collect();
        mock
    }
}

impl AttendanceRemote for MockRemote {
    async fn list_children(&self) -> Result<Vec<Child>, AppError> {
        if let Some(err) = self.children_error.borrow().clone() {
            return Err(err);
        }
        Ok(self.children.borrow().clone())
    }

    async fn list_attendance(&self, date: NaiveDate) -> Result<Vec<RemoteAttendance>, AppError> {
        if *self.network_down.borrow() {
            return Err(AppError::Network("fetch failed".to_string()));
        }
        Ok(self
            .attendance
            .borrow()
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_attendance(&self, rows: &[AttendanceRow]) -> Result<(), AppError> {
        self.upsert_calls.borrow_mut().push(rows.to_vec());
        if *self.network_down.borrow() {
            return Err(AppError::Network("fetch failed".to_string()));
        }
        if let Some(date) = rows.first().map(|r| r.service_date) {
            if self.fail_dates.borrow().contains(&date) {
                return Err(AppError::Remote("HTTP 500: server error".to_string()));
            }
        }
        // Upsert por (child_id, service_date): pisa, no duplica
        let mut attendance = self.attendance.borrow_mut();
        for row in rows {
            let day = attendance.entry(row.service_date).or_default();
            match day.iter_mut().find(|r| r.child_id == row.child_id) {
                Some(existing) => {
                    existing.present = row.present;
                    existing.notes = row.notes.clone();
                }
                None => day.push(RemoteAttendance {
                    child_id: row.child_id.clone(),
                    present: row.present,
                    notes: row.notes.clone(),
                }),
            }
        }
        Ok(())
    }
}
