// ============================================================================
// VISTA DE CAPTURA DE ASISTENCIA
// ============================================================================
// Pantalla principal: roster del día con toggle presente/ausente y notas.
// El guardado decide online/offline vía el ViewModel; el banner distingue
// "guardado" / "guardado offline, se sincronizará" / "error, reintentá".
// ============================================================================

use std::collections::HashMap;
use std::rc::Rc;

use chrono::{NaiveDate, Utc};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::error::AppError;
use crate::hooks::use_auto_sync;
use crate::models::{AttendanceRecord, Child, EditInput, SaveOutcome};
use crate::components::sync_indicator::SyncIndicator;
use crate::services::{ApiClient, AppDb, NetworkMonitor};
use crate::stores::SyncStore;
use crate::utils::storage::current_user;
use crate::viewmodels::{AttendanceViewModel, RosterSource};

fn viewmodel() -> AttendanceViewModel<crate::services::LocalStorageBackend, ApiClient> {
    AttendanceViewModel::new(Rc::new(AppDb::new()), ApiClient::new())
}

#[function_component(AttendanceView)]
pub fn attendance_view() -> Html {
    let date = use_state(|| Utc::now().date_naive());
    let roster = use_state(Vec::<Child>::new);
    let records = use_state(HashMap::<String, AttendanceRecord>::new);
    // Ediciones en pantalla todavía no guardadas, por child_id
    let staged = use_state(HashMap::<String, EditInput>::new);
    let banner = use_state(|| None::<(String, &'static str)>);

    // Recarga roster + asistencia combinada para la fecha dada
    let reload = {
        let roster = roster.clone();
        let records = records.clone();
        let banner = banner.clone();

        Callback::from(move |d: NaiveDate| {
            let roster = roster.clone();
            let records = records.clone();
            let banner = banner.clone();

            spawn_local(async move {
                let online = NetworkMonitor::new().check_connection().await;
                let vm = viewmodel();

                match vm.load_roster(online).await {
                    Ok(load) => {
                        match load.source {
                            RosterSource::Remote => banner.set(None),
                            RosterSource::CacheOffline => banner.set(Some((
                                "📴 Modo offline: roster desde caché".to_string(),
                                "banner offline",
                            ))),
                            RosterSource::CacheDegraded => banner.set(Some((
                                "⚠️ Sin conexión con el servidor, mostrando caché".to_string(),
                                "banner degraded",
                            ))),
                        }
                        roster.set(load.children);
                    }
                    Err(AppError::NoDataAvailable) => {
                        roster.set(Vec::new());
                        banner.set(Some((
                            "📭 Sin datos offline: conectate al menos una vez para cachear el roster"
                                .to_string(),
                            "banner error",
                        )));
                    }
                    Err(e) => {
                        roster.set(Vec::new());
                        banner.set(Some((format!("❌ {}", e), "banner error")));
                    }
                }

                records.set(vm.load_attendance_for_date(d, online).await);
            });
        })
    };

    // Auto-sync: al reconectar (y periódicamente) se drena la cola;
    // si confirmó ediciones, recargamos la fecha en pantalla
    let auto_sync = {
        let reload = reload.clone();
        let date = date.clone();
        let banner = banner.clone();
        use_auto_sync(Callback::from(move |synced: usize| {
            banner.set(Some((
                format!("✅ {} ediciones sincronizadas", synced),
                "banner success",
            )));
            reload.emit(*date);
        }))
    };

    // Carga inicial
    {
        let reload = reload.clone();
        let date = date.clone();
        use_effect_with((), move |_| {
            reload.emit(*date);
        });
    }

    let on_date_change = {
        let date = date.clone();
        let staged = staged.clone();
        let reload = reload.clone();
        Callback::from(move |e: Event| {
            let value = e.target_unchecked_into::<HtmlInputElement>().value();
            if let Ok(d) = value.parse::<NaiveDate>() {
                date.set(d);
                staged.set(HashMap::new());
                reload.emit(d);
            }
        })
    };

    // Valor mostrado para un niño: lo staged pisa lo cargado
    let display_for = |child_id: &str| -> (bool, String, bool) {
        if let Some(edit) = staged.get(child_id) {
            return (edit.present, edit.notes.clone().unwrap_or_default(), true);
        }
        match records.get(child_id) {
            Some(r) => (r.present, r.notes.clone().unwrap_or_default(), r.pending_local),
            None => (false, String::new(), false),
        }
    };

    let stage_edit = {
        let staged = staged.clone();
        let date = date.clone();
        Callback::from(move |(child_id, present, notes): (String, bool, String)| {
            let mut map = (*staged).clone();
            let recorded_by = current_user();
            map.insert(
                child_id.clone(),
                EditInput {
                    child_id,
                    service_date: *date,
                    present,
                    notes: if notes.is_empty() { None } else { Some(notes) },
                    recorded_by,
                },
            );
            staged.set(map);
        })
    };

    let on_save = {
        let staged = staged.clone();
        let date = date.clone();
        let banner = banner.clone();
        let reload = reload.clone();
        let pending_count = auto_sync.pending_count.clone();

        Callback::from(move |_| {
            let edits: Vec<EditInput> = staged.values().cloned().collect();
            if edits.is_empty() {
                return;
            }
            let staged = staged.clone();
            let banner = banner.clone();
            let reload = reload.clone();
            let pending_count = pending_count.clone();
            let d = *date;

            spawn_local(async move {
                let online = NetworkMonitor::new().check_connection().await;
                let vm = viewmodel();

                match vm.save(d, edits, online).await {
                    Ok(SaveOutcome::SavedRemote) => {
                        banner.set(Some(("✅ Asistencia guardada".to_string(), "banner success")));
                        staged.set(HashMap::new());
                        reload.emit(d);
                    }
                    Ok(SaveOutcome::SavedOffline) => {
                        banner.set(Some((
                            "📴 Guardado offline, se sincronizará al reconectar".to_string(),
                            "banner offline",
                        )));
                        staged.set(HashMap::new());
                        reload.emit(d);
                    }
                    Err(AppError::Validation(msg)) => {
                        banner.set(Some((format!("⚠️ {}", msg), "banner error")));
                    }
                    Err(e) => {
                        banner.set(Some((
                            format!("❌ No se pudo guardar, reintentá: {}", e),
                            "banner error",
                        )));
                    }
                }
                pending_count.set(vm.pending_count());
            });
        })
    };

    let sync_state = SyncStore::view_state(
        *auto_sync.is_syncing,
        (*auto_sync.last_result).as_ref(),
        *auto_sync.pending_count,
        NetworkMonitor::new().is_online(),
    );

    let on_sync_now = {
        let force_sync = auto_sync.force_sync.clone();
        Callback::from(move |_| force_sync.emit(()))
    };

    html! {
        <div class="attendance-view">
            <header class="attendance-header">
                <h1>{"Asistencia de niños"}</h1>
                <input
                    type="date"
                    value={date.format("%Y-%m-%d").to_string()}
                    onchange={on_date_change}
                />
                <SyncIndicator state={sync_state} on_sync_now={on_sync_now} />
            </header>

            if let Some((message, class)) = (*banner).clone() {
                <div class={class}>{message}</div>
            }

            <ul class="roster">
                { for roster.iter().map(|child| {
                    let (present, notes, pending) = display_for(&child.id);
                    let child_id = child.id.clone();

                    let on_toggle = {
                        let stage_edit = stage_edit.clone();
                        let child_id = child_id.clone();
                        let notes = notes.clone();
                        Callback::from(move |_| {
                            stage_edit.emit((child_id.clone(), !present, notes.clone()));
                        })
                    };

                    let on_notes = {
                        let stage_edit = stage_edit.clone();
                        let child_id = child_id.clone();
                        Callback::from(move |e: Event| {
                            let value = e.target_unchecked_into::<HtmlInputElement>().value();
                            stage_edit.emit((child_id.clone(), present, value));
                        })
                    };

                    html! {
                        <li class="roster-row" key={child.id.clone()}>
                            <label class="roster-name">
                                <input
                                    type="checkbox"
                                    checked={present}
                                    onchange={on_toggle}
                                />
                                { child.full_name.clone() }
                            </label>
                            <input
                                class="roster-notes"
                                type="text"
                                placeholder="Notas"
                                value={notes}
                                onchange={on_notes}
                            />
                            if pending {
                                <span class="pending-marker" title="Pendiente de sincronizar">{"🕓"}</span>
                            }
                        </li>
                    }
                }) }
            </ul>

            <button class="save-button" onclick={on_save} disabled={staged.is_empty()}>
                {"Guardar asistencia"}
            </button>
        </div>
    }
}
