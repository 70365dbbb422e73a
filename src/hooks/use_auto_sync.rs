// ============================================================================
// USE AUTO SYNC HOOK
// ============================================================================
// Cablea la sincronización automática:
// - al flanco offline → online del NetworkMonitor (exactamente una vez
//   por reconexión, verificada con el probe real)
// - reintento periódico para grupos que fallaron estando "online"
// - force_sync manual para el botón del indicador
// Cuando una pasada confirma ediciones, emite on_synced para que la vista
// recargue la fecha en pantalla con el estado confirmado por el server.
// ============================================================================

use std::rc::Rc;

use gloo_timers::callback::Interval;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::models::SyncResult;
use crate::services::{ApiClient, AppDb, NetworkMonitor, SyncService};
use crate::utils::constants::SYNC_RETRY_INTERVAL_MS;

pub struct UseAutoSyncHandle {
    pub is_syncing: UseStateHandle<bool>,
    pub pending_count: UseStateHandle<usize>,
    pub last_result: UseStateHandle<Option<SyncResult>>,
    pub force_sync: Callback<()>,
}

#[hook]
pub fn use_auto_sync(on_synced: Callback<usize>) -> UseAutoSyncHandle {
    let is_syncing = use_state(|| false);
    let pending_count = use_state(|| 0usize);
    let last_result = use_state(|| None::<SyncResult>);
    let interval_handle = use_mut_ref(|| None::<Interval>);

    // Badge inicial al montar
    {
        let pending_count = pending_count.clone();
        use_effect_with((), move |_| {
            let sync = SyncService::new(Rc::new(AppDb::new()), ApiClient::new());
            pending_count.set(sync.pending_count());
        });
    }

    let sync_fn = {
        let is_syncing = is_syncing.clone();
        let pending_count = pending_count.clone();
        let last_result = last_result.clone();
        let on_synced = on_synced.clone();

        Callback::from(move |_| {
            // Dos pasadas concurrentes son seguras pero inflan los totales;
            // saltamos el caso común acá
            if *is_syncing {
                log::info!("🔄 Sincronización ya en progreso, saltando...");
                return;
            }

            let is_syncing = is_syncing.clone();
            let pending_count = pending_count.clone();
            let last_result = last_result.clone();
            let on_synced = on_synced.clone();

            spawn_local(async move {
                is_syncing.set(true);

                let monitor = NetworkMonitor::new();
                if !monitor.check_connection().await {
                    log::info!("📴 Sin conectividad real, la cola espera");
                    is_syncing.set(false);
                    return;
                }

                let sync = SyncService::new(Rc::new(AppDb::new()), ApiClient::new());
                let result = sync.sync_pending().await;
                pending_count.set(sync.pending_count());

                if result.synced > 0 {
                    on_synced.emit(result.synced);
                }
                last_result.set(Some(result));
                is_syncing.set(false);
            });
        })
    };

    // Trigger por reconexión + reintento periódico
    {
        let sync_fn = sync_fn.clone();
        let interval_handle = interval_handle.clone();

        use_effect_with((), move |_| {
            let mut monitor = NetworkMonitor::new();
            {
                let sync_fn = sync_fn.clone();
                monitor.on_transition_to_online(move || {
                    log::info!("🌐 Conexión restaurada - drenando cola automáticamente");
                    sync_fn.emit(());
                });
            }

            let interval = Interval::new(SYNC_RETRY_INTERVAL_MS, move || {
                sync_fn.emit(());
            });
            *interval_handle.borrow_mut() = Some(interval);

            let interval_handle = interval_handle.clone();
            move || {
                *interval_handle.borrow_mut() = None;
            }
        });
    }

    let force_sync = sync_fn;

    UseAutoSyncHandle {
        is_syncing,
        pending_count,
        last_result,
        force_sync,
    }
}
