// ============================================================================
// MONITOR DE ESTADO DE RED
// ============================================================================
// Detecta transiciones online/offline del browser y expone un chequeo de
// conectividad real (probe HEAD) antes de confiar en "online":
// navigator.onLine refleja el estado del link, no que el backend responda.
// ============================================================================

use std::sync::{Arc, Mutex};

use gloo_net::http::{Method, RequestBuilder};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Event, RequestCache};

use crate::utils::constants::PROBE_URL;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NetworkStatus {
    Online,
    Offline,
    Unknown,
}

/// Latch del flanco offline → online: `release()` devuelve true exactamente
/// una vez por cada `trip()` previo. Un evento "online" estando ya online
/// no dispara nada.
struct EdgeLatch {
    armed: Mutex<bool>,
}

impl EdgeLatch {
    fn new(armed: bool) -> Self {
        Self {
            armed: Mutex::new(armed),
        }
    }

    /// Evento offline: arma el latch
    fn trip(&self) {
        *self.armed.lock().unwrap() = true;
    }

    /// Evento online: true solo si veníamos de offline
    fn release(&self) -> bool {
        let mut armed = self.armed.lock().unwrap();
        std::mem::replace(&mut *armed, false)
    }
}

/// Monitor de red con listeners de eventos del window.
/// Previene registros duplicados de listeners (memory leaks).
pub struct NetworkMonitor {
    status: Arc<Mutex<NetworkStatus>>,
    monitoring_started: Arc<Mutex<bool>>,
}

impl NetworkMonitor {
    pub fn new() -> Self {
        let status = Arc::new(Mutex::new(NetworkStatus::Unknown));

        // Estado inicial desde navigator.onLine
        if let Some(window) = window() {
            let navigator_obj = js_sys::Reflect::get(&window, &JsValue::from_str("navigator")).ok();
            if let Some(nav) = navigator_obj {
                let on_line = js_sys::Reflect::get(&nav, &JsValue::from_str("onLine"))
                    .ok()
                    .and_then(|v| v.as_bool());
                if let Some(is_online) = on_line {
                    *status.lock().unwrap() = if is_online {
                        NetworkStatus::Online
                    } else {
                        NetworkStatus::Offline
                    };
                }
            }
        }

        Self {
            status,
            monitoring_started: Arc::new(Mutex::new(false)),
        }
    }

    /// Estado actual de red
    pub fn current_status(&self) -> NetworkStatus {
        *self.status.lock().unwrap()
    }

    /// Flag booleano de plataforma. Unknown se trata como online
    /// (el probe de check_connection es el que decide en serio).
    pub fn is_online(&self) -> bool {
        !matches!(self.current_status(), NetworkStatus::Offline)
    }

    /// Chequeo de conectividad real: false inmediato si la plataforma dice
    /// offline; si no, probe HEAD same-origin sin caché. Solo un response
    /// exitoso cuenta como online.
    pub async fn check_connection(&self) -> bool {
        if !self.is_online() {
            return false;
        }

        let probe = RequestBuilder::new(PROBE_URL)
            .method(Method::HEAD)
            .cache(RequestCache::NoStore)
            .send()
            .await;

        match probe {
            Ok(response) if response.ok() => true,
            Ok(response) => {
                log::warn!("⚠️ Probe de conectividad respondió HTTP {}", response.status());
                false
            }
            Err(e) => {
                log::warn!("📴 Probe de conectividad falló: {}", e);
                false
            }
        }
    }

    /// Registra un callback que se dispara exactamente una vez por flanco
    /// offline → online (no en cada evento "online" si ya estábamos online).
    /// Solo se registra una vez; llamadas duplicadas se ignoran.
    pub fn on_transition_to_online<F>(&mut self, callback: F)
    where
        F: Fn() + 'static,
    {
        {
            let mut started = self.monitoring_started.lock().unwrap();
            if *started {
                log::warn!("⚠️ NetworkMonitor: listeners ya registrados, ignorando llamada duplicada");
                return;
            }
            *started = true;
        }

        let window = match window() {
            Some(w) => w,
            None => return,
        };

        let status = self.status.clone();
        // Armado si arrancamos offline
        let latch = Arc::new(EdgeLatch::new(matches!(
            self.current_status(),
            NetworkStatus::Offline
        )));
        let callback = Arc::new(callback);

        let online_closure = Closure::wrap(Box::new({
            let status = status.clone();
            let latch = latch.clone();
            let callback = callback.clone();
            move |_event: Event| {
                *status.lock().unwrap() = NetworkStatus::Online;
                if latch.release() {
                    log::info!("🌐 Red: ONLINE (transición desde offline)");
                    callback();
                } else {
                    log::info!("🌐 Red: evento online redundante, sin acción");
                }
            }
        }) as Box<dyn FnMut(Event)>);

        let offline_closure = Closure::wrap(Box::new({
            let status = status.clone();
            let latch = latch.clone();
            move |_event: Event| {
                log::warn!("📴 Red: OFFLINE");
                *status.lock().unwrap() = NetworkStatus::Offline;
                latch.trip();
            }
        }) as Box<dyn FnMut(Event)>);

        let _ = window
            .add_event_listener_with_callback("online", online_closure.as_ref().unchecked_ref());
        let _ = window
            .add_event_listener_with_callback("offline", offline_closure.as_ref().unchecked_ref());

        // Los listeners de window viven toda la sesión de la app
        online_closure.forget();
        offline_closure.forget();

        log::info!("✅ NetworkMonitor: listeners de transición registrados");
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}
