// ============================================================================
// ASISTENCIA PWA - CAPTURA OFFLINE-FIRST CON SINCRONIZACIÓN AUTOMÁTICA
// ============================================================================
// Arquitectura MVVM:
// - Components: render Yew (sin lógica de negocio)
// - ViewModels: lógica de captura y merge remoto + local
// - Services: store local durable, monitor de red, API, sync engine
// - Models: tipos compartidos con el backend
// ============================================================================

pub mod components;
pub mod error;
pub mod hooks;
pub mod models;
pub mod services;
pub mod stores;
pub mod utils;
pub mod viewmodels;

use wasm_bindgen::prelude::*;

use crate::components::App;

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("🚀 Asistencia PWA iniciando...");

    yew::Renderer::<App>::new().render();
    Ok(())
}
