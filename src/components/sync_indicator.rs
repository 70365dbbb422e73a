// ============================================================================
// SYNC INDICATOR COMPONENT
// ============================================================================
// Indicador persistente mientras haya ediciones en cola local.
// Click = sincronizar ahora.
// ============================================================================

use yew::prelude::*;

use crate::models::SyncState;

#[derive(Properties, PartialEq)]
pub struct SyncIndicatorProps {
    pub state: SyncState,
    pub on_sync_now: Callback<()>,
}

#[function_component(SyncIndicator)]
pub fn sync_indicator(props: &SyncIndicatorProps) -> Html {
    let (icon, text, class) = match &props.state {
        SyncState::Synced => ("✅", "Sincronizado".to_string(), "sync-indicator synced"),
        SyncState::Pending { count } => (
            "🔄",
            format!("{} ediciones pendientes", count),
            "sync-indicator pending",
        ),
        SyncState::Syncing => ("⏳", "Sincronizando...".to_string(), "sync-indicator syncing"),
        SyncState::Offline { pending_count } => (
            "📴",
            format!("Offline - {} pendientes", pending_count),
            "sync-indicator offline",
        ),
        SyncState::Error { message } => (
            "⚠️",
            format!("Error: {}", message),
            "sync-indicator error",
        ),
    };

    let onclick = {
        let on_sync_now = props.on_sync_now.clone();
        Callback::from(move |_| on_sync_now.emit(()))
    };

    html! {
        <div class={class} onclick={onclick} title="Click para sincronizar ahora">
            <span class="sync-icon">{icon}</span>
            <span class="sync-text">{text}</span>
        </div>
    }
}
