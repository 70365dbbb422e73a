use web_sys::{window, Storage};

pub fn get_local_storage() -> Option<Storage> {
    window()?.local_storage().ok()?
}

/// Identificador del usuario activo (seteado por la capa de login,
/// fuera del alcance de este core). None si no hay sesión.
pub fn current_user() -> Option<String> {
    get_local_storage()?.get_item("usuario_actual").ok()?
}
