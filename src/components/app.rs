use yew::prelude::*;

use crate::components::attendance_view::AttendanceView;

#[function_component(App)]
pub fn app() -> Html {
    html! {
        <main class="app">
            <AttendanceView />
        </main>
    }
}
