pub mod app;
pub mod attendance_view;
pub mod sync_indicator;

pub use app::App;
pub use attendance_view::AttendanceView;
pub use sync_indicator::SyncIndicator;
