pub mod attendance_viewmodel;

pub use attendance_viewmodel::{AttendanceViewModel, RosterLoad, RosterSource};
