pub mod attendance;
pub mod child;
pub mod sync;

pub use attendance::{
    edit_key, AttendanceRecord, AttendanceRow, EditInput, PendingAttendanceEdit, RemoteAttendance,
};
pub use child::{CachedChild, Child};
pub use sync::{SaveOutcome, SyncResult, SyncState};
