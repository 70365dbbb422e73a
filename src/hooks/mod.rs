pub mod use_auto_sync;

pub use use_auto_sync::{use_auto_sync, UseAutoSyncHandle};
