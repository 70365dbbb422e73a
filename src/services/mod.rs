pub mod api_client;
pub mod network_monitor;
pub mod offline_db;
pub mod sync_service;

#[cfg(test)]
pub mod test_support;

pub use api_client::{ApiClient, AttendanceRemote};
pub use network_monitor::{NetworkMonitor, NetworkStatus};
pub use offline_db::{AppDb, LocalStorageBackend, MemoryBackend, OfflineDb, StorageBackend};
pub use sync_service::SyncService;
