pub mod sync_store;

pub use sync_store::SyncStore;
