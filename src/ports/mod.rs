//! Seams to the outside world: the remote user service and local storage.

pub mod remote;
pub mod overlay;

pub use remote::{bounded, RemoteSource};
pub use overlay::{file_slot, FileSlot, MemorySlot, OverlayRepository, OverlayStore, StorageSlot, OVERLAY_KEY};
