//! # Edit Session Cache
//!
//! 儲存前累積的編輯覆蓋層、髒產線追蹤、版本計數與批次儲存

pub mod dirty_tracking;
pub mod session;
pub mod store;

pub use dirty_tracking::DirtyTracker;
pub use session::EditSession;
pub use store::{CapacitySaveBatch, DemandSaveBatch, MemoryStore, SimulationStore};
