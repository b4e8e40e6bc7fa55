//! # Spice Cache
//!
//! 餘額檢查點與增量重算模組
//!
//! 異動紀錄永遠是唯一來源；檢查點只彙總已寫入的前綴，
//! 讀取時以「檢查點 + 之後的異動」重算，從不視為權威值。

pub mod checkpoint;
pub mod dirty_tracking;

// Re-export 主要類型
pub use checkpoint::{BalanceCheckpoints, Checkpoint};
pub use dirty_tracking::DirtyTracker;
