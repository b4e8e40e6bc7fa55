//! # Spice Store
//!
//! 庫存帳、批次確認與研發配方晉升

pub mod confirmation;
pub mod ledger;
pub mod memory;
pub mod promotion;

// Re-export 主要類型
pub use confirmation::BatchConfirmation;
pub use ledger::StockLedger;
pub use memory::MemoryStore;
pub use promotion::ResearchPromotion;
