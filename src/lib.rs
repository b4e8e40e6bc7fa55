//! # Spice Ledger
//!
//! 香料加工廠的庫存帳、配方縮放與批次成本引擎

pub mod report;
pub mod service;

pub use report::LowStockAlert;
pub use service::ProductionService;

pub use spice_calc::{
    BatchAggregator, CalcWarning, PackagingLine, PackagingSummary, RequirementPlan,
    RequirementResolver, SalesLine, SalesSummary, ScalingEngine, WarningSeverity,
};
pub use spice_core::*;
pub use spice_store::{BatchConfirmation, MemoryStore, ResearchPromotion, StockLedger};
