//! # Spice Core
//!
//! 核心資料模型與類型定義

pub mod batch;
pub mod config;
pub mod context;
pub mod formulation;
pub mod material;
pub mod movement;
pub mod requirement;
pub mod research;
pub mod store;
pub mod unit;

// Re-export 主要類型
pub use batch::{BatchSnapshot, BatchStatus, BatchSummary, ProductionBatch};
pub use config::EngineConfig;
pub use context::OperatorContext;
pub use formulation::{Formulation, FormulationIngredient, FormulationStatus};
pub use material::{MaterialStatus, RawMaterial};
pub use movement::{fold_balance, MovementReason, StockAction, StockMovement};
pub use requirement::{MaterialRequirement, Sufficiency, SubstituteCandidate};
pub use research::{PromotionOutcome, ResearchFormulation, ResearchStatus};
pub use store::{BatchStore, FormulationStore, MaterialStore, MovementStore};
pub use unit::{normalize, Unit};

use rust_decimal::Decimal;
use uuid::Uuid;

/// 核心錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum SpiceError {
    #[error("無效的數量: {0}")]
    InvalidQuantity(Decimal),

    #[error("無效的百分比: {0}")]
    InvalidPercentage(Decimal),

    #[error("無法識別的單位: {0}")]
    UnknownUnit(String),

    #[error("找不到配方: {0}")]
    FormulationNotFound(String),

    #[error("找不到原料: {0}")]
    MaterialNotFound(Uuid),

    #[error("找不到生產批次: {0}")]
    BatchNotFound(Uuid),

    #[error("找不到研發配方: {0}")]
    ResearchNotFound(Uuid),

    #[error("配方沒有任何原料: {0}")]
    IngredientsNotFound(String),

    #[error("配方 {name} 百分比合計 {total}，應為 100")]
    PercentageSumMismatch { name: String, total: Decimal },

    #[error("配方名稱重複: {0}")]
    DuplicateFormulationName(String),

    #[error("配方 {formulation} 重複使用原料 {material_id}")]
    DuplicateIngredient { formulation: String, material_id: Uuid },

    #[error("生產批次已確認: {0}")]
    BatchAlreadyConfirmed(Uuid),

    #[error("生產批次草稿已被其他操作修改: {0}")]
    BatchModified(Uuid),

    #[error("物料需求與批次不符: {0}")]
    RequirementMismatch(String),

    #[error("研發配方無法核准: {0}")]
    ResearchNotApprovable(String),

    #[error("原料 {name} 單位不可由 {from} 變更為 {to}")]
    ImmutableUnit { name: String, from: Unit, to: Unit },

    #[error("配置錯誤: {0}")]
    Config(String),

    #[error("儲存層錯誤: {0}")]
    Persistence(String),
}

impl SpiceError {
    /// 是否可由呼叫端整體重試
    ///
    /// 只有儲存層失敗可重試；核心本身從不自動重試。
    pub fn is_retryable(&self) -> bool {
        matches!(self, SpiceError::Persistence(_))
    }
}

pub type Result<T> = std::result::Result<T, SpiceError>;

/// 檢查數量必須為正數
pub fn ensure_positive(quantity: Decimal) -> Result<Decimal> {
    if quantity <= Decimal::ZERO {
        return Err(SpiceError::InvalidQuantity(quantity));
    }
    Ok(quantity)
}

/// 安全除法：分母為零時回傳零
pub fn guarded_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}
