//! # Spice Calculation Engine
//!
//! 配方縮放、物料需求解析與批次成本彙總

pub mod aggregate;
pub mod resolver;
pub mod scaling;

// Re-export 主要類型
pub use aggregate::{
    BatchAggregator, PackagingLine, PackagingSummary, SalesLine, SalesSummary,
};
pub use resolver::RequirementResolver;
pub use scaling::{ScaledIngredient, ScalingEngine};

use rust_decimal::Decimal;
use serde::Serialize;
use spice_core::{guarded_div, MaterialRequirement, Unit};

/// 物料需求計算結果
#[derive(Debug, Clone, Serialize)]
pub struct RequirementPlan {
    /// 計劃數量
    pub planned_quantity: Decimal,

    /// 配方基準單位
    pub unit: Unit,

    /// 各原料需求（依配方原料順序）
    pub requirements: Vec<MaterialRequirement>,

    /// 警告信息
    pub warnings: Vec<CalcWarning>,
}

impl RequirementPlan {
    /// 是否所有原料庫存都足夠
    pub fn all_sufficient(&self) -> bool {
        self.requirements
            .iter()
            .all(|r| r.sufficiency == spice_core::Sufficiency::Sufficient)
    }

    /// 原料總成本
    pub fn total_cost(&self) -> Decimal {
        self.requirements.iter().map(|r| r.cost).sum()
    }

    /// 每基準單位的混合成本
    pub fn blended_unit_cost(&self) -> Decimal {
        guarded_div(self.total_cost(), self.planned_quantity)
    }
}

/// 計算警告（資料完整性問題，不中斷計算）
#[derive(Debug, Clone, Serialize)]
pub struct CalcWarning {
    pub subject: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl CalcWarning {
    pub fn new(subject: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            subject,
            message,
            severity,
        }
    }

    pub fn info(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Info)
    }

    pub fn warning(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Warning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningSeverity {
    Info,
    Warning,
}
