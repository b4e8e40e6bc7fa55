//! 生產批次模型

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MaterialRequirement, Unit};

/// 批次狀態（draft → confirmed 僅一次）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Draft,
    Confirmed,
}

/// 批次成本彙總
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// 原料總耗用（實際數量合計）
    pub total_raw_material_consumed: Decimal,

    /// 最終產出
    pub final_output_quantity: Decimal,

    /// 損耗
    pub loss_quantity: Decimal,

    /// 生產總成本
    pub total_production_cost: Decimal,

    /// 每基準單位成本
    pub cost_per_base_unit: Decimal,
}

/// 確認時凍結的需求與成本快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub requirements: Vec<MaterialRequirement>,
    pub summary: BatchSummary,
    pub confirmed_by: String,
    pub confirmed_at: DateTime<Utc>,
}

/// 生產批次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBatch {
    /// 批次ID
    pub id: Uuid,

    /// 配方ID
    pub formulation_id: Uuid,

    /// 每批計劃數量
    pub planned_quantity: Decimal,

    /// 批數
    pub lots: u32,

    /// 前批結轉數量
    pub carried_forward_quantity: Decimal,

    /// 單位（配方基準單位）
    pub unit: Unit,

    /// 生產日期
    pub production_date: NaiveDate,

    /// 狀態
    pub status: BatchStatus,

    /// 草稿階段的物料需求
    pub requirements: Vec<MaterialRequirement>,

    /// 確認快照
    pub snapshot: Option<BatchSnapshot>,

    /// 草稿版本（每次更新草稿遞增）
    #[serde(default)]
    pub revision: u64,
}

impl ProductionBatch {
    /// 創建新的草稿批次
    pub fn new(
        formulation_id: Uuid,
        planned_quantity: Decimal,
        lots: u32,
        unit: Unit,
        production_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            formulation_id,
            planned_quantity,
            lots,
            carried_forward_quantity: Decimal::ZERO,
            unit,
            production_date,
            status: BatchStatus::Draft,
            requirements: Vec::new(),
            snapshot: None,
            revision: 0,
        }
    }

    /// 建構器模式：設置前批結轉數量
    pub fn with_carried_forward(mut self, quantity: Decimal) -> Self {
        self.carried_forward_quantity = quantity;
        self
    }

    /// 建構器模式：設置物料需求
    pub fn with_requirements(mut self, requirements: Vec<MaterialRequirement>) -> Self {
        self.requirements = requirements;
        self
    }

    /// 本次需投料生產的數量（計劃 × 批數）
    pub fn production_quantity(&self) -> Decimal {
        self.planned_quantity * Decimal::from(self.lots)
    }

    /// 最終產出（計劃 × 批數 + 結轉）
    pub fn final_output_quantity(&self) -> Decimal {
        self.production_quantity() + self.carried_forward_quantity
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BatchStatus::Confirmed
    }

    /// 批次參考編號（寫入出庫異動）
    pub fn reference(&self) -> String {
        format!("BATCH-{}", self.id.simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_final_output_quantity() {
        let batch = ProductionBatch::new(
            Uuid::new_v4(),
            dec!(50),
            3,
            Unit::Kilogram,
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
        )
        .with_carried_forward(dec!(4.5));

        assert_eq!(batch.production_quantity(), dec!(150));
        assert_eq!(batch.final_output_quantity(), dec!(154.5));
        assert_eq!(batch.status, BatchStatus::Draft);
        assert!(!batch.is_confirmed());
    }

    #[test]
    fn test_reference_format() {
        let batch = ProductionBatch::new(
            Uuid::new_v4(),
            dec!(1),
            1,
            Unit::Gram,
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
        );
        assert!(batch.reference().starts_with("BATCH-"));
        assert_eq!(batch.reference().len(), "BATCH-".len() + 32);
    }
}
