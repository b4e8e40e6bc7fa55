//! 原料模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Unit;

/// 原料狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialStatus {
    /// 啟用
    Active,
    /// 停用
    Inactive,
}

/// 原料主檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterial {
    /// 原料ID
    pub id: Uuid,

    /// 顯示名稱
    pub name: String,

    /// 基準單位（建立後不可變更，否則歷史異動失真）
    unit: Unit,

    /// 每基準單位成本
    pub cost_per_unit: Decimal,

    /// 最低庫存
    pub minimum_stock: Decimal,

    /// 狀態
    pub status: MaterialStatus,
}

impl RawMaterial {
    /// 創建新的原料
    pub fn new(name: impl Into<String>, unit: Unit, cost_per_unit: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            unit,
            cost_per_unit,
            minimum_stock: Decimal::ZERO,
            status: MaterialStatus::Active,
        }
    }

    /// 建構器模式：設置最低庫存
    pub fn with_minimum_stock(mut self, minimum_stock: Decimal) -> Self {
        self.minimum_stock = minimum_stock;
        self
    }

    /// 建構器模式：設為停用
    pub fn as_inactive(mut self) -> Self {
        self.status = MaterialStatus::Inactive;
        self
    }

    /// 基準單位
    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn is_active(&self) -> bool {
        self.status == MaterialStatus::Active
    }

    /// 檢查庫存是否低於最低庫存
    pub fn is_below_minimum(&self, balance: Decimal) -> bool {
        balance < self.minimum_stock
    }
}
