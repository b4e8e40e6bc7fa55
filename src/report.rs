//! 低庫存報表

use rust_decimal::Decimal;
use serde::Serialize;
use spice_core::{RawMaterial, Unit};
use uuid::Uuid;

/// 低於最低庫存的原料
#[derive(Debug, Clone, Serialize)]
pub struct LowStockAlert {
    pub material_id: Uuid,
    pub name: String,
    pub unit: Unit,
    pub balance: Decimal,
    pub minimum_stock: Decimal,
    /// 補足到最低庫存所需數量
    pub shortfall: Decimal,
}

impl LowStockAlert {
    /// 餘額低於最低庫存時產生警示
    pub fn check(material: &RawMaterial, balance: Decimal) -> Option<Self> {
        if !material.is_below_minimum(balance) {
            return None;
        }
        Some(Self {
            material_id: material.id,
            name: material.name.clone(),
            unit: material.unit(),
            balance,
            minimum_stock: material.minimum_stock,
            shortfall: material.minimum_stock - balance,
        })
    }
}
