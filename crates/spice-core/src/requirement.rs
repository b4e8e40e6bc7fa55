//! 物料需求模型（計算結果，批次確認前不落地）

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{normalize, RawMaterial, Result, SpiceError, Unit};

/// 庫存是否足夠（僅供參考，不阻擋生產）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sufficiency {
    Sufficient,
    Insufficient,
}

impl Sufficiency {
    /// 可用量大於或等於需求量即為足夠
    pub fn evaluate(available: Decimal, required: Decimal) -> Self {
        if available >= required {
            Sufficiency::Sufficient
        } else {
            Sufficiency::Insufficient
        }
    }
}

/// 可替代原料（附帶自身庫存與單價快照）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstituteCandidate {
    /// 原料ID
    pub material_id: Uuid,

    /// 名稱
    pub name: String,

    /// 原料基準單位
    pub unit: Unit,

    /// 可用庫存（原料基準單位）
    pub available_stock: Decimal,

    /// 每基準單位成本
    pub cost_per_unit: Decimal,
}

impl SubstituteCandidate {
    pub fn from_material(material: &RawMaterial, available_stock: Decimal) -> Self {
        Self {
            material_id: material.id,
            name: material.name.clone(),
            unit: material.unit(),
            available_stock,
            cost_per_unit: material.cost_per_unit,
        }
    }
}

/// 原料成本
///
/// `quantity` 以 `quantity_unit` 表示，`rate` 以原料自身單位計價，
/// 先換算到原料單位再乘以單價。
pub fn ingredient_cost(
    quantity: Decimal,
    quantity_unit: Unit,
    material_unit: Unit,
    rate: Decimal,
) -> Decimal {
    if quantity_unit == material_unit {
        quantity * rate
    } else {
        normalize(quantity, quantity_unit, material_unit) * rate
    }
}

/// 單一原料的物料需求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRequirement {
    /// 原料ID
    pub material_id: Uuid,

    /// 原料名稱
    pub material_name: String,

    /// 原料基準單位
    pub material_unit: Unit,

    /// 配方百分比
    pub percentage: Decimal,

    /// 需求數量（配方基準單位）
    pub required_quantity: Decimal,

    /// 實際數量（操作人員可調整）
    pub actual_quantity: Decimal,

    /// 配方基準單位
    pub unit: Unit,

    /// 可用庫存（已換算為配方基準單位）
    pub available_stock: Decimal,

    /// 庫存是否足夠
    pub sufficiency: Sufficiency,

    /// 每原料單位成本
    pub rate_per_unit: Decimal,

    /// 成本（依實際數量計算）
    pub cost: Decimal,

    /// 可替代原料
    pub substitutes: Vec<SubstituteCandidate>,
}

impl MaterialRequirement {
    /// 創建新的物料需求
    ///
    /// `material_balance` 為原料基準單位的帳面庫存。
    pub fn new(
        material: &RawMaterial,
        percentage: Decimal,
        required_quantity: Decimal,
        unit: Unit,
        material_balance: Decimal,
    ) -> Self {
        let available_stock = normalize(material_balance, material.unit(), unit);
        Self {
            material_id: material.id,
            material_name: material.name.clone(),
            material_unit: material.unit(),
            percentage,
            required_quantity,
            actual_quantity: required_quantity,
            unit,
            available_stock,
            sufficiency: Sufficiency::evaluate(available_stock, required_quantity),
            rate_per_unit: material.cost_per_unit,
            cost: ingredient_cost(
                required_quantity,
                unit,
                material.unit(),
                material.cost_per_unit,
            ),
            substitutes: Vec::new(),
        }
    }

    /// 建構器模式：設置可替代原料
    pub fn with_substitutes(mut self, substitutes: Vec<SubstituteCandidate>) -> Self {
        self.substitutes = substitutes;
        self
    }

    /// 調整實際數量，重算成本與庫存判定
    pub fn set_actual_quantity(&mut self, quantity: Decimal) -> Result<()> {
        if quantity < Decimal::ZERO {
            return Err(SpiceError::InvalidQuantity(quantity));
        }
        self.actual_quantity = quantity;
        self.recalculate();
        Ok(())
    }

    /// 以可替代原料取代目前原料
    ///
    /// 原本的原料會放回替代清單，數量與百分比保持不變。
    pub fn substitute(&mut self, material_id: Uuid) -> Result<()> {
        let position = self
            .substitutes
            .iter()
            .position(|c| c.material_id == material_id)
            .ok_or(SpiceError::MaterialNotFound(material_id))?;

        let candidate = self.substitutes.swap_remove(position);
        let previous = SubstituteCandidate {
            material_id: self.material_id,
            name: std::mem::take(&mut self.material_name),
            unit: self.material_unit,
            available_stock: normalize(self.available_stock, self.unit, self.material_unit),
            cost_per_unit: self.rate_per_unit,
        };
        self.substitutes.push(previous);

        self.material_id = candidate.material_id;
        self.material_name = candidate.name;
        self.material_unit = candidate.unit;
        self.rate_per_unit = candidate.cost_per_unit;
        self.available_stock = normalize(candidate.available_stock, candidate.unit, self.unit);
        self.recalculate();
        Ok(())
    }

    /// 實際數量換算為原料基準單位（用於出庫異動）
    pub fn actual_in_material_unit(&self) -> Decimal {
        normalize(self.actual_quantity, self.unit, self.material_unit)
    }

    fn recalculate(&mut self) {
        self.sufficiency = Sufficiency::evaluate(self.available_stock, self.actual_quantity);
        self.cost = ingredient_cost(
            self.actual_quantity,
            self.unit,
            self.material_unit,
            self.rate_per_unit,
        );
    }
}
