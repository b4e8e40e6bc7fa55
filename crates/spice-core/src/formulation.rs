//! 配方模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{ensure_positive, Result, SpiceError, Unit};

/// 配方狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulationStatus {
    /// 啟用
    Active,
    /// 停用
    Inactive,
}

/// 配方原料（佔基準數量的百分比）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulationIngredient {
    /// 原料ID
    pub material_id: Uuid,

    /// 百分比
    pub percentage: Decimal,
}

impl FormulationIngredient {
    pub fn new(material_id: Uuid, percentage: Decimal) -> Self {
        Self {
            material_id,
            percentage,
        }
    }
}

/// 配方
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formulation {
    /// 配方ID
    pub id: Uuid,

    /// 名稱（唯一）
    pub name: String,

    /// 基準數量
    pub base_quantity: Decimal,

    /// 基準單位
    pub base_unit: Unit,

    /// 狀態
    pub status: FormulationStatus,

    /// 原料（保留插入順序）
    pub ingredients: Vec<FormulationIngredient>,
}

impl Formulation {
    /// 創建新的配方
    pub fn new(name: impl Into<String>, base_quantity: Decimal, base_unit: Unit) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            base_quantity,
            base_unit,
            status: FormulationStatus::Active,
            ingredients: Vec::new(),
        }
    }

    /// 建構器模式：添加原料
    pub fn with_ingredient(mut self, material_id: Uuid, percentage: Decimal) -> Self {
        self.ingredients
            .push(FormulationIngredient::new(material_id, percentage));
        self
    }

    /// 建構器模式：設置狀態
    pub fn with_status(mut self, status: FormulationStatus) -> Self {
        self.status = status;
        self
    }

    /// 百分比合計
    pub fn percentage_total(&self) -> Decimal {
        self.ingredients.iter().map(|i| i.percentage).sum()
    }

    /// 百分比合計是否為 100（容許誤差內）
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        (self.percentage_total() - Decimal::ONE_HUNDRED).abs() <= tolerance
    }

    pub fn is_active(&self) -> bool {
        self.status == FormulationStatus::Active
    }

    /// 整批替換原料（先全刪再重建），回傳被替換的原料
    pub fn replace_ingredients(
        &mut self,
        ingredients: Vec<FormulationIngredient>,
    ) -> Vec<FormulationIngredient> {
        std::mem::replace(&mut self.ingredients, ingredients)
    }

    /// 編修流程的嚴格驗證
    ///
    /// 生產計算不呼叫此驗證，百分比不足 100 的配方仍可估算成本。
    pub fn validate_for_authoring(&self, tolerance: Decimal) -> Result<()> {
        ensure_positive(self.base_quantity)?;

        if self.ingredients.is_empty() {
            return Err(SpiceError::IngredientsNotFound(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for ingredient in &self.ingredients {
            if ingredient.percentage <= Decimal::ZERO
                || ingredient.percentage > Decimal::ONE_HUNDRED
            {
                return Err(SpiceError::InvalidPercentage(ingredient.percentage));
            }
            if !seen.insert(ingredient.material_id) {
                return Err(SpiceError::DuplicateIngredient {
                    formulation: self.name.clone(),
                    material_id: ingredient.material_id,
                });
            }
        }

        if !self.is_balanced(tolerance) {
            return Err(SpiceError::PercentageSumMismatch {
                name: self.name.clone(),
                total: self.percentage_total(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn garam_masala() -> Formulation {
        Formulation::new("Garam Masala", dec!(100), Unit::Kilogram)
            .with_ingredient(Uuid::new_v4(), dec!(40))
            .with_ingredient(Uuid::new_v4(), dec!(35))
            .with_ingredient(Uuid::new_v4(), dec!(25))
    }

    #[test]
    fn test_percentage_total() {
        let formulation = garam_masala();
        assert_eq!(formulation.percentage_total(), dec!(100));
        assert!(formulation.is_balanced(dec!(0.01)));
        assert!(formulation.validate_for_authoring(dec!(0.01)).is_ok());
    }

    #[test]
    fn test_unbalanced_formulation_rejected_for_authoring() {
        let formulation = Formulation::new("Chaat Masala", dec!(10), Unit::Kilogram)
            .with_ingredient(Uuid::new_v4(), dec!(60))
            .with_ingredient(Uuid::new_v4(), dec!(30));

        let err = formulation.validate_for_authoring(dec!(0.01)).unwrap_err();
        assert!(matches!(
            err,
            SpiceError::PercentageSumMismatch { total, .. } if total == dec!(90)
        ));
    }

    #[test]
    fn test_tolerance_accepts_rounding() {
        let formulation = Formulation::new("Sambar Powder", dec!(1), Unit::Kilogram)
            .with_ingredient(Uuid::new_v4(), dec!(33.33))
            .with_ingredient(Uuid::new_v4(), dec!(33.33))
            .with_ingredient(Uuid::new_v4(), dec!(33.33));

        assert!(formulation.validate_for_authoring(dec!(0.01)).is_ok());
        assert!(formulation.validate_for_authoring(dec!(0.001)).is_err());
    }

    #[test]
    fn test_duplicate_ingredient_rejected() {
        let material_id = Uuid::new_v4();
        let formulation = Formulation::new("Rasam Powder", dec!(1), Unit::Kilogram)
            .with_ingredient(material_id, dec!(50))
            .with_ingredient(material_id, dec!(50));

        assert!(matches!(
            formulation.validate_for_authoring(dec!(0.01)),
            Err(SpiceError::DuplicateIngredient { .. })
        ));
    }

    #[test]
    fn test_empty_and_invalid_rejected() {
        let empty = Formulation::new("Empty", dec!(1), Unit::Kilogram);
        assert!(matches!(
            empty.validate_for_authoring(dec!(0.01)),
            Err(SpiceError::IngredientsNotFound(_))
        ));

        let zero_base = garam_masala();
        let zero_base = Formulation {
            base_quantity: Decimal::ZERO,
            ..zero_base
        };
        assert!(matches!(
            zero_base.validate_for_authoring(dec!(0.01)),
            Err(SpiceError::InvalidQuantity(_))
        ));

        let negative = Formulation::new("Broken", dec!(1), Unit::Kilogram)
            .with_ingredient(Uuid::new_v4(), dec!(110))
            .with_ingredient(Uuid::new_v4(), dec!(-10));
        assert!(matches!(
            negative.validate_for_authoring(dec!(0.01)),
            Err(SpiceError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn test_replace_ingredients_wholesale() {
        let mut formulation = garam_masala();
        let replacement = vec![FormulationIngredient::new(Uuid::new_v4(), dec!(100))];

        let replaced = formulation.replace_ingredients(replacement.clone());
        assert_eq!(formulation.ingredients, replacement);
        assert_eq!(replaced.len(), 3);
    }
}
