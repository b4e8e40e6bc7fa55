//! 研發配方模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Formulation, FormulationIngredient, Unit};

/// 研發配方狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchStatus {
    Draft,
    Approved,
    Rejected,
}

/// 晉升結果
#[derive(Debug, Clone)]
pub enum PromotionOutcome {
    /// 新建正式配方
    Created(Formulation),
    /// 同名配方的原料被整批覆蓋
    Overwritten {
        formulation: Formulation,
        replaced: Vec<FormulationIngredient>,
    },
}

impl PromotionOutcome {
    pub fn formulation(&self) -> &Formulation {
        match self {
            PromotionOutcome::Created(formulation) => formulation,
            PromotionOutcome::Overwritten { formulation, .. } => formulation,
        }
    }
}

/// 研發中的試驗配方，核准後晉升為正式配方
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchFormulation {
    pub id: Uuid,
    pub name: String,
    pub base_quantity: Decimal,
    pub base_unit: Unit,
    pub ingredients: Vec<FormulationIngredient>,
    pub status: ResearchStatus,
    pub notes: Option<String>,
}

impl ResearchFormulation {
    pub fn new(name: impl Into<String>, base_quantity: Decimal, base_unit: Unit) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            base_quantity,
            base_unit,
            ingredients: Vec::new(),
            status: ResearchStatus::Draft,
            notes: None,
        }
    }

    /// 建構器模式：添加原料
    pub fn with_ingredient(mut self, material_id: Uuid, percentage: Decimal) -> Self {
        self.ingredients
            .push(FormulationIngredient::new(material_id, percentage));
        self
    }

    /// 建構器模式：設置備註
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_draft(&self) -> bool {
        self.status == ResearchStatus::Draft
    }

    /// 轉為正式配方（新身分）
    pub fn to_formulation(&self) -> Formulation {
        let mut formulation = Formulation::new(self.name.clone(), self.base_quantity, self.base_unit);
        formulation.replace_ingredients(self.ingredients.clone());
        formulation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_formulation_copies_ingredients() {
        let turmeric = Uuid::new_v4();
        let research = ResearchFormulation::new("Haldi Blend", dec!(5), Unit::Kilogram)
            .with_ingredient(turmeric, dec!(100))
            .with_notes("trial 3");

        let formulation = research.to_formulation();
        assert_eq!(formulation.name, "Haldi Blend");
        assert_eq!(formulation.base_quantity, dec!(5));
        assert_eq!(formulation.ingredients.len(), 1);
        assert_eq!(formulation.ingredients[0].material_id, turmeric);
        assert_ne!(formulation.id, research.id);
        assert!(research.is_draft());
    }
}
