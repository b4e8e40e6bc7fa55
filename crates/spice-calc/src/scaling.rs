//! 配方縮放

use rust_decimal::Decimal;
use spice_core::{ensure_positive, Formulation, SpiceError, Unit};
use uuid::Uuid;

use crate::CalcWarning;

/// 縮放後的單一原料需求
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledIngredient {
    pub material_id: Uuid,
    pub percentage: Decimal,
    /// 需求數量（配方基準單位）
    pub required_quantity: Decimal,
    pub unit: Unit,
}

/// 配方縮放引擎
pub struct ScalingEngine;

impl ScalingEngine {
    /// 依計劃數量縮放配方
    ///
    /// 需求數量 = 百分比 / 100 × 計劃數量，不做中間捨入。
    /// 百分比合計不為 100 時照樣縮放（由 [`Self::check_percentages`] 另行提示）。
    pub fn scale(
        formulation: &Formulation,
        planned_quantity: Decimal,
    ) -> spice_core::Result<Vec<ScaledIngredient>> {
        ensure_positive(planned_quantity)?;

        if formulation.ingredients.is_empty() {
            return Err(SpiceError::IngredientsNotFound(formulation.name.clone()));
        }

        tracing::debug!(
            "縮放配方 {}：基準 {} {}，計劃 {} {}",
            formulation.name,
            formulation.base_quantity,
            formulation.base_unit,
            planned_quantity,
            formulation.base_unit
        );

        Ok(formulation
            .ingredients
            .iter()
            .map(|ingredient| ScaledIngredient {
                material_id: ingredient.material_id,
                percentage: ingredient.percentage,
                required_quantity: ingredient.percentage / Decimal::ONE_HUNDRED
                    * planned_quantity,
                unit: formulation.base_unit,
            })
            .collect())
    }

    /// 百分比合計檢查（僅提示，不阻擋）
    pub fn check_percentages(formulation: &Formulation) -> Option<CalcWarning> {
        let total = formulation.percentage_total();
        if total == Decimal::ONE_HUNDRED {
            return None;
        }

        tracing::warn!(
            "配方 {} 百分比合計為 {}，仍依現有百分比縮放",
            formulation.name,
            total
        );
        Some(CalcWarning::warning(
            formulation.name.clone(),
            format!("百分比合計為 {}，非 100", total),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_scale_simple() {
        let chilli = Uuid::new_v4();
        let coriander = Uuid::new_v4();
        let formulation = Formulation::new("Curry Powder", dec!(10), Unit::Kilogram)
            .with_ingredient(chilli, dec!(20))
            .with_ingredient(coriander, dec!(80));

        let scaled = ScalingEngine::scale(&formulation, dec!(50)).unwrap();

        assert_eq!(scaled.len(), 2);
        assert_eq!(scaled[0].material_id, chilli);
        assert_eq!(scaled[0].required_quantity, dec!(10));
        assert_eq!(scaled[1].material_id, coriander);
        assert_eq!(scaled[1].required_quantity, dec!(40));
        assert!(scaled.iter().all(|s| s.unit == Unit::Kilogram));
    }

    /// 需求量只取決於百分比與計劃數量，與基準數量無關
    #[rstest]
    #[case(dec!(1), dec!(12.5), dec!(80), dec!(10))]
    #[case(dec!(700), dec!(12.5), dec!(80), dec!(10))]
    #[case(dec!(10), dec!(33.33), dec!(3), dec!(0.9999))]
    #[case(dec!(0.25), dec!(0.01), dec!(10000), dec!(1))]
    fn test_scale_is_independent_of_base_quantity(
        #[case] base_quantity: Decimal,
        #[case] percentage: Decimal,
        #[case] planned: Decimal,
        #[case] expected: Decimal,
    ) {
        let formulation =
            Formulation::new("Blend", base_quantity, Unit::Gram).with_ingredient(Uuid::new_v4(), percentage);

        let scaled = ScalingEngine::scale(&formulation, planned).unwrap();
        assert_eq!(scaled[0].required_quantity, expected);
    }

    #[test]
    fn test_scale_rejects_invalid_input() {
        let formulation = Formulation::new("Pav Bhaji Masala", dec!(10), Unit::Kilogram)
            .with_ingredient(Uuid::new_v4(), dec!(100));

        assert!(matches!(
            ScalingEngine::scale(&formulation, dec!(0)),
            Err(SpiceError::InvalidQuantity(_))
        ));
        assert!(ScalingEngine::scale(&formulation, dec!(-5)).is_err());

        let empty = Formulation::new("Empty", dec!(10), Unit::Kilogram);
        assert!(matches!(
            ScalingEngine::scale(&empty, dec!(5)),
            Err(SpiceError::IngredientsNotFound(_))
        ));
    }

    #[test]
    fn test_unbalanced_formulation_still_scales() {
        let formulation = Formulation::new("Provisional", dec!(10), Unit::Kilogram)
            .with_ingredient(Uuid::new_v4(), dec!(60))
            .with_ingredient(Uuid::new_v4(), dec!(30));

        let scaled = ScalingEngine::scale(&formulation, dec!(100)).unwrap();
        let total: Decimal = scaled.iter().map(|s| s.required_quantity).sum();
        assert_eq!(total, dec!(90));

        let warning = ScalingEngine::check_percentages(&formulation).unwrap();
        assert_eq!(warning.severity, crate::WarningSeverity::Warning);
    }

    #[test]
    fn test_balanced_formulation_has_no_warning() {
        let formulation = Formulation::new("Balanced", dec!(10), Unit::Kilogram)
            .with_ingredient(Uuid::new_v4(), dec!(100));
        assert!(ScalingEngine::check_percentages(&formulation).is_none());
    }

    /// 將 100 拆成若干個百分比（最小單位 0.01%）
    fn percentages() -> impl Strategy<Value = Vec<Decimal>> {
        proptest::collection::vec(1u32..1000, 1..12).prop_map(|weights| {
            let total: u32 = weights.iter().sum();
            let mut remaining = 10_000i64;
            let mut result = Vec::with_capacity(weights.len());
            for (i, w) in weights.iter().enumerate() {
                let share = if i + 1 == weights.len() {
                    remaining
                } else {
                    i64::from(*w) * 10_000 / i64::from(total)
                };
                remaining -= share;
                result.push(Decimal::new(share, 2));
            }
            result
        })
    }

    proptest! {
        #[test]
        fn prop_scaled_total_equals_planned(
            pcts in percentages(),
            planned_mantissa in 1i64..10_000_000,
            planned_scale in 0u32..4,
        ) {
            let planned = Decimal::new(planned_mantissa, planned_scale);
            let mut formulation = Formulation::new("Prop", dec!(25), Unit::Kilogram);
            for p in &pcts {
                formulation = formulation.with_ingredient(Uuid::new_v4(), *p);
            }
            prop_assert_eq!(formulation.percentage_total(), Decimal::ONE_HUNDRED);

            let scaled = ScalingEngine::scale(&formulation, planned).unwrap();
            let total: Decimal = scaled.iter().map(|s| s.required_quantity).sum();
            prop_assert_eq!(total, planned);
        }
    }
}
