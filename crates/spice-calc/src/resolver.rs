//! 物料需求解析

use rayon::prelude::*;
use rust_decimal::Decimal;
use spice_core::{
    Formulation, MaterialRequirement, MaterialStore, MovementStore, RawMaterial, SpiceError,
    SubstituteCandidate, Sufficiency,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::{CalcWarning, RequirementPlan, ScalingEngine};

/// 物料需求解析器
///
/// 結合配方縮放與庫存帳，產生每項原料的需求、可用量、判定與可替代原料。
pub struct RequirementResolver<'a> {
    materials: &'a dyn MaterialStore,
    ledger: &'a dyn MovementStore,
}

impl<'a> RequirementResolver<'a> {
    /// 創建新的解析器
    pub fn new(materials: &'a dyn MaterialStore, ledger: &'a dyn MovementStore) -> Self {
        Self { materials, ledger }
    }

    /// 主解析入口
    pub fn resolve(
        &self,
        formulation: &Formulation,
        planned_quantity: Decimal,
    ) -> spice_core::Result<RequirementPlan> {
        tracing::info!(
            "開始解析物料需求：配方 {}，計劃 {} {}",
            formulation.name,
            planned_quantity,
            formulation.base_unit
        );

        // Step 1: 配方縮放
        let scaled = ScalingEngine::scale(formulation, planned_quantity)?;
        let mut warnings: Vec<CalcWarning> =
            ScalingEngine::check_percentages(formulation).into_iter().collect();
        if !formulation.is_active() {
            warnings.push(CalcWarning::info(
                formulation.name.clone(),
                "配方已停用，仍依原料比例計算".to_string(),
            ));
        }

        // Step 2: 原料主檔
        let catalog: HashMap<Uuid, RawMaterial> = self
            .materials
            .materials()?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let active: Vec<&RawMaterial> = catalog.values().filter(|m| m.is_active()).collect();

        // Step 3: 一次折算所有相關原料的餘額
        let mut needed: HashSet<Uuid> = active.iter().map(|m| m.id).collect();
        needed.extend(scaled.iter().map(|s| s.material_id));
        let balances = self.balances(needed)?;
        tracing::debug!("已折算 {} 項原料餘額", balances.len());

        // Step 4: 逐項組合需求
        let mut requirements = Vec::with_capacity(scaled.len());
        for line in &scaled {
            let material = catalog
                .get(&line.material_id)
                .ok_or(SpiceError::MaterialNotFound(line.material_id))?;
            let balance = balances
                .get(&line.material_id)
                .copied()
                .unwrap_or(Decimal::ZERO);

            let substitutes = active
                .iter()
                .filter(|candidate| candidate.id != material.id)
                .map(|candidate| {
                    SubstituteCandidate::from_material(
                        candidate,
                        balances.get(&candidate.id).copied().unwrap_or(Decimal::ZERO),
                    )
                })
                .collect();

            let requirement = MaterialRequirement::new(
                material,
                line.percentage,
                line.required_quantity,
                line.unit,
                balance,
            )
            .with_substitutes(substitutes);

            if !material.is_active() {
                warnings.push(CalcWarning::info(
                    material.name.clone(),
                    "原料已停用，仍依配方計算".to_string(),
                ));
            }
            if requirement.sufficiency == Sufficiency::Insufficient {
                tracing::warn!(
                    "原料 {} 庫存不足：需求 {} {}，可用 {} {}",
                    material.name,
                    requirement.required_quantity,
                    requirement.unit,
                    requirement.available_stock,
                    requirement.unit
                );
                warnings.push(CalcWarning::warning(
                    material.name.clone(),
                    format!(
                        "庫存不足：需求 {} {}，可用 {} {}",
                        requirement.required_quantity,
                        requirement.unit,
                        requirement.available_stock,
                        requirement.unit
                    ),
                ));
            }

            requirements.push(requirement);
        }

        tracing::info!("物料需求解析完成：{} 項原料", requirements.len());

        Ok(RequirementPlan {
            planned_quantity,
            unit: formulation.base_unit,
            requirements,
            warnings,
        })
    }

    /// 並行折算餘額（原料基準單位）
    fn balances(&self, material_ids: HashSet<Uuid>) -> spice_core::Result<HashMap<Uuid, Decimal>> {
        material_ids
            .into_par_iter()
            .map(|id| self.ledger.balance(id).map(|balance| (id, balance)))
            .collect()
    }
}
