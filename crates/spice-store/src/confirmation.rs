//! 生產批次確認

use rust_decimal::Decimal;
use spice_calc::BatchAggregator;
use spice_core::{
    BatchSnapshot, BatchStore, MaterialRequirement, MovementReason, OperatorContext,
    ProductionBatch, SpiceError, StockMovement,
};
use uuid::Uuid;

/// 批次確認：凍結成本快照並寫入出庫異動
pub struct BatchConfirmation;

impl BatchConfirmation {
    /// 確認批次
    ///
    /// `requirements` 為操作人員調整後的最終需求，原料組成必須與儲存中的草稿相同
    /// （含已替代的原料）；每項實際數量非零的原料產生一筆 production 出庫異動
    /// （換算為原料基準單位），與狀態轉換一併提交。讀取後草稿若被他人修改，
    /// 提交時回傳 `BatchModified`。
    pub fn confirm(
        store: &dyn BatchStore,
        batch_id: Uuid,
        requirements: Vec<MaterialRequirement>,
        loss_quantity: Decimal,
        ctx: &OperatorContext,
    ) -> spice_core::Result<ProductionBatch> {
        let batch = Self::load_draft(store, batch_id)?;
        Self::commit(store, &batch, requirements, loss_quantity, ctx)
    }

    /// 以儲存中的草稿需求確認批次
    pub fn confirm_draft(
        store: &dyn BatchStore,
        batch_id: Uuid,
        loss_quantity: Decimal,
        ctx: &OperatorContext,
    ) -> spice_core::Result<ProductionBatch> {
        let batch = Self::load_draft(store, batch_id)?;
        let requirements = batch.requirements.clone();
        Self::commit(store, &batch, requirements, loss_quantity, ctx)
    }

    fn load_draft(store: &dyn BatchStore, batch_id: Uuid) -> spice_core::Result<ProductionBatch> {
        let batch = store
            .batch(batch_id)?
            .ok_or(SpiceError::BatchNotFound(batch_id))?;
        if batch.is_confirmed() {
            return Err(SpiceError::BatchAlreadyConfirmed(batch_id));
        }
        Ok(batch)
    }

    fn commit(
        store: &dyn BatchStore,
        batch: &ProductionBatch,
        requirements: Vec<MaterialRequirement>,
        loss_quantity: Decimal,
        ctx: &OperatorContext,
    ) -> spice_core::Result<ProductionBatch> {
        Self::validate(batch, &requirements, loss_quantity)?;

        let final_output = batch.final_output_quantity();
        if final_output.is_zero() {
            tracing::warn!("批次 {} 最終產出為零，每單位成本將記為 0", batch.id);
        }
        let summary = BatchAggregator::aggregate(final_output, loss_quantity, &requirements);

        let reference = batch.reference();
        let movements: Vec<StockMovement> = requirements
            .iter()
            .filter(|r| r.actual_quantity > Decimal::ZERO)
            .map(|r| {
                StockMovement::reduce(
                    r.material_id,
                    r.actual_in_material_unit(),
                    MovementReason::Production,
                    ctx,
                )
                .with_reference(reference.clone())
            })
            .collect();

        tracing::info!(
            "確認批次 {}：產出 {} {}，總成本 {}，每單位成本 {}",
            batch.id,
            summary.final_output_quantity,
            batch.unit,
            summary.total_production_cost,
            summary.cost_per_base_unit
        );

        let snapshot = BatchSnapshot {
            requirements,
            summary,
            confirmed_by: ctx.operator.clone(),
            confirmed_at: ctx.timestamp,
        };

        store.commit_confirmation(batch.id, batch.revision, snapshot, movements)
    }

    fn validate(
        batch: &ProductionBatch,
        requirements: &[MaterialRequirement],
        loss_quantity: Decimal,
    ) -> spice_core::Result<()> {
        if loss_quantity < Decimal::ZERO {
            return Err(SpiceError::InvalidQuantity(loss_quantity));
        }
        if requirements.is_empty() {
            return Err(SpiceError::RequirementMismatch(
                "確認時至少需要一項原料".to_string(),
            ));
        }
        if !batch.requirements.is_empty() {
            if batch.requirements.len() != requirements.len() {
                return Err(SpiceError::RequirementMismatch(format!(
                    "批次有 {} 項原料，確認時提供 {} 項",
                    batch.requirements.len(),
                    requirements.len()
                )));
            }
            let mut drafted: Vec<Uuid> = batch.requirements.iter().map(|r| r.material_id).collect();
            let mut submitted: Vec<Uuid> = requirements.iter().map(|r| r.material_id).collect();
            drafted.sort_unstable();
            submitted.sort_unstable();
            if drafted != submitted {
                return Err(SpiceError::RequirementMismatch(
                    "確認時的原料與批次草稿不符".to_string(),
                ));
            }
        }
        if let Some(r) = requirements.iter().find(|r| r.unit != batch.unit) {
            return Err(SpiceError::RequirementMismatch(format!(
                "原料 {} 單位 {} 與批次單位 {} 不符",
                r.material_name, r.unit, batch.unit
            )));
        }
        if let Some(r) = requirements.iter().find(|r| r.actual_quantity < Decimal::ZERO) {
            return Err(SpiceError::InvalidQuantity(r.actual_quantity));
        }
        Ok(())
    }
}
