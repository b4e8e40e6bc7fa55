//! 生產服務
//!
//! 串接儲存層與計算引擎，提供給外層 CRUD 介面呼叫。

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use spice_calc::{
    BatchAggregator, CalcWarning, PackagingLine, PackagingSummary, RequirementPlan,
    RequirementResolver, SalesLine, SalesSummary,
};
use spice_core::{
    ensure_positive, BatchStore, BatchSummary, EngineConfig, Formulation, FormulationStore,
    MaterialStore, MovementReason, MovementStore, OperatorContext, ProductionBatch,
    PromotionOutcome, RawMaterial, ResearchFormulation, SpiceError, StockAction, StockMovement,
};
use spice_store::{BatchConfirmation, MemoryStore, ResearchPromotion, StockLedger};
use uuid::Uuid;

use crate::LowStockAlert;

/// 生產服務
pub struct ProductionService<S> {
    store: S,
    config: EngineConfig,
}

impl ProductionService<MemoryStore> {
    /// 以記憶體儲存建立服務，檢查點間隔取自配置
    pub fn in_memory(config: EngineConfig) -> Self {
        let store = MemoryStore::with_checkpoint_interval(config.checkpoint_interval);
        Self::new(store, config)
    }
}

impl<S> ProductionService<S>
where
    S: MaterialStore + FormulationStore + MovementStore + BatchStore,
{
    /// 創建新的服務
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// 獲取儲存層引用
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 獲取配置引用
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn ledger(&self) -> StockLedger<'_> {
        StockLedger::new(&self.store)
    }

    /// 新增或更新原料（單位建立後不可變更）
    pub fn save_material(&self, material: RawMaterial) -> spice_core::Result<()> {
        if material.cost_per_unit < Decimal::ZERO {
            return Err(SpiceError::InvalidQuantity(material.cost_per_unit));
        }
        self.store.save_material(material)
    }

    /// 編修流程新增配方（嚴格驗證百分比）
    pub fn create_formulation(&self, formulation: Formulation) -> spice_core::Result<Formulation> {
        formulation.validate_for_authoring(self.config.percentage_tolerance)?;
        self.store.ensure_materials(&formulation.ingredients)?;
        self.store.insert_formulation(formulation.clone())?;
        tracing::info!(
            "新增配方 {}：{} 項原料，基準 {} {}",
            formulation.name,
            formulation.ingredients.len(),
            formulation.base_quantity,
            formulation.base_unit
        );
        Ok(formulation)
    }

    fn material(&self, id: Uuid) -> spice_core::Result<RawMaterial> {
        self.store
            .material(id)?
            .ok_or(SpiceError::MaterialNotFound(id))
    }

    fn formulation(&self, id: Uuid) -> spice_core::Result<Formulation> {
        self.store
            .formulation(id)?
            .ok_or_else(|| SpiceError::FormulationNotFound(id.to_string()))
    }

    fn draft_batch(&self, id: Uuid) -> spice_core::Result<ProductionBatch> {
        let batch = self
            .store
            .batch(id)?
            .ok_or(SpiceError::BatchNotFound(id))?;
        if batch.is_confirmed() {
            return Err(SpiceError::BatchAlreadyConfirmed(id));
        }
        Ok(batch)
    }

    /// 手動庫存調整（採購、耗損、損壞、更正）
    pub fn adjust_stock(
        &self,
        material_id: Uuid,
        quantity: Decimal,
        action: StockAction,
        reason: MovementReason,
        reference: Option<String>,
        ctx: &OperatorContext,
    ) -> spice_core::Result<StockMovement> {
        let material = self.material(material_id)?;
        let mut movement = StockMovement::new(material.id, quantity, action, reason, ctx);
        if let Some(reference) = reference {
            movement = movement.with_reference(reference);
        }
        self.ledger().append(movement.clone())?;
        Ok(movement)
    }

    /// 目前餘額（原料基準單位）
    pub fn balance(&self, material_id: Uuid) -> spice_core::Result<Decimal> {
        self.ledger().balance(material_id)
    }

    /// 指定時間點（含）的餘額
    pub fn balance_at(&self, material_id: Uuid, at: DateTime<Utc>) -> spice_core::Result<Decimal> {
        self.ledger().balance_at(material_id, at)
    }

    /// 異動歷史
    pub fn history(&self, material_id: Uuid) -> spice_core::Result<Vec<StockMovement>> {
        self.ledger().history(material_id)
    }

    /// 低庫存報表（僅啟用原料）
    pub fn low_stock_report(&self) -> spice_core::Result<Vec<LowStockAlert>> {
        let ledger = self.ledger();
        let mut alerts = Vec::new();
        for material in self.store.materials()?.iter().filter(|m| m.is_active()) {
            if let Some(alert) = LowStockAlert::check(material, ledger.balance(material.id)?) {
                alerts.push(alert);
            }
        }
        alerts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(alerts)
    }

    /// 給定配方與計劃數量，回傳物料需求
    pub fn requirements(
        &self,
        formulation_id: Uuid,
        planned_quantity: Decimal,
    ) -> spice_core::Result<RequirementPlan> {
        let formulation = self.formulation(formulation_id)?;
        RequirementResolver::new(&self.store, &self.store).resolve(&formulation, planned_quantity)
    }

    /// 給定確認後需求，回傳批次彙總（不落地）
    pub fn batch_summary(&self, batch_id: Uuid, loss_quantity: Decimal) -> spice_core::Result<BatchSummary> {
        let batch = self
            .store
            .batch(batch_id)?
            .ok_or(SpiceError::BatchNotFound(batch_id))?;
        if let Some(snapshot) = &batch.snapshot {
            return Ok(snapshot.summary.clone());
        }
        Ok(BatchAggregator::aggregate(
            batch.final_output_quantity(),
            loss_quantity,
            &batch.requirements,
        ))
    }

    /// 建立草稿批次，需求依「計劃 × 批數」解析
    pub fn plan_batch(
        &self,
        formulation_id: Uuid,
        planned_quantity: Decimal,
        lots: u32,
        carried_forward_quantity: Decimal,
        production_date: NaiveDate,
    ) -> spice_core::Result<(ProductionBatch, Vec<CalcWarning>)> {
        ensure_positive(planned_quantity)?;
        if lots == 0 {
            return Err(SpiceError::InvalidQuantity(Decimal::ZERO));
        }
        if carried_forward_quantity < Decimal::ZERO {
            return Err(SpiceError::InvalidQuantity(carried_forward_quantity));
        }

        let formulation = self.formulation(formulation_id)?;
        let batch = ProductionBatch::new(
            formulation.id,
            planned_quantity,
            lots,
            formulation.base_unit,
            production_date,
        )
        .with_carried_forward(carried_forward_quantity);

        let plan = RequirementResolver::new(&self.store, &self.store)
            .resolve(&formulation, batch.production_quantity())?;
        let batch = batch.with_requirements(plan.requirements);

        self.store.insert_batch(batch.clone())?;
        tracing::info!(
            "建立草稿批次 {}：配方 {}，{} × {} 批 + 結轉 {} = {} {}",
            batch.id,
            formulation.name,
            planned_quantity,
            lots,
            carried_forward_quantity,
            batch.final_output_quantity(),
            batch.unit
        );
        Ok((batch, plan.warnings))
    }

    /// 調整草稿批次某原料的實際數量
    pub fn adjust_requirement(
        &self,
        batch_id: Uuid,
        material_id: Uuid,
        actual_quantity: Decimal,
    ) -> spice_core::Result<ProductionBatch> {
        let mut batch = self.draft_batch(batch_id)?;
        batch
            .requirements
            .iter_mut()
            .find(|r| r.material_id == material_id)
            .ok_or(SpiceError::MaterialNotFound(material_id))?
            .set_actual_quantity(actual_quantity)?;
        self.store.update_draft(batch)
    }

    /// 以可替代原料取代草稿批次中的原料
    pub fn substitute_material(
        &self,
        batch_id: Uuid,
        material_id: Uuid,
        substitute_id: Uuid,
    ) -> spice_core::Result<ProductionBatch> {
        let mut batch = self.draft_batch(batch_id)?;
        if batch.requirements.iter().any(|r| r.material_id == substitute_id) {
            return Err(SpiceError::RequirementMismatch(format!(
                "原料 {} 已在批次中",
                substitute_id
            )));
        }
        batch
            .requirements
            .iter_mut()
            .find(|r| r.material_id == material_id)
            .ok_or(SpiceError::MaterialNotFound(material_id))?
            .substitute(substitute_id)?;
        let batch = self.store.update_draft(batch)?;
        tracing::info!("批次 {} 以 {} 取代 {}", batch_id, substitute_id, material_id);
        Ok(batch)
    }

    /// 確認批次（凍結成本並扣帳）
    pub fn confirm_batch(
        &self,
        batch_id: Uuid,
        loss_quantity: Option<Decimal>,
        ctx: &OperatorContext,
    ) -> spice_core::Result<ProductionBatch> {
        let loss = loss_quantity.unwrap_or(self.config.default_loss_quantity);
        BatchConfirmation::confirm_draft(&self.store, batch_id, loss, ctx)
    }

    /// 包裝損耗彙總（僅限已確認批次）
    pub fn packaging_summary(
        &self,
        batch_id: Uuid,
        lines: &[PackagingLine],
        loss_quantity: Decimal,
    ) -> spice_core::Result<PackagingSummary> {
        let batch = self
            .store
            .batch(batch_id)?
            .ok_or(SpiceError::BatchNotFound(batch_id))?;
        if !batch.is_confirmed() {
            return Err(SpiceError::RequirementMismatch(format!(
                "批次 {} 尚未確認，無法包裝",
                batch_id
            )));
        }
        BatchAggregator::packaging(batch.final_output_quantity(), batch.unit, lines, loss_quantity)
    }

    /// 銷售利潤彙總
    pub fn sales_summary(&self, lines: &[SalesLine]) -> SalesSummary {
        BatchAggregator::sales(lines)
    }

    /// 送出研發配方（草稿）
    pub fn submit_research(&self, research: ResearchFormulation) -> spice_core::Result<ResearchFormulation> {
        ensure_positive(research.base_quantity)?;
        self.store.save_research(research.clone())?;
        Ok(research)
    }

    /// 核准研發配方
    pub fn approve_research(&self, research_id: Uuid) -> spice_core::Result<PromotionOutcome> {
        ResearchPromotion::approve(&self.store, &self.store, research_id, &self.config)
    }

    /// 駁回研發配方
    pub fn reject_research(&self, research_id: Uuid) -> spice_core::Result<()> {
        ResearchPromotion::reject(&self.store, research_id)
    }
}
