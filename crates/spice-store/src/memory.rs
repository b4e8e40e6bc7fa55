//! 記憶體儲存層
//!
//! 所有資料放在同一把讀寫鎖內：單筆異動各自提交，
//! 批次確認在一次寫鎖內完成，不會留下半套狀態。

use rust_decimal::Decimal;
use spice_cache::BalanceCheckpoints;
use spice_core::{
    BatchSnapshot, BatchStatus, BatchStore, Formulation, FormulationStore, MaterialStore,
    MovementStore, ProductionBatch, PromotionOutcome, RawMaterial, ResearchFormulation,
    ResearchStatus, SpiceError, StockMovement,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

struct State {
    materials: HashMap<Uuid, RawMaterial>,
    formulations: HashMap<Uuid, Formulation>,
    research: HashMap<Uuid, ResearchFormulation>,
    movements: HashMap<Uuid, Vec<StockMovement>>,
    checkpoints: BalanceCheckpoints,
    batches: HashMap<Uuid, ProductionBatch>,
}

/// 記憶體儲存（實作全部儲存層 trait）
pub struct MemoryStore {
    state: RwLock<State>,
    online: AtomicBool,
}

impl MemoryStore {
    /// 創建新的儲存（預設檢查點間隔）
    pub fn new() -> Self {
        Self::with_checkpoint_interval(spice_core::EngineConfig::default().checkpoint_interval)
    }

    /// 指定檢查點間隔
    pub fn with_checkpoint_interval(interval: usize) -> Self {
        Self {
            state: RwLock::new(State {
                materials: HashMap::new(),
                formulations: HashMap::new(),
                research: HashMap::new(),
                movements: HashMap::new(),
                checkpoints: BalanceCheckpoints::new(interval),
                batches: HashMap::new(),
            }),
            online: AtomicBool::new(true),
        }
    }

    /// 模擬儲存層上線/離線
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// 推進所有髒原料的檢查點
    pub fn compact(&self) -> spice_core::Result<()> {
        let mut state = self.write()?;
        let State {
            movements,
            checkpoints,
            ..
        } = &mut *state;
        checkpoints.compact(movements);
        Ok(())
    }

    /// 全部異動筆數
    pub fn movement_count(&self) -> spice_core::Result<usize> {
        Ok(self.read()?.movements.values().map(Vec::len).sum())
    }

    fn ensure_online(&self) -> spice_core::Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SpiceError::Persistence("儲存層無法連線".to_string()))
        }
    }

    fn read(&self) -> spice_core::Result<RwLockReadGuard<'_, State>> {
        self.ensure_online()?;
        self.state
            .read()
            .map_err(|_| SpiceError::Persistence("儲存鎖已毀損".to_string()))
    }

    fn write(&self) -> spice_core::Result<RwLockWriteGuard<'_, State>> {
        self.ensure_online()?;
        self.state
            .write()
            .map_err(|_| SpiceError::Persistence("儲存鎖已毀損".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn push_movement(&mut self, movement: StockMovement) {
        let material_id = movement.material_id;
        let log = self.movements.entry(material_id).or_default();
        log.push(movement);
        self.checkpoints.record_append(material_id, log);
    }
}

impl MaterialStore for MemoryStore {
    fn material(&self, id: Uuid) -> spice_core::Result<Option<RawMaterial>> {
        Ok(self.read()?.materials.get(&id).cloned())
    }

    fn materials(&self) -> spice_core::Result<Vec<RawMaterial>> {
        Ok(self.read()?.materials.values().cloned().collect())
    }

    fn save_material(&self, material: RawMaterial) -> spice_core::Result<()> {
        let mut state = self.write()?;
        if let Some(existing) = state.materials.get(&material.id) {
            if existing.unit() != material.unit() {
                return Err(SpiceError::ImmutableUnit {
                    name: existing.name.clone(),
                    from: existing.unit(),
                    to: material.unit(),
                });
            }
        }
        state.materials.insert(material.id, material);
        Ok(())
    }
}

impl FormulationStore for MemoryStore {
    fn formulation(&self, id: Uuid) -> spice_core::Result<Option<Formulation>> {
        Ok(self.read()?.formulations.get(&id).cloned())
    }

    fn formulation_by_name(&self, name: &str) -> spice_core::Result<Option<Formulation>> {
        Ok(self
            .read()?
            .formulations
            .values()
            .find(|f| f.name == name)
            .cloned())
    }

    fn insert_formulation(&self, formulation: Formulation) -> spice_core::Result<()> {
        let mut state = self.write()?;
        if state
            .formulations
            .values()
            .any(|f| f.name == formulation.name && f.id != formulation.id)
        {
            return Err(SpiceError::DuplicateFormulationName(formulation.name));
        }
        state.formulations.insert(formulation.id, formulation);
        Ok(())
    }

    fn research(&self, id: Uuid) -> spice_core::Result<Option<ResearchFormulation>> {
        Ok(self.read()?.research.get(&id).cloned())
    }

    fn save_research(&self, research: ResearchFormulation) -> spice_core::Result<()> {
        self.write()?.research.insert(research.id, research);
        Ok(())
    }

    fn commit_promotion(
        &self,
        research_id: Uuid,
        candidate: Formulation,
    ) -> spice_core::Result<PromotionOutcome> {
        let mut state = self.write()?;

        let research = state
            .research
            .get(&research_id)
            .ok_or(SpiceError::ResearchNotFound(research_id))?;
        if !research.is_draft() {
            return Err(SpiceError::ResearchNotApprovable(format!(
                "{} 狀態為 {:?}",
                research.name, research.status
            )));
        }

        let existing = state
            .formulations
            .values_mut()
            .find(|f| f.name == candidate.name);

        let outcome = match existing {
            Some(existing) => {
                let replaced = existing.replace_ingredients(candidate.ingredients);
                PromotionOutcome::Overwritten {
                    formulation: existing.clone(),
                    replaced,
                }
            }
            None => {
                state.formulations.insert(candidate.id, candidate.clone());
                PromotionOutcome::Created(candidate)
            }
        };

        if let Some(research) = state.research.get_mut(&research_id) {
            research.status = ResearchStatus::Approved;
        }
        Ok(outcome)
    }
}

impl MovementStore for MemoryStore {
    fn append(&self, movement: StockMovement) -> spice_core::Result<()> {
        self.write()?.push_movement(movement);
        Ok(())
    }

    fn movements(&self, material_id: Uuid) -> spice_core::Result<Vec<StockMovement>> {
        Ok(self
            .read()?
            .movements
            .get(&material_id)
            .cloned()
            .unwrap_or_default())
    }

    fn balance(&self, material_id: Uuid) -> spice_core::Result<Decimal> {
        let state = self.read()?;
        let log = state
            .movements
            .get(&material_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(state.checkpoints.balance(material_id, log))
    }
}

impl BatchStore for MemoryStore {
    fn batch(&self, id: Uuid) -> spice_core::Result<Option<ProductionBatch>> {
        Ok(self.read()?.batches.get(&id).cloned())
    }

    fn insert_batch(&self, batch: ProductionBatch) -> spice_core::Result<()> {
        self.write()?.batches.insert(batch.id, batch);
        Ok(())
    }

    fn update_draft(&self, mut batch: ProductionBatch) -> spice_core::Result<ProductionBatch> {
        let mut state = self.write()?;
        match state.batches.get(&batch.id) {
            None => Err(SpiceError::BatchNotFound(batch.id)),
            Some(stored) if stored.is_confirmed() => Err(SpiceError::BatchAlreadyConfirmed(batch.id)),
            Some(stored) if stored.revision != batch.revision => {
                Err(SpiceError::BatchModified(batch.id))
            }
            Some(_) => {
                batch.revision += 1;
                state.batches.insert(batch.id, batch.clone());
                Ok(batch)
            }
        }
    }

    fn commit_confirmation(
        &self,
        batch_id: Uuid,
        expected_revision: u64,
        snapshot: BatchSnapshot,
        movements: Vec<StockMovement>,
    ) -> spice_core::Result<ProductionBatch> {
        let mut state = self.write()?;

        // 先完成所有檢查，之後的寫入不再失敗
        match state.batches.get(&batch_id) {
            None => return Err(SpiceError::BatchNotFound(batch_id)),
            Some(batch) if batch.is_confirmed() => {
                return Err(SpiceError::BatchAlreadyConfirmed(batch_id))
            }
            Some(batch) if batch.revision != expected_revision => {
                return Err(SpiceError::BatchModified(batch_id))
            }
            Some(_) => {}
        }
        if let Some(bad) = movements.iter().find(|m| m.quantity <= Decimal::ZERO) {
            return Err(SpiceError::InvalidQuantity(bad.quantity));
        }

        let count = movements.len();
        for movement in movements {
            state.push_movement(movement);
        }

        let batch = state
            .batches
            .get_mut(&batch_id)
            .ok_or(SpiceError::BatchNotFound(batch_id))?;
        batch.status = BatchStatus::Confirmed;
        batch.requirements = snapshot.requirements.clone();
        batch.snapshot = Some(snapshot);

        tracing::info!("批次 {} 已確認，寫入 {} 筆出庫異動", batch_id, count);
        Ok(batch.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use spice_core::{BatchSummary, MovementReason, OperatorContext, Unit};
    use std::sync::Arc;

    fn ctx() -> OperatorContext {
        OperatorContext::new("tester")
    }

    fn snapshot() -> BatchSnapshot {
        BatchSnapshot {
            requirements: Vec::new(),
            summary: BatchSummary {
                total_raw_material_consumed: Decimal::ZERO,
                final_output_quantity: Decimal::ZERO,
                loss_quantity: Decimal::ZERO,
                total_production_cost: Decimal::ZERO,
                cost_per_base_unit: Decimal::ZERO,
            },
            confirmed_by: "tester".to_string(),
            confirmed_at: chrono::Utc::now(),
        }
    }

    fn draft_batch() -> ProductionBatch {
        ProductionBatch::new(
            Uuid::new_v4(),
            dec!(10),
            1,
            Unit::Kilogram,
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
        )
    }

    #[test]
    fn test_balance_uses_checkpoints() {
        let store = MemoryStore::with_checkpoint_interval(2);
        let material_id = Uuid::new_v4();

        for _ in 0..5 {
            store
                .append(StockMovement::add(material_id, dec!(3), MovementReason::Purchase, &ctx()))
                .unwrap();
        }
        store
            .append(StockMovement::reduce(material_id, dec!(20), MovementReason::Production, &ctx()))
            .unwrap();

        assert_eq!(store.balance(material_id).unwrap(), dec!(-5));
        assert_eq!(store.movements(material_id).unwrap().len(), 6);

        store.compact().unwrap();
        assert_eq!(store.balance(material_id).unwrap(), dec!(-5));
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(MemoryStore::with_checkpoint_interval(7));
        let material_id = Uuid::new_v4();

        std::thread::scope(|s| {
            for worker in 0..8 {
                let store = Arc::clone(&store);
                s.spawn(move || {
                    let ctx = OperatorContext::new(format!("worker-{}", worker));
                    for _ in 0..50 {
                        store
                            .append(StockMovement::add(material_id, dec!(2), MovementReason::Purchase, &ctx))
                            .unwrap();
                        store
                            .append(StockMovement::reduce(material_id, dec!(1), MovementReason::Production, &ctx))
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(store.movements(material_id).unwrap().len(), 800);
        assert_eq!(store.balance(material_id).unwrap(), dec!(400));
    }

    #[test]
    fn test_offline_store_is_retryable() {
        let store = MemoryStore::new();
        store.set_online(false);

        let err = store.balance(Uuid::new_v4()).unwrap_err();
        assert!(err.is_retryable());

        store.set_online(true);
        assert_eq!(store.balance(Uuid::new_v4()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_material_unit_is_immutable() {
        let store = MemoryStore::new();
        let material = RawMaterial::new("Ajwain", Unit::Kilogram, dec!(180));
        store.save_material(material.clone()).unwrap();

        let mut repriced = material.clone();
        repriced.cost_per_unit = dec!(190);
        store.save_material(repriced).unwrap();
        assert_eq!(store.material(material.id).unwrap().unwrap().cost_per_unit, dec!(190));

        // 以相同 ID 建立不同單位的原料
        let mut regrammed = RawMaterial::new(material.name.clone(), Unit::Gram, material.cost_per_unit);
        regrammed.id = material.id;
        assert!(matches!(
            store.save_material(regrammed),
            Err(SpiceError::ImmutableUnit { .. })
        ));
    }

    #[test]
    fn test_duplicate_formulation_name() {
        let store = MemoryStore::new();
        store
            .insert_formulation(Formulation::new("Biryani Masala", dec!(1), Unit::Kilogram))
            .unwrap();
        let err = store
            .insert_formulation(Formulation::new("Biryani Masala", dec!(2), Unit::Kilogram))
            .unwrap_err();
        assert!(matches!(err, SpiceError::DuplicateFormulationName(_)));
    }

    #[test]
    fn test_commit_confirmation_is_all_or_nothing() {
        let store = MemoryStore::new();
        let material_id = Uuid::new_v4();
        let batch = draft_batch();
        store.insert_batch(batch.clone()).unwrap();

        // 任一異動不合法時，整批不生效
        let bad = vec![
            StockMovement::reduce(material_id, dec!(4), MovementReason::Production, &ctx()),
            StockMovement::reduce(material_id, Decimal::ZERO, MovementReason::Production, &ctx()),
        ];
        assert!(store.commit_confirmation(batch.id, 0, snapshot(), bad).is_err());
        assert_eq!(store.movement_count().unwrap(), 0);
        assert!(!store.batch(batch.id).unwrap().unwrap().is_confirmed());

        let good = vec![StockMovement::reduce(material_id, dec!(4), MovementReason::Production, &ctx())];
        let confirmed = store.commit_confirmation(batch.id, 0, snapshot(), good.clone()).unwrap();
        assert!(confirmed.is_confirmed());
        assert!(confirmed.snapshot.is_some());
        assert_eq!(store.balance(material_id).unwrap(), dec!(-4));

        // 重複確認失敗且不寫入異動
        let err = store.commit_confirmation(batch.id, 0, snapshot(), good).unwrap_err();
        assert!(matches!(err, SpiceError::BatchAlreadyConfirmed(_)));
        assert_eq!(store.movement_count().unwrap(), 1);
    }

    #[test]
    fn test_update_draft_rejects_confirmed() {
        let store = MemoryStore::new();
        let batch = draft_batch();
        store.insert_batch(batch.clone()).unwrap();
        let updated = store.update_draft(batch.clone()).unwrap();
        assert_eq!(updated.revision, 1);
        store.commit_confirmation(batch.id, 1, snapshot(), Vec::new()).unwrap();

        assert!(matches!(
            store.update_draft(updated),
            Err(SpiceError::BatchAlreadyConfirmed(_))
        ));
        assert!(matches!(
            store.update_draft(draft_batch()),
            Err(SpiceError::BatchNotFound(_))
        ));
    }

    #[test]
    fn test_stale_draft_is_rejected() {
        let store = MemoryStore::new();
        let material_id = Uuid::new_v4();
        let batch = draft_batch();
        store.insert_batch(batch.clone()).unwrap();

        // 兩份同版本草稿，只有先寫入者成功
        let first = store.update_draft(batch.clone()).unwrap();
        assert!(matches!(
            store.update_draft(batch.clone()),
            Err(SpiceError::BatchModified(_))
        ));

        let movements = vec![StockMovement::reduce(material_id, dec!(2), MovementReason::Production, &ctx())];
        assert!(matches!(
            store.commit_confirmation(batch.id, batch.revision, snapshot(), movements.clone()),
            Err(SpiceError::BatchModified(_))
        ));
        assert_eq!(store.movement_count().unwrap(), 0);
        assert!(!store.batch(batch.id).unwrap().unwrap().is_confirmed());

        store
            .commit_confirmation(batch.id, first.revision, snapshot(), movements)
            .unwrap();
        assert_eq!(store.balance(material_id).unwrap(), dec!(-2));
    }

    #[test]
    fn test_commit_promotion_writes_formulation_and_status_together() {
        let store = MemoryStore::new();
        let material_id = Uuid::new_v4();
        let existing = Formulation::new("Sambar Powder", dec!(5), Unit::Kilogram)
            .with_ingredient(Uuid::new_v4(), dec!(100));
        store.insert_formulation(existing.clone()).unwrap();

        let research = ResearchFormulation::new("Sambar Powder", dec!(1), Unit::Kilogram)
            .with_ingredient(material_id, dec!(100));
        store.save_research(research.clone()).unwrap();

        let outcome = store
            .commit_promotion(research.id, research.to_formulation())
            .unwrap();
        assert_eq!(outcome.formulation().id, existing.id);
        assert_eq!(
            store.formulation(existing.id).unwrap().unwrap().ingredients[0].material_id,
            material_id
        );
        assert_eq!(
            store.research(research.id).unwrap().unwrap().status,
            ResearchStatus::Approved
        );

        // 已核准者不可再次晉升，正式配方維持不變
        let err = store
            .commit_promotion(research.id, research.to_formulation())
            .unwrap_err();
        assert!(matches!(err, SpiceError::ResearchNotApprovable(_)));
        assert_eq!(store.formulation(existing.id).unwrap().unwrap().ingredients.len(), 1);
    }

    #[test]
    fn test_commit_promotion_offline_leaves_research_draft() {
        let store = MemoryStore::new();
        let research = ResearchFormulation::new("Rasam Powder", dec!(1), Unit::Kilogram)
            .with_ingredient(Uuid::new_v4(), dec!(100));
        store.save_research(research.clone()).unwrap();

        store.set_online(false);
        let err = store
            .commit_promotion(research.id, research.to_formulation())
            .unwrap_err();
        assert!(err.is_retryable());

        store.set_online(true);
        assert!(store.research(research.id).unwrap().unwrap().is_draft());
        assert!(store.formulation_by_name("Rasam Powder").unwrap().is_none());
    }
}
