//! 餘額檢查點

use rust_decimal::Decimal;
use spice_core::{fold_balance, StockMovement};
use std::collections::HashMap;
use uuid::Uuid;

use crate::DirtyTracker;

/// 單一原料的檢查點：前 `covered` 筆異動的合計
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub covered: usize,
    pub balance: Decimal,
}

/// 各原料的檢查點
///
/// 必須與異動寫入在同一把鎖內更新，才能保證檢查點與其彙總的異動一致。
#[derive(Debug)]
pub struct BalanceCheckpoints {
    interval: usize,
    checkpoints: HashMap<Uuid, Checkpoint>,
    dirty: DirtyTracker,
}

impl BalanceCheckpoints {
    /// 創建新的檢查點集合
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            checkpoints: HashMap::new(),
            dirty: DirtyTracker::new(),
        }
    }

    /// 異動寫入後呼叫：標記為髒，超過間隔則推進檢查點
    pub fn record_append(&mut self, material_id: Uuid, log: &[StockMovement]) {
        self.dirty.mark_dirty(material_id);

        let covered = self.checkpoint(material_id).covered;
        if log.len().saturating_sub(covered) >= self.interval {
            self.advance(material_id, log);
        }
    }

    /// 以檢查點加上之後的異動重算餘額
    pub fn balance(&self, material_id: Uuid, log: &[StockMovement]) -> Decimal {
        let checkpoint = self.checkpoint(material_id);
        if checkpoint.covered > log.len() {
            tracing::warn!(
                "原料 {} 檢查點超出異動筆數 ({} > {})，改為完整重算",
                material_id,
                checkpoint.covered,
                log.len()
            );
            return fold_balance(log);
        }
        checkpoint.balance + fold_balance(&log[checkpoint.covered..])
    }

    /// 推進檢查點到目前異動尾端
    pub fn advance(&mut self, material_id: Uuid, log: &[StockMovement]) {
        let balance = self.balance(material_id, log);
        self.checkpoints.insert(
            material_id,
            Checkpoint {
                covered: log.len(),
                balance,
            },
        );
        self.dirty.mark_clean(material_id);
        tracing::debug!(
            "原料 {} 檢查點推進至第 {} 筆，餘額 {}",
            material_id,
            log.len(),
            balance
        );
    }

    /// 推進所有髒原料的檢查點
    pub fn compact(&mut self, logs: &HashMap<Uuid, Vec<StockMovement>>) {
        for material_id in self.dirty.dirty_materials() {
            if let Some(log) = logs.get(&material_id) {
                self.advance(material_id, log);
            }
        }
    }

    /// 移除單一原料的檢查點
    pub fn invalidate(&mut self, material_id: Uuid) {
        self.checkpoints.remove(&material_id);
        self.dirty.mark_dirty(material_id);
    }

    /// 取得檢查點（不存在時為空檢查點）
    pub fn checkpoint(&self, material_id: Uuid) -> Checkpoint {
        self.checkpoints
            .get(&material_id)
            .copied()
            .unwrap_or(Checkpoint {
                covered: 0,
                balance: Decimal::ZERO,
            })
    }

    pub fn is_dirty(&self, material_id: Uuid) -> bool {
        self.dirty.is_dirty(material_id)
    }
}
