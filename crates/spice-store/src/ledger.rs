//! 庫存帳
//!
//! 餘額永遠由異動歷史折算，不存可變計數器；允許負餘額
//! （生產可以先於採購入帳）。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use spice_core::{MovementStore, SpiceError, StockMovement};
use uuid::Uuid;

/// 庫存帳
pub struct StockLedger<'a> {
    store: &'a dyn MovementStore,
}

impl<'a> StockLedger<'a> {
    pub fn new(store: &'a dyn MovementStore) -> Self {
        Self { store }
    }

    /// 追加一筆異動（唯一的寫入操作，不檢查寫入後的餘額）
    pub fn append(&self, movement: StockMovement) -> spice_core::Result<()> {
        if movement.quantity <= Decimal::ZERO {
            return Err(SpiceError::InvalidQuantity(movement.quantity));
        }

        tracing::info!(
            "庫存異動：原料 {} {:?} {} ({:?})，操作人員 {}",
            movement.material_id,
            movement.action,
            movement.quantity,
            movement.reason,
            movement.actor
        );
        self.store.append(movement)
    }

    /// 目前餘額（原料基準單位）
    pub fn balance(&self, material_id: Uuid) -> spice_core::Result<Decimal> {
        self.store.balance(material_id)
    }

    /// 指定時間點（含）的餘額
    pub fn balance_at(&self, material_id: Uuid, at: DateTime<Utc>) -> spice_core::Result<Decimal> {
        self.store.balance_at(material_id, at)
    }

    /// 異動歷史（依寫入順序）
    pub fn history(&self, material_id: Uuid) -> spice_core::Result<Vec<StockMovement>> {
        self.store.movements(material_id)
    }
}
