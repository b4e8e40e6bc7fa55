//! 庫存異動模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::OperatorContext;

/// 異動方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockAction {
    /// 入庫
    Add,
    /// 出庫
    Reduce,
}

/// 異動原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementReason {
    /// 採購
    Purchase,
    /// 耗損
    Wastage,
    /// 損壞
    Damage,
    /// 更正
    Correction,
    /// 生產領用
    Production,
}

/// 庫存異動（僅可追加，不可修改）
///
/// 數量一律以原料的基準單位記錄，方向由 `action` 決定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    /// 異動ID
    pub id: Uuid,

    /// 原料ID
    pub material_id: Uuid,

    /// 數量（原料基準單位）
    pub quantity: Decimal,

    /// 方向
    pub action: StockAction,

    /// 原因
    pub reason: MovementReason,

    /// 參考（如採購單號、批次號）
    pub reference: Option<String>,

    /// 操作人員
    pub actor: String,

    /// 記錄時間
    pub recorded_at: DateTime<Utc>,
}

impl StockMovement {
    /// 創建新的異動
    pub fn new(
        material_id: Uuid,
        quantity: Decimal,
        action: StockAction,
        reason: MovementReason,
        ctx: &OperatorContext,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            material_id,
            quantity,
            action,
            reason,
            reference: None,
            actor: ctx.operator.clone(),
            recorded_at: ctx.timestamp,
        }
    }

    /// 入庫異動
    pub fn add(
        material_id: Uuid,
        quantity: Decimal,
        reason: MovementReason,
        ctx: &OperatorContext,
    ) -> Self {
        Self::new(material_id, quantity, StockAction::Add, reason, ctx)
    }

    /// 出庫異動
    pub fn reduce(
        material_id: Uuid,
        quantity: Decimal,
        reason: MovementReason,
        ctx: &OperatorContext,
    ) -> Self {
        Self::new(material_id, quantity, StockAction::Reduce, reason, ctx)
    }

    /// 建構器模式：設置參考
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// 帶方向的數量（入庫為正，出庫為負）
    pub fn signed_quantity(&self) -> Decimal {
        match self.action {
            StockAction::Add => self.quantity,
            StockAction::Reduce => -self.quantity,
        }
    }
}

/// 依異動歷史折算餘額（入庫加、出庫減）
pub fn fold_balance<'a>(movements: impl IntoIterator<Item = &'a StockMovement>) -> Decimal {
    movements
        .into_iter()
        .fold(Decimal::ZERO, |balance, m| balance + m.signed_quantity())
}
