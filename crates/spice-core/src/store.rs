//! 儲存層介面
//!
//! 核心只透過這些 trait 存取外部資料；所有方法都可能回傳
//! `SpiceError::Persistence`，由呼叫端決定是否整體重試。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    fold_balance, BatchSnapshot, Formulation, FormulationIngredient, ProductionBatch,
    PromotionOutcome, RawMaterial, ResearchFormulation, Result, SpiceError, StockMovement,
};

/// 原料主檔
pub trait MaterialStore: Send + Sync {
    fn material(&self, id: Uuid) -> Result<Option<RawMaterial>>;

    fn materials(&self) -> Result<Vec<RawMaterial>>;

    fn save_material(&self, material: RawMaterial) -> Result<()>;

    /// 確認配方中每項原料都存在於主檔
    fn ensure_materials(&self, ingredients: &[FormulationIngredient]) -> Result<()> {
        for ingredient in ingredients {
            if self.material(ingredient.material_id)?.is_none() {
                return Err(SpiceError::MaterialNotFound(ingredient.material_id));
            }
        }
        Ok(())
    }
}

/// 配方與研發配方
pub trait FormulationStore: Send + Sync {
    fn formulation(&self, id: Uuid) -> Result<Option<Formulation>>;

    fn formulation_by_name(&self, name: &str) -> Result<Option<Formulation>>;

    /// 新增配方，名稱重複時回傳 `DuplicateFormulationName`
    fn insert_formulation(&self, formulation: Formulation) -> Result<()>;

    fn research(&self, id: Uuid) -> Result<Option<ResearchFormulation>>;

    fn save_research(&self, research: ResearchFormulation) -> Result<()>;

    /// 原子性晉升研發配方
    ///
    /// 研發配方須仍為草稿。同名配方存在時整批替換其原料（先全刪再重建，
    /// 保留原配方ID、基準數量與單位），否則新增 `candidate`；
    /// 研發配方狀態轉為 approved 與配方寫入一併生效。
    fn commit_promotion(
        &self,
        research_id: Uuid,
        candidate: Formulation,
    ) -> Result<PromotionOutcome>;
}

/// 庫存異動（僅追加）
pub trait MovementStore: Send + Sync {
    /// 單筆寫入，各自提交
    fn append(&self, movement: StockMovement) -> Result<()>;

    /// 某原料的全部異動（依寫入順序）
    fn movements(&self, material_id: Uuid) -> Result<Vec<StockMovement>>;

    /// 目前餘額
    fn balance(&self, material_id: Uuid) -> Result<Decimal> {
        Ok(fold_balance(&self.movements(material_id)?))
    }

    /// 指定時間點（含）的餘額
    fn balance_at(&self, material_id: Uuid, at: DateTime<Utc>) -> Result<Decimal> {
        let movements = self.movements(material_id)?;
        Ok(fold_balance(movements.iter().filter(|m| m.recorded_at <= at)))
    }
}

/// 生產批次
pub trait BatchStore: Send + Sync {
    fn batch(&self, id: Uuid) -> Result<Option<ProductionBatch>>;

    fn insert_batch(&self, batch: ProductionBatch) -> Result<()>;

    /// 更新草稿批次並遞增版本
    ///
    /// 已確認批次回傳 `BatchAlreadyConfirmed`；`batch.revision` 與儲存中的版本
    /// 不同時回傳 `BatchModified`。
    fn update_draft(&self, batch: ProductionBatch) -> Result<ProductionBatch>;

    /// 原子性確認：凍結快照、寫入全部出庫異動、狀態轉為 confirmed
    ///
    /// 儲存中的草稿版本必須等於 `expected_revision`，否則回傳 `BatchModified`。
    /// 全部成功或全部不生效。
    fn commit_confirmation(
        &self,
        batch_id: Uuid,
        expected_revision: u64,
        snapshot: BatchSnapshot,
        movements: Vec<StockMovement>,
    ) -> Result<ProductionBatch>;
}
