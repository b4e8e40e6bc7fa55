//! 研發配方晉升

use spice_core::{
    EngineConfig, FormulationStore, MaterialStore, PromotionOutcome, ResearchStatus, SpiceError,
};
use uuid::Uuid;

/// 研發配方核准流程
pub struct ResearchPromotion;

impl ResearchPromotion {
    /// 核准研發配方並寫入正式配方
    ///
    /// 同名配方存在時以「最新者為準」整批覆蓋其原料（先全刪再重建），
    /// 保留原配方ID、基準數量與單位，不做合併。原料必須都已建檔。
    pub fn approve(
        materials: &dyn MaterialStore,
        store: &dyn FormulationStore,
        research_id: Uuid,
        config: &EngineConfig,
    ) -> spice_core::Result<PromotionOutcome> {
        let research = store
            .research(research_id)?
            .ok_or(SpiceError::ResearchNotFound(research_id))?;
        if !research.is_draft() {
            return Err(SpiceError::ResearchNotApprovable(format!(
                "{} 狀態為 {:?}",
                research.name, research.status
            )));
        }

        let candidate = research.to_formulation();
        candidate.validate_for_authoring(config.percentage_tolerance)?;
        materials.ensure_materials(&candidate.ingredients)?;

        let outcome = store.commit_promotion(research_id, candidate)?;
        match &outcome {
            PromotionOutcome::Overwritten {
                formulation,
                replaced,
            } => tracing::warn!(
                "研發配方 {} 覆蓋既有配方 {} 的 {} 項原料",
                research.name,
                formulation.id,
                replaced.len()
            ),
            PromotionOutcome::Created(formulation) => {
                tracing::info!("研發配方 {} 晉升為新配方 {}", research.name, formulation.id)
            }
        }
        Ok(outcome)
    }

    /// 駁回研發配方
    pub fn reject(store: &dyn FormulationStore, research_id: Uuid) -> spice_core::Result<()> {
        let mut research = store
            .research(research_id)?
            .ok_or(SpiceError::ResearchNotFound(research_id))?;
        if !research.is_draft() {
            return Err(SpiceError::ResearchNotApprovable(format!(
                "{} 狀態為 {:?}",
                research.name, research.status
            )));
        }
        research.status = ResearchStatus::Rejected;
        store.save_research(research)
    }
}
