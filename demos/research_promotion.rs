//! 研發配方核准示範（同名配方整批覆蓋）
//!
//! 執行：RUST_LOG=debug cargo run --example research_promotion

use rust_decimal_macros::dec;
use spice_ledger::{
    EngineConfig, Formulation, PromotionOutcome, ProductionService, RawMaterial,
    ResearchFormulation, Unit,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let service = ProductionService::in_memory(config);

    let cumin = RawMaterial::new("Cumin", Unit::Kilogram, dec!(310));
    let coriander = RawMaterial::new("Coriander", Unit::Kilogram, dec!(120));
    let cardamom = RawMaterial::new("Green Cardamom", Unit::Gram, dec!(2.8));
    for material in [&cumin, &coriander, &cardamom] {
        service.save_material(material.clone())?;
    }

    service.create_formulation(
        Formulation::new("Garam Masala", dec!(5), Unit::Kilogram)
            .with_ingredient(cumin.id, dec!(40))
            .with_ingredient(coriander.id, dec!(60)),
    )?;

    // 百分比合計不足 100，核准時被拒絕
    let draft = service.submit_research(
        ResearchFormulation::new("Garam Masala", dec!(5), Unit::Kilogram)
            .with_ingredient(cumin.id, dec!(35))
            .with_ingredient(cardamom.id, dec!(5))
            .with_notes("trial 1"),
    )?;
    if let Err(err) = service.approve_research(draft.id) {
        println!("試作 1 未核准：{}", err);
    }
    service.reject_research(draft.id)?;

    let research = service.submit_research(
        ResearchFormulation::new("Garam Masala", dec!(5), Unit::Kilogram)
            .with_ingredient(cumin.id, dec!(35))
            .with_ingredient(coriander.id, dec!(60))
            .with_ingredient(cardamom.id, dec!(5))
            .with_notes("trial 2"),
    )?;

    match service.approve_research(research.id)? {
        PromotionOutcome::Created(formulation) => {
            println!("新增配方 {}", formulation.name);
        }
        PromotionOutcome::Overwritten {
            formulation,
            replaced,
        } => {
            println!(
                "配方 {} 原有 {} 項原料已被覆蓋為 {} 項",
                formulation.name,
                replaced.len(),
                formulation.ingredients.len()
            );
            let plan = service.requirements(formulation.id, dec!(20))?;
            for req in &plan.requirements {
                println!(
                    "  {:<16} {:>5}%  {} {}  成本 {}",
                    req.material_name, req.percentage, req.required_quantity, req.unit, req.cost
                );
            }
        }
    }

    Ok(())
}
