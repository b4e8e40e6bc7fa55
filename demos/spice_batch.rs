//! 生產批次示範：進貨、需求解析、調整、替代、確認與包裝
//!
//! 執行：RUST_LOG=info cargo run --example spice_batch

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spice_ledger::{
    EngineConfig, Formulation, MovementReason, OperatorContext, PackagingLine,
    ProductionService, RawMaterial, SalesLine, StockAction, Unit,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let service = ProductionService::in_memory(EngineConfig::default());
    let keeper = OperatorContext::new("store-keeper");

    let chilli = RawMaterial::new("Red Chilli", Unit::Kilogram, dec!(200)).with_minimum_stock(dec!(10));
    let coriander = RawMaterial::new("Coriander", Unit::Kilogram, dec!(120));
    let saffron = RawMaterial::new("Saffron", Unit::Gram, dec!(0.5));
    let kashmiri = RawMaterial::new("Kashmiri Chilli", Unit::Kilogram, dec!(260));
    for material in [&chilli, &coriander, &saffron, &kashmiri] {
        service.save_material(material.clone())?;
    }

    for (material, quantity) in [
        (&chilli, dec!(12)),
        (&coriander, dec!(40)),
        (&saffron, dec!(3000)),
        (&kashmiri, dec!(8)),
    ] {
        service.adjust_stock(
            material.id,
            quantity,
            StockAction::Add,
            MovementReason::Purchase,
            Some("PO-2025-118".to_string()),
            &keeper,
        )?;
    }

    let formulation = service.create_formulation(
        Formulation::new("Tandoori Masala", dec!(10), Unit::Kilogram)
            .with_ingredient(chilli.id, dec!(20))
            .with_ingredient(coriander.id, dec!(70))
            .with_ingredient(saffron.id, dec!(10)),
    )?;

    let production_date = NaiveDate::from_ymd_opt(2025, 11, 20)
        .ok_or_else(|| anyhow::anyhow!("無效的生產日期"))?;
    let (batch, warnings) =
        service.plan_batch(formulation.id, dec!(50), 1, dec!(1.5), production_date)?;

    println!("批次 {}（{}）", batch.reference(), formulation.name);
    for req in &batch.requirements {
        println!(
            "  {:<16} 需求 {:>8} {}  可用 {:>8} {}  {:?}  成本 {}",
            req.material_name,
            req.required_quantity,
            req.unit,
            req.available_stock,
            req.unit,
            req.sufficiency,
            req.cost
        );
    }
    for warning in &warnings {
        println!("  [{:?}] {}: {}", warning.severity, warning.subject, warning.message);
    }

    // 番紅花不足，改用喀什米爾辣椒；辣椒略多投料
    service.substitute_material(batch.id, saffron.id, kashmiri.id)?;
    service.adjust_requirement(batch.id, chilli.id, dec!(10.2))?;

    let supervisor = OperatorContext::new("supervisor");
    let confirmed = service.confirm_batch(batch.id, Some(dec!(0.4)), &supervisor)?;
    if let Some(snapshot) = &confirmed.snapshot {
        let summary = &snapshot.summary;
        println!(
            "確認完成：投料 {} {}，產出 {}，總成本 {}，每單位成本 {}",
            summary.total_raw_material_consumed,
            confirmed.unit,
            summary.final_output_quantity,
            summary.total_production_cost,
            summary.cost_per_base_unit.round_dp(2)
        );
    }

    for material in [&chilli, &coriander, &saffron, &kashmiri] {
        println!(
            "  {:<16} 餘額 {} {}",
            material.name,
            service.balance(material.id)?,
            material.unit()
        );
    }

    for alert in service.low_stock_report()? {
        println!(
            "低庫存：{} 餘額 {} {}，缺 {}",
            alert.name, alert.balance, alert.unit, alert.shortfall
        );
    }

    let packaging = service.packaging_summary(
        batch.id,
        &[
            PackagingLine::new(dec!(100), Unit::Gram, 300),
            PackagingLine::new(dec!(500), Unit::Gram, 38),
        ],
        dec!(0.3),
    )?;
    println!(
        "包裝：{} {} 中包裝 {}，損耗 {}%，剩餘散裝 {}",
        packaging.input_quantity,
        packaging.unit,
        packaging.packaged_quantity,
        packaging.loss_percentage.round_dp(2),
        packaging.remaining_loose_quantity
    );

    let unit_cost = confirmed
        .snapshot
        .as_ref()
        .map(|s| s.summary.cost_per_base_unit)
        .unwrap_or(Decimal::ZERO);
    let sales = service.sales_summary(&[SalesLine::new(dec!(45), dec!(420), unit_cost)]);
    println!(
        "銷售：營收 {}，利潤 {}，毛利率 {}%",
        sales.revenue,
        sales.profit.round_dp(2),
        sales.margin_percentage.round_dp(2)
    );

    Ok(())
}
