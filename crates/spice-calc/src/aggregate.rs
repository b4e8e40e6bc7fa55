//! 批次成本、包裝損耗與銷售利潤彙總

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spice_core::{guarded_div, normalize, BatchSummary, MaterialRequirement, SpiceError, Unit};

/// 包裝明細（每包規格 × 包數）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingLine {
    pub pack_size: Decimal,
    pub pack_unit: Unit,
    pub packet_count: u32,
}

impl PackagingLine {
    pub fn new(pack_size: Decimal, pack_unit: Unit, packet_count: u32) -> Self {
        Self {
            pack_size,
            pack_unit,
            packet_count,
        }
    }

    /// 包裝總重（換算為 `unit`）
    pub fn weight_in(&self, unit: Unit) -> Decimal {
        normalize(
            self.pack_size * Decimal::from(self.packet_count),
            self.pack_unit,
            unit,
        )
    }
}

/// 包裝階段彙總
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagingSummary {
    pub unit: Unit,
    /// 投入散裝重量
    pub input_quantity: Decimal,
    /// 已包裝重量
    pub packaged_quantity: Decimal,
    /// 損耗重量
    pub loss_quantity: Decimal,
    /// 剩餘散裝重量
    pub remaining_loose_quantity: Decimal,
    /// 損耗百分比
    pub loss_percentage: Decimal,
}

/// 銷售明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesLine {
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub unit_cost: Decimal,
}

impl SalesLine {
    pub fn new(quantity: Decimal, unit_price: Decimal, unit_cost: Decimal) -> Self {
        Self {
            quantity,
            unit_price,
            unit_cost,
        }
    }
}

/// 銷售利潤彙總
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub quantity: Decimal,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub margin_percentage: Decimal,
}

/// 彙總計算器
pub struct BatchAggregator;

impl BatchAggregator {
    /// 批次成本彙總
    ///
    /// 一律使用實際數量與依實際數量重算的成本；最終產出為零時每單位成本為零。
    pub fn aggregate(
        final_output_quantity: Decimal,
        loss_quantity: Decimal,
        requirements: &[MaterialRequirement],
    ) -> BatchSummary {
        let total_raw_material_consumed: Decimal =
            requirements.iter().map(|r| r.actual_quantity).sum();
        let total_production_cost: Decimal = requirements.iter().map(|r| r.cost).sum();

        if final_output_quantity.is_zero() {
            tracing::debug!("最終產出為零，每單位成本記為 0");
        }

        BatchSummary {
            total_raw_material_consumed,
            final_output_quantity,
            loss_quantity,
            total_production_cost,
            cost_per_base_unit: guarded_div(total_production_cost, final_output_quantity),
        }
    }

    /// 包裝損耗彙總
    pub fn packaging(
        input_quantity: Decimal,
        unit: Unit,
        lines: &[PackagingLine],
        loss_quantity: Decimal,
    ) -> spice_core::Result<PackagingSummary> {
        if input_quantity < Decimal::ZERO {
            return Err(SpiceError::InvalidQuantity(input_quantity));
        }
        if loss_quantity < Decimal::ZERO {
            return Err(SpiceError::InvalidQuantity(loss_quantity));
        }
        if let Some(line) = lines.iter().find(|l| l.pack_size <= Decimal::ZERO) {
            return Err(SpiceError::InvalidQuantity(line.pack_size));
        }

        let packaged_quantity: Decimal = lines.iter().map(|l| l.weight_in(unit)).sum();
        let remaining_loose_quantity = input_quantity - packaged_quantity - loss_quantity;
        if remaining_loose_quantity < Decimal::ZERO {
            tracing::warn!(
                "包裝重量 {} + 損耗 {} 超過投入 {} {}",
                packaged_quantity,
                loss_quantity,
                input_quantity,
                unit
            );
        }

        Ok(PackagingSummary {
            unit,
            input_quantity,
            packaged_quantity,
            loss_quantity,
            remaining_loose_quantity,
            loss_percentage: guarded_div(loss_quantity * Decimal::ONE_HUNDRED, input_quantity),
        })
    }

    /// 銷售利潤彙總
    pub fn sales(lines: &[SalesLine]) -> SalesSummary {
        let quantity: Decimal = lines.iter().map(|l| l.quantity).sum();
        let revenue: Decimal = lines.iter().map(|l| l.quantity * l.unit_price).sum();
        let cost: Decimal = lines.iter().map(|l| l.quantity * l.unit_cost).sum();
        let profit = revenue - cost;

        SalesSummary {
            quantity,
            revenue,
            cost,
            profit,
            margin_percentage: guarded_div(profit * Decimal::ONE_HUNDRED, revenue),
        }
    }
}
