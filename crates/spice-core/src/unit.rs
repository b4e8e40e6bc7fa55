//! 單位換算

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SpiceError;

/// 公斤與公克的固定比例
const GRAMS_PER_KILOGRAM: Decimal = Decimal::ONE_THOUSAND;

/// 質量單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// 公斤
    #[serde(rename = "kg")]
    Kilogram,
    /// 公克
    #[serde(rename = "gm")]
    Gram,
}

impl Unit {
    /// 單位標記
    pub fn tag(&self) -> &'static str {
        match self {
            Unit::Kilogram => "kg",
            Unit::Gram => "gm",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Unit {
    type Err = SpiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kg" => Ok(Unit::Kilogram),
            "gm" => Ok(Unit::Gram),
            other => Err(SpiceError::UnknownUnit(other.to_string())),
        }
    }
}

/// 單位換算（不做任何捨入）
///
/// kg→gm 乘以 1000，gm→kg 除以 1000，同單位原值回傳。
pub fn normalize(quantity: Decimal, from: Unit, to: Unit) -> Decimal {
    match (from, to) {
        (Unit::Kilogram, Unit::Gram) => quantity * GRAMS_PER_KILOGRAM,
        (Unit::Gram, Unit::Kilogram) => quantity / GRAMS_PER_KILOGRAM,
        _ => quantity,
    }
}
