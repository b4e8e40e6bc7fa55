//! 引擎配置

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Result, SpiceError};

/// 計算引擎參數配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 編修配方時百分比合計允許誤差
    pub percentage_tolerance: Decimal,

    /// 餘額檢查點間隔（檢查點後累積多少筆異動才推進）
    pub checkpoint_interval: usize,

    /// 批次確認時預設損耗
    pub default_loss_quantity: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            percentage_tolerance: Decimal::new(1, 2),
            checkpoint_interval: 256,
            default_loss_quantity: Decimal::ZERO,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置百分比誤差
    pub fn with_percentage_tolerance(mut self, tolerance: Decimal) -> Self {
        self.percentage_tolerance = tolerance;
        self
    }

    /// 建構器模式：設置檢查點間隔
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// 建構器模式：設置預設損耗
    pub fn with_default_loss_quantity(mut self, quantity: Decimal) -> Self {
        self.default_loss_quantity = quantity;
        self
    }

    /// 從 JSON 字串載入
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SpiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 從 JSON 檔案載入
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SpiceError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.percentage_tolerance < Decimal::ZERO {
            return Err(SpiceError::Config("percentage_tolerance 不可為負".to_string()));
        }
        if self.checkpoint_interval == 0 {
            return Err(SpiceError::Config("checkpoint_interval 必須大於 0".to_string()));
        }
        if self.default_loss_quantity < Decimal::ZERO {
            return Err(SpiceError::Config("default_loss_quantity 不可為負".to_string()));
        }
        Ok(())
    }
}
