//! 操作上下文

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 明確傳入的操作人員上下文，取代全域登入狀態
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorContext {
    /// 操作人員
    pub operator: String,

    /// 操作時間
    pub timestamp: DateTime<Utc>,
}

impl OperatorContext {
    /// 以目前時間創建上下文
    pub fn new(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            timestamp: Utc::now(),
        }
    }

    /// 建構器模式：指定操作時間
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
