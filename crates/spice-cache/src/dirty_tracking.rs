//! 髒標記追蹤

use std::collections::HashSet;
use uuid::Uuid;

/// 髒標記追蹤器（檢查點之後有新異動的原料）
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty_materials: HashSet<Uuid>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記原料為髒
    pub fn mark_dirty(&mut self, material_id: Uuid) {
        self.dirty_materials.insert(material_id);
    }

    /// 清除單一原料的髒標記
    pub fn mark_clean(&mut self, material_id: Uuid) {
        self.dirty_materials.remove(&material_id);
    }

    /// 檢查原料是否為髒
    pub fn is_dirty(&self, material_id: Uuid) -> bool {
        self.dirty_materials.contains(&material_id)
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.dirty_materials.clear();
    }

    /// 獲取所有髒原料
    pub fn dirty_materials(&self) -> Vec<Uuid> {
        self.dirty_materials.iter().copied().collect()
    }
}
