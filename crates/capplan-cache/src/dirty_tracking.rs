//! 髒標記追蹤

use std::collections::BTreeSet;

/// 髒標記追蹤器（記錄有未儲存編輯的產線）
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    demand_lines: BTreeSet<String>,
    capacity_lines: BTreeSet<String>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記產線有需求編輯
    pub fn mark_demand(&mut self, line: &str) {
        self.demand_lines.insert(line.to_string());
    }

    /// 標記產線有產能編輯
    pub fn mark_capacity(&mut self, line: &str) {
        self.capacity_lines.insert(line.to_string());
    }

    /// 檢查產線是否有任何未儲存編輯
    pub fn is_dirty(&self, line: &str) -> bool {
        self.demand_lines.contains(line) || self.capacity_lines.contains(line)
    }

    pub fn has_demand_edits(&self) -> bool {
        !self.demand_lines.is_empty()
    }

    pub fn has_capacity_edits(&self) -> bool {
        !self.capacity_lines.is_empty()
    }

    pub fn clear_demand(&mut self) {
        self.demand_lines.clear();
    }

    pub fn clear_capacity(&mut self) {
        self.capacity_lines.clear();
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.demand_lines.clear();
        self.capacity_lines.clear();
    }

    /// 獲取所有髒產線（排序）
    pub fn dirty_lines(&self) -> Vec<String> {
        self.demand_lines
            .union(&self.capacity_lines)
            .cloned()
            .collect()
    }
}
