//! # Capacity Optimizer Output
//!
//! 優化器輸出的使用規則（執行結果、班次分配）

pub mod shift_distribution;

// Re-export 主要類型
pub use shift_distribution::{DayCounts, ShiftDistribution, ShiftDistributor, MAX_SHIFTS_PER_DAY};

use capplan_core::{OptimizationInputs, SimulationStatus};

/// 一次優化執行的結果摘要
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerOutcome {
    pub status: SimulationStatus,

    /// 有優化輸出的產線
    pub lines_with_output: Vec<String>,

    /// 狀態信息
    pub messages: Vec<String>,
}

impl OptimizerOutcome {
    /// 由執行狀態與優化輸出建立
    pub fn from_inputs(status: SimulationStatus, optimization: &OptimizationInputs) -> Self {
        let lines_with_output: Vec<String> = optimization
            .lines
            .iter()
            .filter(|(_, line)| line.has_output())
            .map(|(name, _)| name.clone())
            .collect();

        let mut messages = vec![status.description().to_string()];
        if status.is_success() && lines_with_output.is_empty() {
            messages.push("優化成功但沒有任何產線的輸出".to_string());
        }

        Self {
            status,
            lines_with_output,
            messages,
        }
    }

    /// 優化結果是否可用於最佳產能圖
    pub fn is_usable(&self) -> bool {
        self.status.is_success() && !self.lines_with_output.is_empty()
    }

    pub fn has_output(&self, line: &str) -> bool {
        self.lines_with_output.iter().any(|l| l == line)
    }

    /// 所選產線的班次分配（依產線順序，每條產線依日期排序）
    pub fn shift_distribution(
        &self,
        optimization: &OptimizationInputs,
        lines: &[String],
    ) -> Vec<(String, Vec<ShiftDistribution>)> {
        lines
            .iter()
            .filter_map(|line| {
                optimization
                    .line(line)
                    .map(|opt| (line.clone(), ShiftDistributor::distribute_line(opt)))
            })
            .collect()
    }
}
