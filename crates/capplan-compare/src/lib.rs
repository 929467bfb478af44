//! # Simulation Comparison
//!
//! 兩個模擬的命名空間合併與比較表

pub mod merge;
pub mod request;
pub mod table;

pub use merge::{
    ComparisonMerger, ExerciseCapacityRow, LoadRow, MergedDataset, OptimizationRow,
    SimulationDataset,
};
pub use request::ComparisonRequest;
pub use table::{ComparisonTableBuilder, Exercise};

use capplan_calc::BucketingCalculator;
use capplan_core::{ProjectionTable, ReportConfig, Result};

/// 比較計算器
pub struct ComparisonCalculator {
    config: ReportConfig,
}

impl ComparisonCalculator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// 比較入口：檢查資格、合併資料集、建立比較表
    ///
    /// 月份區間以第一個模擬為準；未選取產線時使用合併資料中的全部產線
    pub fn compare(
        &self,
        request: &ComparisonRequest,
        first: &SimulationDataset,
        second: &SimulationDataset,
    ) -> Result<ProjectionTable> {
        let (first_id, second_id) = request.validate()?;
        tracing::info!("開始比較: {} vs {}", first_id, second_id);

        let merged = ComparisonMerger::merge_namespaces(&first_id, first, &second_id, second)?;

        let (start, end) = self.config.resolve_window(&request.first)?;
        let dates = BucketingCalculator::month_range(start, end);

        let lines: Vec<String> = if self.config.lines.is_empty() {
            merged.lines().into_iter().map(str::to_string).collect()
        } else {
            self.config.lines.clone()
        };

        let table = ComparisonTableBuilder::build(
            &merged,
            &request.exercises(),
            &lines,
            &dates,
            self.config.demand_unit,
            self.config.granularity,
        );

        tracing::info!("比較表完成: {} 列 × {} 欄", table.len(), table.columns.len());
        Ok(table)
    }
}
