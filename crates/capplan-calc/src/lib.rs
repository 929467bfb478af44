//! # Capacity Calculation Engine
//!
//! 需求／產能對帳與彙總引擎

pub mod aggregation;
pub mod bucketing;
pub mod capacity;
pub mod chart;
pub mod normalizer;
pub mod projection;
pub mod report;

// Re-export 主要類型
pub use aggregation::{DemandAggregator, Delta};
pub use bucketing::{BucketingCalculator, DateBuckets};
pub use capacity::CapacityResolver;
pub use chart::ChartBuilder;
pub use normalizer::{
    classify_change, resolve_value, ChangeKind, ConversionOp, DemandView, UnitConverter,
    UnitValues,
};
pub use projection::{ProjectionBuilder, RatioRule, RatioScale, SummaryMetric};
pub use report::{CapacityReportCalculator, ReportInputs};

use capplan_core::{CapacityChart, ChartSeries, ProjectionTable, SimulationStatus};
use serde::Serialize;

/// 單一模擬的產能報表
#[derive(Debug, Clone, Serialize)]
pub struct CapacityReport {
    /// 摘要表（已按粒度分桶並套用單位過濾）
    pub summary: ProjectionTable,

    /// 負荷圖序列
    pub load_chart: ChartSeries,

    /// 產能圖（僅工時單位）
    pub capacity_chart: CapacityChart,

    /// 最佳產能圖（僅工時單位且優化成功）
    pub optimal_chart: ChartSeries,

    /// 優化執行狀態（`description()` 為狀態訊息）
    pub status: SimulationStatus,

    /// 警告信息
    pub warnings: Vec<ReportWarning>,

    /// 計算時的編輯版本
    pub version: u64,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl CapacityReport {
    /// 添加警告
    pub fn add_warning(&mut self, warning: ReportWarning) {
        self.warnings.push(warning);
    }

    /// 報表是否落後於目前的編輯版本
    pub fn is_stale(&self, current_version: u64) -> bool {
        self.version != current_version
    }
}

/// 報表警告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportWarning {
    pub line: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ReportWarning {
    pub fn new(line: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            line,
            message,
            severity,
        }
    }

    pub fn info(line: String, message: String) -> Self {
        Self::new(line, message, WarningSeverity::Info)
    }

    pub fn warning(line: String, message: String) -> Self {
        Self::new(line, message, WarningSeverity::Warning)
    }

    pub fn error(line: String, message: String) -> Self {
        Self::new(line, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
