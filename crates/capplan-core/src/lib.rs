//! # Capacity Planning Core
//!
//! 核心資料模型與類型定義（需求、產能、優化結果、模擬與輸出表格）

pub mod calendar;
pub mod capacity;
pub mod config;
pub mod demand;
pub mod numeric;
pub mod optimization;
pub mod projection;
pub mod simulation;

// Re-export 主要類型
pub use calendar::{DateKey, Granularity};
pub use capacity::{
    BaselineCapacityEntry, CapacityCell, CapacityEdit, CapacityInputs, CapacityOverlay,
    CapacityRecord, LineCapacity, ShiftBound,
};
pub use config::ReportConfig;
pub use demand::{
    BaselineLoadEntry, DemandEditEntry, DemandInputs, DemandOverlay, DemandUnit, LineDemand,
    LineLoadSeries, ProductRates, RateKind,
};
pub use numeric::{safe_div, Rounding};
pub use optimization::{LineOptimization, OptimizationInputs};
pub use projection::{CapacityChart, ChartSeries, LabelColumn, ProjectionRow, ProjectionTable};
pub use simulation::{SimulationId, SimulationMeta, SimulationStatus};

/// 產能規劃錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("無效的紀錄鍵: {0}")]
    InvalidRecordKey(String),

    #[error("資料形狀不一致: {key} 長度 {actual}，預期最多 {expected}")]
    ShapeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("未知的需求單位: {0}")]
    UnknownUnit(String),

    #[error("未知的時間粒度: {0}")]
    UnknownGranularity(String),

    #[error("無效的時間區間: {start} 晚於 {end}")]
    InvalidWindow { start: DateKey, end: DateKey },

    #[error("找不到產線: {0}")]
    LineNotFound(String),

    #[error("找不到產品: 產線 {line} 索引 {index}")]
    ProductNotFound { line: String, index: usize },

    #[error("單位 {0} 為衍生值，不可直接編輯")]
    NotEditable(DemandUnit),

    #[error("無法比較模擬: {0}")]
    ComparisonNotAllowed(String),

    #[error("沒有待儲存的編輯")]
    NothingToSave,

    #[error("資料儲存失敗: {0}")]
    Store(String),

    #[error("JSON 解析錯誤: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlanError>;
