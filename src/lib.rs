//! # capplan
//!
//! 產能規劃引擎：需求／產能對帳、時間分桶彙總、模擬比較與編輯會話
//!
//! ```no_run
//! use capplan::{logging, CapacityReportCalculator, ReportConfig};
//!
//! logging::init();
//! let calculator = CapacityReportCalculator::new(ReportConfig::new(vec!["L1".into()]));
//! ```

pub mod logging;

pub use capplan_cache::{DirtyTracker, EditSession, MemoryStore, SimulationStore};
pub use capplan_calc::{
    BucketingCalculator, CapacityReport, CapacityReportCalculator, CapacityResolver, DemandView,
    ProjectionBuilder, RatioRule, RatioScale, ReportInputs, ReportWarning, UnitConverter,
    WarningSeverity,
};
pub use capplan_compare::{
    ComparisonCalculator, ComparisonMerger, ComparisonRequest, MergedDataset, SimulationDataset,
};
pub use capplan_core::*;
pub use capplan_optimizer::{OptimizerOutcome, ShiftDistribution, ShiftDistributor};
