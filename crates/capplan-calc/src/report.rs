//! 產能報表主計算器

use capplan_core::{
    CapacityInputs, CapacityOverlay, DemandInputs, DemandOverlay, DemandUnit, OptimizationInputs,
    ReportConfig, Result, SimulationMeta,
};

use crate::bucketing::BucketingCalculator;
use crate::capacity::CapacityResolver;
use crate::chart::ChartBuilder;
use crate::normalizer::DemandView;
use crate::projection::{ProjectionBuilder, SummaryContext, SummaryMetric};
use crate::{CapacityReport, ReportWarning};

/// 單一模擬報表的輸入（皆為借用，計算不修改任何輸入）
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub meta: &'a SimulationMeta,
    pub demand: &'a DemandInputs,
    pub demand_overlay: &'a DemandOverlay,
    pub capacity: &'a CapacityInputs,
    pub capacity_overlay: &'a CapacityOverlay,
    pub optimization: &'a OptimizationInputs,
}

/// 產能報表計算器
pub struct CapacityReportCalculator {
    config: ReportConfig,
}

impl CapacityReportCalculator {
    /// 創建新的報表計算器
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// 報表計算入口
    pub fn calculate(&self, inputs: &ReportInputs<'_>, version: u64) -> Result<CapacityReport> {
        tracing::info!(
            "開始產能報表計算：產線 {} 條，粒度 {}，單位 {}",
            self.config.lines.len(),
            self.config.granularity,
            self.config.demand_unit
        );

        let start_time = std::time::Instant::now();
        let mut warnings = Vec::new();

        // Step 1: 決定月份區間
        tracing::debug!("Step 1: 決定月份區間");
        let (window_start, window_end) = self.config.resolve_window(inputs.meta)?;
        let dates = BucketingCalculator::month_range(window_start, window_end);
        let buckets = BucketingCalculator::group_by_bucket(&dates, self.config.granularity);
        tracing::debug!("月份 {} 個，時間桶 {} 個", dates.len(), buckets.len());

        // Step 2: 決定輸出產線
        tracing::debug!("Step 2: 決定輸出產線");
        let lines = self.resolve_lines(inputs.demand, &mut warnings);

        // Step 3: 套用產能編輯
        tracing::debug!("Step 3: 套用產能編輯 ({} 筆)", inputs.capacity_overlay.len());
        let capacity = CapacityResolver::apply_overlay(inputs.capacity, inputs.capacity_overlay);
        for line in &lines {
            if capacity.line(line).map_or(true, |c| c.records.is_empty()) {
                warnings.push(ReportWarning::warning(
                    line.clone(),
                    "產線沒有產能紀錄，產能以 0 計".to_string(),
                ));
            }
        }

        // Step 4: 摘要表
        tracing::debug!("Step 4: 建立摘要表");
        let view = DemandView::new(inputs.demand, inputs.demand_overlay);
        let ctx = SummaryContext {
            view,
            capacity: &capacity,
            optimization: inputs.optimization,
            lines: &lines,
            dates: &dates,
        };
        let monthly = ProjectionBuilder::build_summary(&ctx);
        let mut summary = ProjectionBuilder::regroup_table(
            &monthly,
            &buckets,
            &ProjectionBuilder::summary_ratio_rules(),
        );
        let removed = ProjectionBuilder::apply_unit_filter(
            &mut summary,
            self.config.demand_unit,
            SummaryMetric::DemandLoad.label(),
        );
        if removed > 0 {
            tracing::debug!("單位過濾移除 {} 列", removed);
        }

        // Step 5: 圖表
        tracing::debug!("Step 5: 建立圖表");
        let granularity = self.config.granularity;
        let unit = self.config.demand_unit;
        let load_chart = ChartBuilder::load_series(&view, &lines, &buckets, granularity, unit)?;
        let capacity_chart =
            ChartBuilder::capacity_chart(&capacity, &lines, &buckets, granularity, unit)?;
        let optimal_chart = ChartBuilder::optimal_series(
            &capacity,
            inputs.optimization,
            &lines,
            &buckets,
            granularity,
            unit,
            inputs.meta.status,
        )?;

        if inputs.meta.status.is_success()
            && optimal_chart.is_empty()
            && unit == DemandUnit::Hours
        {
            warnings.push(ReportWarning::info(
                String::new(),
                "優化成功但所選產線沒有優化輸出".to_string(),
            ));
        }

        let elapsed = start_time.elapsed().as_millis();
        tracing::info!(
            "產能報表計算完成：摘要 {} 列，負荷圖 {} 點，警告 {} 條，耗時 {} ms",
            summary.len(),
            load_chart.len(),
            warnings.len(),
            elapsed
        );

        Ok(CapacityReport {
            summary,
            load_chart,
            capacity_chart,
            optimal_chart,
            status: inputs.meta.status,
            warnings,
            version,
            calculation_time_ms: Some(elapsed),
        })
    }

    /// 選取的產線中實際有需求資料者（保持選取順序）
    ///
    /// 未選取任何產線時輸出全部有需求資料的產線
    fn resolve_lines(
        &self,
        demand: &DemandInputs,
        warnings: &mut Vec<ReportWarning>,
    ) -> Vec<String> {
        if self.config.lines.is_empty() {
            return demand.lines.keys().cloned().collect();
        }

        let mut lines = Vec::with_capacity(self.config.lines.len());
        for line in &self.config.lines {
            if demand.line(line).is_some() {
                if !lines.contains(line) {
                    lines.push(line.clone());
                }
            } else {
                tracing::warn!("選取的產線沒有需求資料: {}", line);
                warnings.push(ReportWarning::warning(
                    line.clone(),
                    "選取的產線沒有需求資料".to_string(),
                ));
            }
        }
        lines
    }
}
