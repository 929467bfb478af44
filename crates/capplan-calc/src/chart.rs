//! 圖表序列

use capplan_core::{
    CapacityChart, CapacityInputs, ChartSeries, DemandUnit, Granularity, OptimizationInputs,
    Result, ShiftBound, SimulationStatus,
};
use rust_decimal::Decimal;

use crate::aggregation::DemandAggregator;
use crate::bucketing::{BucketingCalculator, DateBuckets};
use crate::capacity::CapacityResolver;
use crate::normalizer::DemandView;

pub const LOAD_LABEL: &str = "Load";
pub const OPTIMAL_LABEL: &str = "Optimal";

/// 圖表建構器
pub struct ChartBuilder;

impl ChartBuilder {
    /// 負荷圖
    ///
    /// 每個桶先放 `Load`；目前值高於基準時 `Load` 為基準值並附加
    /// `Extra {粒度}`（差值），低於基準時 `Load` 為目前值並附加
    /// `Reduced {粒度}`（負差值）
    pub fn load_series(
        view: &DemandView<'_>,
        lines: &[String],
        buckets: &DateBuckets,
        granularity: Granularity,
        unit: DemandUnit,
    ) -> Result<ChartSeries> {
        let current = DemandAggregator::aggregate(view, lines, unit);
        let original = DemandAggregator::aggregate_baseline(view, lines, unit);

        let mut series = ChartSeries::new();
        for (label, members) in buckets.iter() {
            let current_total: Decimal = members.iter().filter_map(|d| current.get(d)).sum();
            let original_total: Decimal = members.iter().filter_map(|d| original.get(d)).sum();
            let date = BucketingCalculator::representative_date(label, granularity)?.to_string();

            let difference = current_total - original_total;
            if difference > Decimal::ZERO {
                series.push(date.clone(), original_total, LOAD_LABEL);
                series.push(date, difference, format!("Extra {granularity}"));
            } else if difference < Decimal::ZERO {
                series.push(date.clone(), current_total, LOAD_LABEL);
                series.push(date, difference, format!("Reduced {granularity}"));
            } else {
                series.push(date, current_total, LOAD_LABEL);
            }
        }

        Ok(series)
    }

    /// 產能圖（僅工時單位，其他單位回傳空圖）
    pub fn capacity_chart(
        capacity: &CapacityInputs,
        lines: &[String],
        buckets: &DateBuckets,
        granularity: Granularity,
        unit: DemandUnit,
    ) -> Result<CapacityChart> {
        let mut chart = CapacityChart::default();
        if unit != DemandUnit::Hours {
            return Ok(chart);
        }

        for (label, members) in buckets.iter() {
            let mut productive = Decimal::ZERO;
            let mut min = Decimal::ZERO;
            let mut max = Decimal::ZERO;

            for date in members {
                for line in lines {
                    if let Some(record) = capacity.record(line, *date) {
                        productive += record.productive_capacity_hours;
                        min += CapacityResolver::theoretical_for(record, ShiftBound::Min);
                        max += CapacityResolver::theoretical_for(record, ShiftBound::Max);
                    }
                }
            }

            chart
                .dates
                .push(BucketingCalculator::representative_date(label, granularity)?.to_string());
            chart.productive_capacity.push(productive);
            chart.min_capacity.push(min);
            chart.max_capacity.push(max);
        }

        Ok(chart)
    }

    /// 最佳產能圖
    ///
    /// 僅在工時單位、模擬狀態為成功且至少一條所選產線有優化輸出時產生
    pub fn optimal_series(
        capacity: &CapacityInputs,
        optimization: &OptimizationInputs,
        lines: &[String],
        buckets: &DateBuckets,
        granularity: Granularity,
        unit: DemandUnit,
        status: SimulationStatus,
    ) -> Result<ChartSeries> {
        let mut series = ChartSeries::new();
        if unit != DemandUnit::Hours || !status.is_success() || !optimization.any_output(lines) {
            return Ok(series);
        }

        for (label, members) in buckets.iter() {
            let total: Decimal = members
                .iter()
                .flat_map(|date| {
                    lines.iter().map(move |line| {
                        CapacityResolver::effective_capacity_hours(
                            capacity.record(line, *date),
                            optimization.line(line),
                            *date,
                        )
                    })
                })
                .sum();
            series.push(
                BucketingCalculator::representative_date(label, granularity)?.to_string(),
                total,
                OPTIMAL_LABEL,
            );
        }

        Ok(series)
    }
}
