//! 比率與投影表建構
//!
//! 比率列在每個彙總層級都由分子列與分母列的合計重新計算，
//! 不對已算好的比率求和或求平均

use capplan_core::numeric::rounded_percent;
use capplan_core::{
    safe_div, CapacityInputs, DateKey, DemandUnit, LabelColumn, OptimizationInputs,
    ProjectionRow, ProjectionTable, ShiftBound,
};
use rust_decimal::Decimal;

use crate::aggregation::DemandAggregator;
use crate::bucketing::DateBuckets;
use crate::capacity::CapacityResolver;
use crate::normalizer::DemandView;

/// 合計列的標籤
pub const TOTAL_LABEL: &str = "TOTAL";

/// 摘要表指標（依輸出順序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SummaryMetric {
    DemandVolumeQty,
    DemandVolumeBatches,
    DemandVolumePallets,
    DemandLoad,
    InitialHours,
    AddedHours,
    RemovedHours,
    MinCapacity,
    MaxCapacity,
    InstalledCapacity,
    SuggestedCapacity,
    InitialRatio,
    InitialAbsorption,
    NewRatio,
    NewAbsorption,
}

impl SummaryMetric {
    pub const ALL: [SummaryMetric; 15] = [
        SummaryMetric::DemandVolumeQty,
        SummaryMetric::DemandVolumeBatches,
        SummaryMetric::DemandVolumePallets,
        SummaryMetric::DemandLoad,
        SummaryMetric::InitialHours,
        SummaryMetric::AddedHours,
        SummaryMetric::RemovedHours,
        SummaryMetric::MinCapacity,
        SummaryMetric::MaxCapacity,
        SummaryMetric::InstalledCapacity,
        SummaryMetric::SuggestedCapacity,
        SummaryMetric::InitialRatio,
        SummaryMetric::InitialAbsorption,
        SummaryMetric::NewRatio,
        SummaryMetric::NewAbsorption,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SummaryMetric::DemandVolumeQty => "Demand Volume (Qty)",
            SummaryMetric::DemandVolumeBatches => "Demand Volume (Batches)",
            SummaryMetric::DemandVolumePallets => "Demand Volume (Pallets)",
            SummaryMetric::DemandLoad => "Demand Load (h)",
            SummaryMetric::InitialHours => "Initial (h)",
            SummaryMetric::AddedHours => "Added (h)",
            SummaryMetric::RemovedHours => "Removed (h)",
            SummaryMetric::MinCapacity => "Min Capacity (h)",
            SummaryMetric::MaxCapacity => "Max Capacity (h)",
            SummaryMetric::InstalledCapacity => "Current Installed Capacity (h)",
            SummaryMetric::SuggestedCapacity => "Suggested Capacity (h)",
            SummaryMetric::InitialRatio => "Initial D/C Ratio",
            SummaryMetric::InitialAbsorption => "Initial Absorption (€)",
            SummaryMetric::NewRatio => "New D/C Ratio",
            SummaryMetric::NewAbsorption => "New Absorption (€)",
        }
    }

    pub fn is_ratio(&self) -> bool {
        matches!(self, SummaryMetric::InitialRatio | SummaryMetric::NewRatio)
    }
}

/// 比率的表示方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioScale {
    /// 分數（0.3 表示 30%），分母為 0 時為 0
    Fraction,
    /// 四捨五入的百分比，任一側為 0 時為 0
    RoundedPercent,
}

impl RatioScale {
    pub fn apply(self, numerator: Decimal, denominator: Decimal) -> Decimal {
        match self {
            RatioScale::Fraction => safe_div(numerator, denominator),
            RatioScale::RoundedPercent => rounded_percent(numerator, denominator),
        }
    }
}

/// 比率列的計算規則：以同標籤的分子列、分母列重新計算
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatioRule {
    pub ratio: String,
    pub numerator: String,
    pub denominator: String,
    pub scale: RatioScale,
}

impl RatioRule {
    pub fn new(
        ratio: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
        scale: RatioScale,
    ) -> Self {
        Self {
            ratio: ratio.into(),
            numerator: numerator.into(),
            denominator: denominator.into(),
            scale,
        }
    }

    /// 重新計算表中所有此比率的列
    ///
    /// `with_totals` 為 false 時保留合計欄原值
    pub fn recompute(&self, table: &mut ProjectionTable, with_totals: bool) {
        let targets: Vec<usize> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.projection == self.ratio)
            .map(|(i, _)| i)
            .collect();

        for index in targets {
            let label = table.rows[index].label.clone();
            let numerator = table.find(&self.numerator, &label).cloned();
            let denominator = table.find(&self.denominator, &label).cloned();

            let column_count = table.columns.len();
            let at = |row: &Option<ProjectionRow>, i: usize| {
                row.as_ref()
                    .and_then(|r| r.values.get(i).copied())
                    .unwrap_or_default()
            };
            let total_of =
                |row: &Option<ProjectionRow>| row.as_ref().map(|r| r.total).unwrap_or_default();

            let values: Vec<Decimal> = (0..column_count)
                .map(|i| self.scale.apply(at(&numerator, i), at(&denominator, i)))
                .collect();

            let row = &mut table.rows[index];
            row.values = values;
            if with_totals {
                row.total = self.scale.apply(total_of(&numerator), total_of(&denominator));
            }
        }
    }
}

/// 摘要表的輸入
#[derive(Debug, Clone, Copy)]
pub struct SummaryContext<'a> {
    pub view: DemandView<'a>,

    /// 已套用編輯覆蓋層的產能
    pub capacity: &'a CapacityInputs,

    pub optimization: &'a OptimizationInputs,

    /// 輸出的產線（依序）
    pub lines: &'a [String],

    /// 區間內的月份
    pub dates: &'a [DateKey],
}

fn per_date(dates: &[DateKey], value: impl Fn(DateKey) -> Decimal) -> Vec<Decimal> {
    dates.iter().map(|date| value(*date)).collect()
}

/// 投影表建構器
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    /// 摘要表的比率規則
    pub fn summary_ratio_rules() -> Vec<RatioRule> {
        vec![
            RatioRule::new(
                SummaryMetric::InitialRatio.label(),
                SummaryMetric::InitialHours.label(),
                SummaryMetric::InstalledCapacity.label(),
                RatioScale::Fraction,
            ),
            RatioRule::new(
                SummaryMetric::NewRatio.label(),
                SummaryMetric::DemandLoad.label(),
                SummaryMetric::SuggestedCapacity.label(),
                RatioScale::Fraction,
            ),
        ]
    }

    /// 建立逐月摘要表：每個指標依序為各產線列，接著一列 `TOTAL`
    pub fn build_summary(ctx: &SummaryContext<'_>) -> ProjectionTable {
        let columns: Vec<String> = ctx.dates.iter().map(ToString::to_string).collect();
        let mut table = ProjectionTable::new(LabelColumn::Line, columns);

        for metric in SummaryMetric::ALL {
            let mut line_rows = Vec::with_capacity(ctx.lines.len());
            for line in ctx.lines {
                let values = if metric.is_ratio() {
                    vec![Decimal::ZERO; ctx.dates.len()]
                } else {
                    Self::metric_values(ctx, metric, line)
                };
                line_rows.push(ProjectionRow::summed(metric.label(), line.as_str(), values));
            }
            Self::push_with_total(&mut table, metric.label(), line_rows);
        }

        for rule in Self::summary_ratio_rules() {
            rule.recompute(&mut table, true);
        }

        tracing::debug!("摘要表: {} 列 × {} 個月份", table.len(), table.columns.len());
        table
    }

    /// 單一產線某指標的逐月值
    fn metric_values(ctx: &SummaryContext<'_>, metric: SummaryMetric, line: &str) -> Vec<Decimal> {
        let demand_series = |unit: DemandUnit, baseline: bool| {
            let series = if baseline {
                DemandAggregator::aggregate_line_baseline(&ctx.view, line, unit)
            } else {
                DemandAggregator::aggregate_line(&ctx.view, line, unit)
            };
            ctx.dates
                .iter()
                .map(|date| series.get(date).copied().unwrap_or_default())
                .collect::<Vec<_>>()
        };

        match metric {
            SummaryMetric::DemandVolumeQty => demand_series(DemandUnit::Qty, false),
            SummaryMetric::DemandVolumeBatches => demand_series(DemandUnit::Batches, false),
            SummaryMetric::DemandVolumePallets => demand_series(DemandUnit::Pallets, false),
            SummaryMetric::DemandLoad => demand_series(DemandUnit::Hours, false),
            SummaryMetric::InitialHours => demand_series(DemandUnit::Hours, true),
            SummaryMetric::InitialAbsorption => demand_series(DemandUnit::Absorption, true),
            SummaryMetric::NewAbsorption => demand_series(DemandUnit::Absorption, false),
            SummaryMetric::AddedHours | SummaryMetric::RemovedHours => {
                let deltas = DemandAggregator::delta_by_cell(&ctx.view, line, DemandUnit::Hours);
                ctx.dates
                    .iter()
                    .map(|date| {
                        let delta = deltas.get(date).copied().unwrap_or_default();
                        if metric == SummaryMetric::AddedHours {
                            delta.added
                        } else {
                            delta.reduced
                        }
                    })
                    .collect()
            }
            SummaryMetric::MinCapacity | SummaryMetric::MaxCapacity => {
                let bound = if metric == SummaryMetric::MinCapacity {
                    ShiftBound::Min
                } else {
                    ShiftBound::Max
                };
                per_date(ctx.dates, |date| {
                    ctx.capacity
                        .record(line, date)
                        .map(|record| CapacityResolver::theoretical_for(record, bound))
                        .unwrap_or_default()
                })
            }
            SummaryMetric::InstalledCapacity => per_date(ctx.dates, |date| {
                ctx.capacity
                    .record(line, date)
                    .map(|record| record.productive_capacity_hours)
                    .unwrap_or_default()
            }),
            SummaryMetric::SuggestedCapacity => per_date(ctx.dates, |date| {
                CapacityResolver::effective_capacity_hours(
                    ctx.capacity.record(line, date),
                    ctx.optimization.line(line),
                    date,
                )
            }),
            SummaryMetric::InitialRatio | SummaryMetric::NewRatio => {
                vec![Decimal::ZERO; ctx.dates.len()]
            }
        }
    }

    /// 推入各產線列與其合計列
    pub fn push_with_total(
        table: &mut ProjectionTable,
        projection: &str,
        line_rows: Vec<ProjectionRow>,
    ) {
        let column_count = table.columns.len();
        let mut totals = vec![Decimal::ZERO; column_count];
        for row in &line_rows {
            for (i, value) in row.values.iter().enumerate().take(column_count) {
                totals[i] += *value;
            }
        }
        for row in line_rows {
            table.push(row);
        }
        table.push(ProjectionRow::summed(projection, TOTAL_LABEL, totals));
    }

    /// 將逐月表重新分桶
    ///
    /// 絕對值列按組成月份加總；比率列由分桶後的分子、分母重新計算；
    /// 合計欄沿用分桶前（整個區間）的值
    pub fn regroup_table(
        table: &ProjectionTable,
        buckets: &DateBuckets,
        rules: &[RatioRule],
    ) -> ProjectionTable {
        let mut regrouped = ProjectionTable::new(table.label_column, buckets.labels());

        let member_indexes: Vec<Vec<usize>> = buckets
            .iter()
            .map(|(_, members)| {
                members
                    .iter()
                    .filter_map(|date| {
                        let key = date.to_string();
                        table.columns.iter().position(|c| *c == key)
                    })
                    .collect()
            })
            .collect();

        for row in &table.rows {
            let values: Vec<Decimal> = member_indexes
                .iter()
                .map(|indexes| {
                    indexes
                        .iter()
                        .map(|i| row.values.get(*i).copied().unwrap_or_default())
                        .sum::<Decimal>()
                })
                .collect();
            regrouped.push(ProjectionRow::new(
                row.projection.clone(),
                row.label.clone(),
                values,
                row.total,
            ));
        }

        for rule in rules {
            rule.recompute(&mut regrouped, false);
        }

        regrouped
    }

    /// 非工時單位時移除僅適用於工時的列
    pub fn apply_unit_filter(
        table: &mut ProjectionTable,
        unit: DemandUnit,
        hours_only_projection: &str,
    ) -> usize {
        if unit == DemandUnit::Hours {
            return 0;
        }
        table.remove_projection(hours_only_projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucketing::BucketingCalculator;
    use capplan_core::{
        CapacityRecord, DemandInputs, DemandOverlay, Granularity, LineCapacity, LineDemand,
        LineOptimization,
    };
    use proptest::prelude::*;

    fn month(m: u32) -> DateKey {
        DateKey::new(2024, m).unwrap()
    }

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    /// 兩條產線：產能 (100, 300)，工時 (90, 30)
    fn fixture() -> (DemandInputs, CapacityInputs, OptimizationInputs) {
        let demand = DemandInputs::new()
            .with_line(
                "L1",
                LineDemand::new(vec!["A".into()])
                    .with_value(month(1), DemandUnit::Hours, 0, dec(90))
                    .with_original(month(1), DemandUnit::Hours, 0, dec(90))
                    .with_value(month(2), DemandUnit::Hours, 0, dec(50))
                    .with_original(month(2), DemandUnit::Hours, 0, dec(50)),
            )
            .with_line(
                "L2",
                LineDemand::new(vec!["B".into()])
                    .with_value(month(1), DemandUnit::Hours, 0, dec(30))
                    .with_original(month(1), DemandUnit::Hours, 0, dec(30))
                    .with_value(month(2), DemandUnit::Hours, 0, dec(10))
                    .with_original(month(2), DemandUnit::Hours, 0, dec(10)),
            );
        let capacity = CapacityInputs::new()
            .with_line(
                "L1",
                LineCapacity::new()
                    .with_record(month(1), CapacityRecord::new(dec(100), Decimal::ONE))
                    .with_record(month(2), CapacityRecord::new(dec(100), Decimal::ONE)),
            )
            .with_line(
                "L2",
                LineCapacity::new()
                    .with_record(month(1), CapacityRecord::new(dec(300), Decimal::ONE))
                    .with_record(month(2), CapacityRecord::new(dec(0), Decimal::ONE)),
            );
        (demand, capacity, OptimizationInputs::new())
    }

    fn build(
        demand: &DemandInputs,
        capacity: &CapacityInputs,
        optimization: &OptimizationInputs,
    ) -> ProjectionTable {
        let overlay = DemandOverlay::new();
        let lines = vec!["L1".to_string(), "L2".to_string()];
        let dates = vec![month(1), month(2)];
        let ctx = SummaryContext {
            view: DemandView::new(demand, &overlay),
            capacity,
            optimization,
            lines: &lines,
            dates: &dates,
        };
        ProjectionBuilder::build_summary(&ctx)
    }

    #[test]
    fn test_row_layout() {
        let (demand, capacity, optimization) = fixture();
        let table = build(&demand, &capacity, &optimization);

        assert_eq!(table.len(), 15 * 3);
        assert_eq!(table.rows[0].projection, "Demand Volume (Qty)");
        assert_eq!(table.labels_of("Demand Load (h)"), vec!["L1", "L2", "TOTAL"]);
        assert_eq!(table.projections().last(), Some(&"New Absorption (€)"));
    }

    #[test]
    fn test_ratio_recomputed_from_sums() {
        let (demand, capacity, optimization) = fixture();
        let table = build(&demand, &capacity, &optimization);

        let total = table.find("Initial D/C Ratio", "TOTAL").unwrap();
        // (90 + 30) / (100 + 300) = 0.3，不是 (0.9 + 0.1) / 2 = 0.5
        assert_eq!(total.values[0], Decimal::new(3, 1));

        let l1 = table.find("Initial D/C Ratio", "L1").unwrap();
        assert_eq!(l1.values[0], Decimal::new(9, 1));
        // L1 整段：(90 + 50) / 200
        assert_eq!(l1.total, Decimal::new(7, 1));
    }

    #[test]
    fn test_zero_capacity_ratio_is_zero() {
        let (demand, capacity, optimization) = fixture();
        let table = build(&demand, &capacity, &optimization);

        let l2 = table.find("New D/C Ratio", "L2").unwrap();
        assert_eq!(l2.values[1], Decimal::ZERO);
    }

    #[test]
    fn test_suggested_capacity_prefers_optimizer() {
        let (demand, capacity, _) = fixture();
        let optimization = OptimizationInputs::new()
            .with_line("L1", LineOptimization::new().with_entry(month(1), dec(30), dec(120)))
            .with_line("L2", LineOptimization::new());
        let table = build(&demand, &capacity, &optimization);

        let l1 = table.find("Suggested Capacity (h)", "L1").unwrap();
        assert_eq!(l1.values, vec![dec(120), dec(100)]);
        let l2 = table.find("Suggested Capacity (h)", "L2").unwrap();
        assert_eq!(l2.values, vec![dec(300), dec(0)]);

        let ratio = table.find("New D/C Ratio", "L1").unwrap();
        assert_eq!(ratio.values[0], Decimal::new(75, 2));
    }

    #[test]
    fn test_regroup_recomputes_ratios() {
        let (demand, capacity, optimization) = fixture();
        let table = build(&demand, &capacity, &optimization);
        let dates = vec![month(1), month(2)];
        let buckets = BucketingCalculator::group_by_bucket(&dates, Granularity::Quarters);

        let regrouped = ProjectionBuilder::regroup_table(
            &table,
            &buckets,
            &ProjectionBuilder::summary_ratio_rules(),
        );
        assert_eq!(regrouped.columns, vec!["2024-Q1"]);
        assert_eq!(regrouped.len(), table.len());

        let load = regrouped.find("Demand Load (h)", "TOTAL").unwrap();
        assert_eq!(load.values, vec![dec(180)]);

        // Q1：(90 + 50 + 30 + 10) / (100 + 100 + 300 + 0) = 0.36
        let ratio = regrouped.find("Initial D/C Ratio", "TOTAL").unwrap();
        assert_eq!(ratio.values, vec![Decimal::new(36, 2)]);
        assert_eq!(ratio.total, table.find("Initial D/C Ratio", "TOTAL").unwrap().total);
    }

    #[test]
    fn test_unit_filter_shrinks_all_columns() {
        let (demand, capacity, optimization) = fixture();
        let mut table = build(&demand, &capacity, &optimization);
        let before = table.len();

        let removed = ProjectionBuilder::apply_unit_filter(
            &mut table,
            DemandUnit::Qty,
            SummaryMetric::DemandLoad.label(),
        );
        assert_eq!(removed, 3);
        assert!(table.labels_of("Demand Load (h)").is_empty());
        for column in &table.columns {
            assert_eq!(table.column(column).unwrap().len(), before - 3);
        }

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["PROJECTION"].as_array().unwrap().len(), before - 3);
        assert_eq!(json["2024-02-01"].as_array().unwrap().len(), before - 3);

        assert_eq!(
            ProjectionBuilder::apply_unit_filter(
                &mut table,
                DemandUnit::Hours,
                SummaryMetric::DemandLoad.label()
            ),
            0
        );
    }

    fn ratio_table(cells: &[(u32, u32)]) -> ProjectionTable {
        let mut table = ProjectionTable::new(LabelColumn::Line, vec!["2024-01-01".into()]);
        let hours: Vec<ProjectionRow> = cells
            .iter()
            .enumerate()
            .map(|(i, (h, _))| {
                ProjectionRow::summed("num", format!("L{i}"), vec![Decimal::from(*h)])
            })
            .collect();
        let capacity: Vec<ProjectionRow> = cells
            .iter()
            .enumerate()
            .map(|(i, (_, c))| {
                ProjectionRow::summed("den", format!("L{i}"), vec![Decimal::from(*c)])
            })
            .collect();
        let ratios: Vec<ProjectionRow> = (0..cells.len())
            .map(|i| ProjectionRow::summed("ratio", format!("L{i}"), vec![Decimal::ZERO]))
            .collect();
        ProjectionBuilder::push_with_total(&mut table, "num", hours);
        ProjectionBuilder::push_with_total(&mut table, "den", capacity);
        ProjectionBuilder::push_with_total(&mut table, "ratio", ratios);
        table
    }

    proptest! {
        #[test]
        fn prop_total_ratio_is_ratio_of_sums(
            cells in prop::collection::vec((0u32..10_000, 0u32..10_000), 1..8)
        ) {
            let mut table = ratio_table(&cells);
            RatioRule::new("ratio", "num", "den", RatioScale::Fraction).recompute(&mut table, true);

            let hours: u64 = cells.iter().map(|(h, _)| u64::from(*h)).sum();
            let capacity: u64 = cells.iter().map(|(_, c)| u64::from(*c)).sum();
            let expected = safe_div(Decimal::from(hours), Decimal::from(capacity));

            let total = table.find("ratio", TOTAL_LABEL).unwrap();
            prop_assert_eq!(total.values[0], expected);
            prop_assert_eq!(total.total, expected);
        }
    }
}
