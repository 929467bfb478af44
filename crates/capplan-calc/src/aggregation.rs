//! 需求彙總

use capplan_core::{DateKey, DemandUnit, Granularity};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::bucketing::BucketingCalculator;
use crate::normalizer::DemandView;

/// 相對基準的增減量（皆為非負值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Decimal,
    pub reduced: Decimal,
}

impl Delta {
    /// 累加一筆差值
    pub fn accumulate(&mut self, original: Decimal, current: Decimal) {
        let diff = current - original;
        if diff > Decimal::ZERO {
            self.added += diff;
        } else if diff < Decimal::ZERO {
            self.reduced += -diff;
        }
    }
}

/// 需求彙總器
pub struct DemandAggregator;

impl DemandAggregator {
    /// 所選產線在每個月份的目前值合計
    pub fn aggregate(
        view: &DemandView<'_>,
        lines: &[String],
        unit: DemandUnit,
    ) -> BTreeMap<DateKey, Decimal> {
        Self::fold(view, lines, |line, index, date| view.current(line, index, date, unit))
    }

    /// 所選產線在每個月份的基準值合計
    pub fn aggregate_baseline(
        view: &DemandView<'_>,
        lines: &[String],
        unit: DemandUnit,
    ) -> BTreeMap<DateKey, Decimal> {
        Self::fold(view, lines, |line, index, date| view.baseline(line, index, date, unit))
    }

    /// 單一產線的目前值
    pub fn aggregate_line(
        view: &DemandView<'_>,
        line: &str,
        unit: DemandUnit,
    ) -> BTreeMap<DateKey, Decimal> {
        Self::aggregate(view, &[line.to_string()], unit)
    }

    /// 單一產線的基準值
    pub fn aggregate_line_baseline(
        view: &DemandView<'_>,
        line: &str,
        unit: DemandUnit,
    ) -> BTreeMap<DateKey, Decimal> {
        Self::aggregate_baseline(view, &[line.to_string()], unit)
    }

    fn fold<F>(view: &DemandView<'_>, lines: &[String], value: F) -> BTreeMap<DateKey, Decimal>
    where
        F: Fn(&str, usize, DateKey) -> Decimal,
    {
        let mut totals: BTreeMap<DateKey, Decimal> = BTreeMap::new();

        for line in lines {
            let Some(demand) = view.line(line) else {
                continue;
            };
            for date in &demand.dates {
                let sum: Decimal = (0..demand.product_count())
                    .map(|index| value(line, index, *date))
                    .sum();
                *totals.entry(*date).or_default() += sum;
            }
        }

        totals
    }

    /// 將月份合計加總到時間桶（依月份順序排列的桶）
    pub fn aggregate_by_bucket(
        daily: &BTreeMap<DateKey, Decimal>,
        granularity: Granularity,
    ) -> Vec<(String, Decimal)> {
        let dates: Vec<DateKey> = daily.keys().copied().collect();
        BucketingCalculator::group_by_bucket(&dates, granularity)
            .iter()
            .map(|(label, members)| {
                let total: Decimal = members
                    .iter()
                    .map(|date| daily.get(date).copied().unwrap_or_default())
                    .sum();
                (label.to_string(), total)
            })
            .collect()
    }

    /// 逐月比較兩組合計
    pub fn delta(
        original: &BTreeMap<DateKey, Decimal>,
        current: &BTreeMap<DateKey, Decimal>,
    ) -> BTreeMap<DateKey, Delta> {
        let mut deltas: BTreeMap<DateKey, Delta> = BTreeMap::new();
        for date in original.keys().chain(current.keys()) {
            deltas.entry(*date).or_insert_with(|| {
                let mut delta = Delta::default();
                delta.accumulate(
                    original.get(date).copied().unwrap_or_default(),
                    current.get(date).copied().unwrap_or_default(),
                );
                delta
            });
        }
        deltas
    }

    /// 單一產線逐月的增減量，在產品儲存格層級比較後再加總
    ///
    /// 同一月份內一個產品增加、另一個產品減少時，兩者分別計入
    pub fn delta_by_cell(
        view: &DemandView<'_>,
        line: &str,
        unit: DemandUnit,
    ) -> BTreeMap<DateKey, Delta> {
        let mut deltas: BTreeMap<DateKey, Delta> = BTreeMap::new();
        let Some(demand) = view.line(line) else {
            return deltas;
        };

        for date in &demand.dates {
            let delta = deltas.entry(*date).or_default();
            for index in 0..demand.product_count() {
                delta.accumulate(
                    view.baseline(line, index, *date, unit),
                    view.current(line, index, *date, unit),
                );
            }
        }

        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::ChangeKind;
    use capplan_core::{DemandInputs, DemandOverlay, LineDemand};

    fn month(m: u32) -> DateKey {
        DateKey::new(2024, m).unwrap()
    }

    fn inputs() -> DemandInputs {
        let l1 = LineDemand::new(vec!["A".into(), "B".into()])
            .with_value(month(1), DemandUnit::Hours, 0, Decimal::from(10))
            .with_original(month(1), DemandUnit::Hours, 0, Decimal::from(10))
            .with_value(month(1), DemandUnit::Hours, 1, Decimal::from(20))
            .with_original(month(1), DemandUnit::Hours, 1, Decimal::from(20))
            .with_value(month(4), DemandUnit::Hours, 0, Decimal::from(5))
            .with_original(month(4), DemandUnit::Hours, 0, Decimal::from(5));
        let l2 = LineDemand::new(vec!["C".into()])
            .with_value(month(1), DemandUnit::Hours, 0, Decimal::from(7))
            .with_value(month(2), DemandUnit::Hours, 0, Decimal::from(3));
        DemandInputs::new().with_line("L1", l1).with_line("L2", l2)
    }

    #[test]
    fn test_aggregate_sums_lines_and_products() {
        let inputs = inputs();
        let overlay = DemandOverlay::new();
        let view = DemandView::new(&inputs, &overlay);
        let lines = vec!["L1".to_string(), "L2".to_string()];

        let daily = DemandAggregator::aggregate(&view, &lines, DemandUnit::Hours);
        assert_eq!(daily[&month(1)], Decimal::from(37));
        assert_eq!(daily[&month(2)], Decimal::from(3));
        assert_eq!(daily[&month(4)], Decimal::from(5));

        let only_l2 = DemandAggregator::aggregate(&view, &lines[1..], DemandUnit::Hours);
        assert_eq!(only_l2.get(&month(4)), None);

        // 缺值以 0 計
        let qty = DemandAggregator::aggregate(&view, &lines, DemandUnit::Qty);
        assert_eq!(qty[&month(1)], Decimal::ZERO);
    }

    #[test]
    fn test_aggregate_by_quarter() {
        let inputs = inputs();
        let overlay = DemandOverlay::new();
        let view = DemandView::new(&inputs, &overlay);
        let lines = vec!["L1".to_string(), "L2".to_string()];
        let daily = DemandAggregator::aggregate(&view, &lines, DemandUnit::Hours);

        let buckets = DemandAggregator::aggregate_by_bucket(&daily, Granularity::Quarters);
        assert_eq!(
            buckets,
            vec![
                ("2024-Q1".to_string(), Decimal::from(40)),
                ("2024-Q2".to_string(), Decimal::from(5)),
            ]
        );
    }

    #[test]
    fn test_delta_reports_magnitudes() {
        let mut original = BTreeMap::new();
        original.insert(month(1), Decimal::from(100));
        original.insert(month(2), Decimal::from(100));
        let mut current = BTreeMap::new();
        current.insert(month(1), Decimal::from(130));
        current.insert(month(2), Decimal::from(60));
        current.insert(month(3), Decimal::from(5));

        let deltas = DemandAggregator::delta(&original, &current);
        assert_eq!(deltas[&month(1)], Delta { added: Decimal::from(30), reduced: Decimal::ZERO });
        assert_eq!(deltas[&month(2)], Delta { added: Decimal::ZERO, reduced: Decimal::from(40) });
        assert_eq!(deltas[&month(3)].added, Decimal::from(5));
    }

    #[test]
    fn test_delta_by_cell_keeps_offsetting_changes() {
        let inputs = inputs();
        let mut overlay = DemandOverlay::new();
        overlay.set_value("L1", "A", month(1), DemandUnit::Hours, Decimal::from(15));
        overlay.set_value("L1", "B", month(1), DemandUnit::Hours, Decimal::from(15));
        let view = DemandView::new(&inputs, &overlay);

        let deltas = DemandAggregator::delta_by_cell(&view, "L1", DemandUnit::Hours);
        assert_eq!(deltas[&month(1)], Delta { added: Decimal::from(5), reduced: Decimal::from(5) });
        assert_eq!(deltas[&month(4)], Delta::default());
    }

    #[test]
    fn test_missing_original_counts_as_added() {
        let inputs = DemandInputs::new().with_line(
            "L3",
            LineDemand::new(vec!["N".into()]).with_value(
                month(1),
                DemandUnit::Hours,
                0,
                Decimal::from(50),
            ),
        );
        let overlay = DemandOverlay::new();
        let view = DemandView::new(&inputs, &overlay);

        assert_eq!(view.change("L3", 0, month(1), DemandUnit::Hours), ChangeKind::Above);
        assert_eq!(view.baseline("L3", 0, month(1), DemandUnit::Hours), Decimal::ZERO);

        let deltas = DemandAggregator::delta_by_cell(&view, "L3", DemandUnit::Hours);
        assert_eq!(deltas[&month(1)], Delta { added: Decimal::from(50), reduced: Decimal::ZERO });
    }
}
