//! 比較表（按情境排列的投影表）

use capplan_calc::{BucketingCalculator, ProjectionBuilder, RatioRule, RatioScale};
use capplan_core::numeric::round_half_up;
use capplan_core::{
    DateKey, DemandUnit, Granularity, LabelColumn, ProjectionRow, ProjectionTable, SimulationId,
};
use rust_decimal::Decimal;

use crate::merge::MergedDataset;

pub const DEMAND_HOURS: &str = "DEMAND (HOURS)";
pub const ABSORPTION: &str = "ABSORPTION";
pub const CAPACITY_SHIFTS: &str = "CAPACITY (SHIFTS)";
pub const CAPACITY_HOURS: &str = "CAPACITY (HOURS)";
pub const DC_RATIO: &str = "D/C RATIO";

/// 比較表中的一個情境（模擬或情境基準）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: SimulationId,

    /// 顯示名稱，同時是表中的 EXERCISE 欄
    pub name: String,

    pub by_scenario: bool,
}

impl Exercise {
    pub fn simulation(id: SimulationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            by_scenario: false,
        }
    }

    /// 情境基準：id 與名稱皆為空白換成底線後的名稱
    pub fn by_scenario(name: &str) -> Self {
        let id = SimulationId::by_scenario(name);
        Self {
            name: id.to_string(),
            id,
            by_scenario: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Load(DemandUnit),
    CapacityShifts,
    CapacityHours,
}

/// 比較表建構器
pub struct ComparisonTableBuilder;

impl ComparisonTableBuilder {
    pub fn demand_projection(unit: DemandUnit) -> String {
        format!("DEMAND ({})", unit.key())
    }

    pub fn ratio_rule() -> RatioRule {
        RatioRule::new(DC_RATIO, DEMAND_HOURS, CAPACITY_HOURS, RatioScale::RoundedPercent)
    }

    fn projections(unit: DemandUnit) -> Vec<(String, Source)> {
        let mut projections = vec![(Self::demand_projection(unit), Source::Load(unit))];
        if unit != DemandUnit::Hours {
            projections.push((DEMAND_HOURS.to_string(), Source::Load(DemandUnit::Hours)));
        }
        projections.push((ABSORPTION.to_string(), Source::Load(DemandUnit::Absorption)));
        projections.push((CAPACITY_SHIFTS.to_string(), Source::CapacityShifts));
        projections.push((CAPACITY_HOURS.to_string(), Source::CapacityHours));
        projections
    }

    /// 逐月比較表
    ///
    /// 每個指標依情境順序各一列，`D/C RATIO` 列放在最後；
    /// 儲存格為所選產線的紀錄值（各自四捨五入）之和
    pub fn build_monthly(
        merged: &MergedDataset,
        exercises: &[Exercise],
        lines: &[String],
        dates: &[DateKey],
        unit: DemandUnit,
    ) -> ProjectionTable {
        let columns: Vec<String> = dates.iter().map(ToString::to_string).collect();
        let mut table = ProjectionTable::new(LabelColumn::Exercise, columns);

        for (projection, source) in Self::projections(unit) {
            for exercise in exercises {
                let values: Vec<Decimal> = dates
                    .iter()
                    .map(|date| Self::cell(merged, exercise.id.as_str(), lines, *date, source))
                    .collect();
                table.push(ProjectionRow::summed(
                    projection.as_str(),
                    exercise.name.as_str(),
                    values,
                ));
            }
        }

        for exercise in exercises {
            table.push(ProjectionRow::new(
                DC_RATIO,
                exercise.name.as_str(),
                vec![Decimal::ZERO; dates.len()],
                Decimal::ZERO,
            ));
        }
        Self::ratio_rule().recompute(&mut table, true);

        table
    }

    fn cell(
        merged: &MergedDataset,
        simulation_id: &str,
        lines: &[String],
        date: DateKey,
        source: Source,
    ) -> Decimal {
        let selected = |line: &str| lines.iter().any(|l| l == line);

        match source {
            Source::Load(unit) => merged
                .load
                .iter()
                .filter(|row| {
                    row.simulation_id == simulation_id && row.date == date && selected(&row.line)
                })
                .map(|row| round_half_up(row.value(unit)))
                .sum(),
            Source::CapacityShifts | Source::CapacityHours => merged
                .capacity
                .iter()
                .filter(|cell| {
                    cell.simulation_id == simulation_id
                        && cell.date == date
                        && selected(&cell.line)
                })
                .map(|cell| {
                    let value = if source == Source::CapacityHours {
                        cell.capacity_hours
                    } else {
                        cell.capacity_shifts.unwrap_or_default()
                    };
                    round_half_up(value)
                })
                .sum(),
        }
    }

    /// 建立比較表：逐月計算，按粒度重新分桶，最後在非工時單位時移除 `DEMAND (HOURS)`
    pub fn build(
        merged: &MergedDataset,
        exercises: &[Exercise],
        lines: &[String],
        dates: &[DateKey],
        unit: DemandUnit,
        granularity: Granularity,
    ) -> ProjectionTable {
        let monthly = Self::build_monthly(merged, exercises, lines, dates, unit);

        let mut table = if granularity == Granularity::Months {
            monthly
        } else {
            let buckets = BucketingCalculator::group_by_bucket(dates, granularity);
            ProjectionBuilder::regroup_table(&monthly, &buckets, &[Self::ratio_rule()])
        };

        ProjectionBuilder::apply_unit_filter(&mut table, unit, DEMAND_HOURS);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::LoadRow;
    use capplan_core::CapacityCell;
    use rstest::rstest;

    fn month(m: u32) -> DateKey {
        DateKey::new(2024, m).unwrap()
    }

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn load(sim: &str, line: &str, m: u32, hours: Decimal, qty: i64) -> LoadRow {
        LoadRow {
            simulation_id: sim.to_string(),
            line: line.to_string(),
            date: month(m),
            hours,
            qty: dec(qty),
            batches: Decimal::ZERO,
            pallets: Decimal::ZERO,
            absorption: dec(10),
        }
    }

    fn capacity(sim: &str, line: &str, m: u32, hours: i64) -> CapacityCell {
        CapacityCell {
            simulation_id: sim.to_string(),
            line: line.to_string(),
            date: month(m),
            capacity_hours: dec(hours),
            capacity_shifts: Some(dec(hours / 8)),
        }
    }

    fn merged() -> MergedDataset {
        MergedDataset {
            load: vec![
                // 各自四捨五入後相加：40 + 41 = 81
                load("Base_Case", "L1", 1, Decimal::new(395, 1), 100),
                load("Base_Case", "L1", 1, Decimal::new(405, 1), 100),
                load("Base_Case", "L1", 2, dec(60), 100),
                load("S2", "L1", 1, dec(90), 200),
                load("S2", "L2", 1, dec(30), 200),
                load("S2", "L3", 1, dec(999), 200),
            ],
            capacity: vec![
                capacity("Base_Case", "L1", 1, 100),
                capacity("Base_Case", "L1", 2, 0),
                capacity("S2", "L1", 1, 100),
                capacity("S2", "L2", 1, 300),
            ],
        }
    }

    fn exercises() -> Vec<Exercise> {
        vec![
            Exercise::by_scenario("Base Case"),
            Exercise::simulation(SimulationId::new("S2"), "Plan B"),
        ]
    }

    fn lines() -> Vec<String> {
        vec!["L1".to_string(), "L2".to_string()]
    }

    #[test]
    fn test_hours_layout() {
        let table = ComparisonTableBuilder::build(
            &merged(),
            &exercises(),
            &lines(),
            &[month(1), month(2)],
            DemandUnit::Hours,
            Granularity::Months,
        );

        assert_eq!(
            table.projections(),
            vec![
                "DEMAND (HOURS)",
                "ABSORPTION",
                "CAPACITY (SHIFTS)",
                "CAPACITY (HOURS)",
                "D/C RATIO"
            ]
        );
        assert_eq!(table.labels_of("D/C RATIO"), vec!["Base_Case", "Plan B"]);

        let demand = table.find("DEMAND (HOURS)", "Base_Case").unwrap();
        assert_eq!(demand.values, vec![dec(81), dec(60)]);
        assert_eq!(demand.total, dec(141));

        // (90 + 30) / (100 + 300) = 30%
        let ratio = table.find("D/C RATIO", "Plan B").unwrap();
        assert_eq!(ratio.values, vec![dec(30), dec(0)]);

        // 2 月產能為 0 -> 0；TOTALS：141 / 100
        let base = table.find("D/C RATIO", "Base_Case").unwrap();
        assert_eq!(base.values, vec![dec(81), dec(0)]);
        assert_eq!(base.total, dec(141));
    }

    #[rstest]
    #[case(DemandUnit::Qty, "DEMAND (QTY)")]
    #[case(DemandUnit::Batches, "DEMAND (BATCHES)")]
    #[case(DemandUnit::Pallets, "DEMAND (PALLETS)")]
    fn test_non_hours_drops_demand_hours(#[case] unit: DemandUnit, #[case] projection: &str) {
        let table = ComparisonTableBuilder::build(
            &merged(),
            &exercises(),
            &lines(),
            &[month(1), month(2)],
            unit,
            Granularity::Months,
        );

        assert_eq!(table.projections()[0], projection);
        assert!(table.labels_of(DEMAND_HOURS).is_empty());
        assert_eq!(table.len(), 5 * 2);
        // 比率仍以工時計算
        assert_eq!(table.find(DC_RATIO, "Plan B").unwrap().values[0], dec(30));
    }

    #[test]
    fn test_yearly_regroup_recomputes_ratio() {
        let table = ComparisonTableBuilder::build(
            &merged(),
            &exercises(),
            &lines(),
            &[month(1), month(2)],
            DemandUnit::Hours,
            Granularity::Years,
        );

        assert_eq!(table.columns, vec!["Year 2024"]);
        assert_eq!(table.find(DEMAND_HOURS, "Base_Case").unwrap().values, vec![dec(141)]);
        // 141 / 100 = 141%，不是 (81% + 0%) 的和
        assert_eq!(table.find(DC_RATIO, "Base_Case").unwrap().values, vec![dec(141)]);
    }
}
