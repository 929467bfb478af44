//! 優化班次的逐日分配
//!
//! 先平均分配到平日（每日最多 3 班），平日排滿後才依序分配到週六、週日，
//! 無法整除的部分列為臨時班次

use capplan_core::{safe_div, DateKey, LineOptimization};
use chrono::{Datelike, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;

/// 每日班次上限
pub const MAX_SHIFTS_PER_DAY: u32 = 3;

/// 一個月中的日別天數
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DayCounts {
    pub weekdays: u32,
    pub saturdays: u32,
    pub sundays: u32,
}

impl DayCounts {
    pub fn for_month(month: DateKey) -> Self {
        let mut counts = Self::default();
        let mut day = Some(month.date());

        while let Some(date) = day {
            if date.month() != month.month() {
                break;
            }
            match date.weekday() {
                Weekday::Sat => counts.saturdays += 1,
                Weekday::Sun => counts.sundays += 1,
                _ => counts.weekdays += 1,
            }
            day = date.succ_opt();
        }

        counts
    }
}

/// 單一月份的班次分配
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftDistribution {
    pub date: DateKey,
    pub total_shifts: Decimal,
    pub days: DayCounts,
    pub shifts_per_weekday: Decimal,
    pub total_weekday_shifts: Decimal,
    pub shifts_per_saturday: Decimal,
    pub total_saturday_shifts: Decimal,
    pub shifts_per_sunday: Decimal,
    pub total_sunday_shifts: Decimal,
    pub ad_hoc_shifts: Decimal,
}

/// 班次分配器
pub struct ShiftDistributor;

impl ShiftDistributor {
    /// min(floor(班次 / 天數), 3)，天數為 0 時為 0
    fn per_day(shifts: Decimal, days: u32) -> Decimal {
        safe_div(shifts, Decimal::from(days))
            .floor()
            .min(Decimal::from(MAX_SHIFTS_PER_DAY))
    }

    /// 分配一個月的總班次
    pub fn distribute(date: DateKey, total_shifts: Decimal) -> ShiftDistribution {
        let days = DayCounts::for_month(date);
        let cap = Decimal::from(MAX_SHIFTS_PER_DAY);

        let shifts_per_weekday = Self::per_day(total_shifts, days.weekdays);
        let total_weekday_shifts = shifts_per_weekday * Decimal::from(days.weekdays);
        let weekdays_full = shifts_per_weekday == cap;

        let shifts_per_saturday = if weekdays_full {
            Self::per_day(total_shifts - total_weekday_shifts, days.saturdays)
        } else {
            Decimal::ZERO
        };
        let total_saturday_shifts = shifts_per_saturday * Decimal::from(days.saturdays);

        let shifts_per_sunday = if weekdays_full {
            Self::per_day(total_shifts - total_weekday_shifts - total_saturday_shifts, days.sundays)
        } else {
            Decimal::ZERO
        };
        let total_sunday_shifts = shifts_per_sunday * Decimal::from(days.sundays);

        ShiftDistribution {
            date,
            total_shifts,
            days,
            shifts_per_weekday,
            total_weekday_shifts,
            shifts_per_saturday,
            total_saturday_shifts,
            shifts_per_sunday,
            total_sunday_shifts,
            ad_hoc_shifts: total_shifts
                - total_weekday_shifts
                - total_saturday_shifts
                - total_sunday_shifts,
        }
    }

    /// 分配一條產線的所有月份，依日期排序
    pub fn distribute_line(optimization: &LineOptimization) -> Vec<ShiftDistribution> {
        let mut rows: Vec<ShiftDistribution> = optimization
            .dates
            .iter()
            .zip(optimization.opt_capacity_shifts.iter())
            .map(|(date, shifts)| Self::distribute(*date, *shifts))
            .collect();
        rows.sort_by_key(|row| row.date);

        tracing::debug!("班次分配: {} 個月份", rows.len());
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn month(y: i32, m: u32) -> DateKey {
        DateKey::new(y, m).unwrap()
    }

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[rstest]
    // 2024-06：1 日為週六，共 20 平日、5 週六、5 週日
    #[case(month(2024, 6), 20, 5, 5)]
    // 2024-02：閏年 29 天
    #[case(month(2024, 2), 21, 4, 4)]
    #[case(month(2023, 2), 20, 4, 4)]
    fn test_day_counts(
        #[case] date: DateKey,
        #[case] weekdays: u32,
        #[case] saturdays: u32,
        #[case] sundays: u32,
    ) {
        assert_eq!(DayCounts::for_month(date), DayCounts { weekdays, saturdays, sundays });
    }

    #[test]
    fn test_weekdays_only_below_saturation() {
        // 2024-06：45 / 20 = 2.25 -> 每平日 2 班
        let row = ShiftDistributor::distribute(month(2024, 6), dec(45));
        assert_eq!(row.shifts_per_weekday, dec(2));
        assert_eq!(row.total_weekday_shifts, dec(40));
        assert_eq!(row.shifts_per_saturday, Decimal::ZERO);
        assert_eq!(row.shifts_per_sunday, Decimal::ZERO);
        assert_eq!(row.ad_hoc_shifts, dec(5));
    }

    #[test]
    fn test_overflow_to_weekend() {
        // 60 平日班 + 週六 (72 - 60) / 5 = 2 班 × 5 + 週日 (2 / 5) = 0 班，餘 2
        let row = ShiftDistributor::distribute(month(2024, 6), dec(72));
        assert_eq!(row.shifts_per_weekday, dec(3));
        assert_eq!(row.total_saturday_shifts, dec(10));
        assert_eq!(row.shifts_per_sunday, Decimal::ZERO);
        assert_eq!(row.ad_hoc_shifts, dec(2));

        let full = ShiftDistributor::distribute(month(2024, 6), dec(100));
        assert_eq!(full.shifts_per_saturday, dec(3));
        assert_eq!(full.shifts_per_sunday, dec(3));
        assert_eq!(full.ad_hoc_shifts, dec(10));
    }

    #[test]
    fn test_line_rows_sorted() {
        let optimization = LineOptimization::new()
            .with_entry(month(2024, 3), dec(10), dec(80))
            .with_entry(month(2024, 1), dec(20), dec(160));
        let rows = ShiftDistributor::distribute_line(&optimization);
        assert_eq!(
            rows.iter().map(|r| r.date).collect::<Vec<_>>(),
            vec![month(2024, 1), month(2024, 3)]
        );
        assert_eq!(rows[0].total_shifts, dec(20));
    }
}
