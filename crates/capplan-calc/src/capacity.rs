//! 產能解析
//!
//! 優先順序：該 (產線, 月份) 有優化輸出時用優化工時，否則用有效產能工時

use capplan_core::numeric::round_half_up;
use capplan_core::{
    BaselineCapacityEntry, CapacityCell, CapacityEdit, CapacityInputs, CapacityOverlay,
    CapacityRecord, DateKey, LineCapacity, LineOptimization, ShiftBound,
};
use rust_decimal::Decimal;

/// 產能解析器
pub struct CapacityResolver;

impl CapacityResolver {
    /// 有效產能工時
    ///
    /// 優化陣列為空代表該產線沒有優化結果；有結果但缺該月份時退回有效產能
    pub fn effective_capacity_hours(
        record: Option<&CapacityRecord>,
        optimization: Option<&LineOptimization>,
        date: DateKey,
    ) -> Decimal {
        optimization
            .and_then(|opt| opt.hours_at(date))
            .unwrap_or_else(|| record.map(|r| r.productive_capacity_hours).unwrap_or_default())
    }

    /// 理論產能 = round(班次 × 每班工時 × OEE)
    pub fn theoretical_capacity(
        shifts: Decimal,
        hours_per_shift: Decimal,
        oee: Decimal,
    ) -> Decimal {
        round_half_up(shifts * hours_per_shift * oee)
    }

    /// 以紀錄的最小或最大班次計算理論產能
    pub fn theoretical_for(record: &CapacityRecord, bound: ShiftBound) -> Decimal {
        Self::theoretical_capacity(record.shifts(bound), record.hours_per_shift, record.oee)
    }

    /// 合併使用者編輯到基準紀錄
    ///
    /// 編輯欄位逐欄覆寫。OEE 被改動時有效工時重算為 計畫 × OEE；
    /// 否則明確給出的有效工時優先，計畫工時改動時亦重算
    pub fn merge_capacity_overlay(
        baseline: &CapacityRecord,
        edit: Option<&CapacityEdit>,
    ) -> CapacityRecord {
        let Some(edit) = edit else {
            return *baseline;
        };

        let mut merged = *baseline;
        if let Some(planned) = edit.planned_capacity_hours {
            merged.planned_capacity_hours = planned;
        }
        if let Some(oee) = edit.oee {
            merged.oee = oee;
        }
        if let Some(min_shifts) = edit.min_shifts {
            merged.min_shifts = min_shifts;
        }
        if let Some(max_shifts) = edit.max_shifts {
            merged.max_shifts = max_shifts;
        }
        if let Some(hours_per_shift) = edit.hours_per_shift {
            merged.hours_per_shift = hours_per_shift;
        }

        let oee_changed = edit.oee.is_some_and(|oee| oee != baseline.oee);
        let planned_changed = edit
            .planned_capacity_hours
            .is_some_and(|planned| planned != baseline.planned_capacity_hours);

        merged.productive_capacity_hours = if oee_changed {
            merged.planned_capacity_hours * merged.oee
        } else if let Some(productive) = edit.productive_capacity_hours {
            productive
        } else if planned_changed {
            merged.planned_capacity_hours * merged.oee
        } else {
            baseline.productive_capacity_hours
        };

        merged
    }

    /// 將整個覆蓋層套用到產能輸入，回傳新的產能輸入
    ///
    /// 編輯的 (產線, 月份) 不存在於輸入時忽略
    pub fn apply_overlay(inputs: &CapacityInputs, overlay: &CapacityOverlay) -> CapacityInputs {
        if overlay.is_empty() {
            return inputs.clone();
        }

        let mut merged = CapacityInputs::new();
        for (line, capacity) in &inputs.lines {
            let mut line_capacity = LineCapacity::new();
            for (date, record) in &capacity.records {
                let record = Self::merge_capacity_overlay(record, overlay.get(line, *date));
                line_capacity.records.insert(*date, record);
            }
            merged.lines.insert(line.clone(), line_capacity);
        }
        merged
    }

    /// 將基準（手動）產能累加到產能儲存格
    ///
    /// 相同 (模擬, 產線, 月份) 的值相加，不存在時附加新儲存格
    pub fn accumulate_baseline(
        mut cells: Vec<CapacityCell>,
        baseline: &[BaselineCapacityEntry],
    ) -> Vec<CapacityCell> {
        for entry in baseline {
            let existing = cells.iter_mut().find(|cell| {
                cell.simulation_id == entry.simulation_id
                    && cell.line == entry.line
                    && cell.date == entry.date
            });

            match existing {
                Some(cell) => {
                    cell.capacity_hours += entry.capacity_hours;
                    cell.capacity_shifts = match (cell.capacity_shifts, entry.capacity_shifts) {
                        (None, None) => None,
                        (a, b) => Some(a.unwrap_or_default() + b.unwrap_or_default()),
                    };
                }
                None => cells.push(entry.clone().into_cell()),
            }
        }
        cells
    }
}
