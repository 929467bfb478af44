//! 產能模型
//!
//! 每條產線按月份記錄計畫工時、OEE、有效工時與班次範圍

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::calendar::DateKey;
use crate::numeric::decimal_from_json;
use crate::{PlanError, Result};

/// 班次上下限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftBound {
    Min,
    Max,
}

/// 單一 (產線, 月份) 的產能紀錄
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CapacityRecord {
    /// 計畫產能工時
    pub planned_capacity_hours: Decimal,

    /// 設備綜合效率（0–1）
    pub oee: Decimal,

    /// 有效產能工時（通常為 計畫 × OEE）
    pub productive_capacity_hours: Decimal,

    pub min_shifts: Decimal,
    pub max_shifts: Decimal,
    pub hours_per_shift: Decimal,
}

impl CapacityRecord {
    /// 以計畫工時與 OEE 創建，有效工時自動計算
    pub fn new(planned_capacity_hours: Decimal, oee: Decimal) -> Self {
        Self {
            planned_capacity_hours,
            oee,
            productive_capacity_hours: planned_capacity_hours * oee,
            ..Self::default()
        }
    }

    /// 建構器模式：設置班次範圍與每班工時
    pub fn with_shifts(
        mut self,
        min_shifts: Decimal,
        max_shifts: Decimal,
        hours_per_shift: Decimal,
    ) -> Self {
        self.min_shifts = min_shifts;
        self.max_shifts = max_shifts;
        self.hours_per_shift = hours_per_shift;
        self
    }

    /// 建構器模式：覆寫有效工時
    pub fn with_productive_hours(mut self, hours: Decimal) -> Self {
        self.productive_capacity_hours = hours;
        self
    }

    pub fn shifts(&self, bound: ShiftBound) -> Decimal {
        match bound {
            ShiftBound::Min => self.min_shifts,
            ShiftBound::Max => self.max_shifts,
        }
    }
}

/// 單一產線的產能序列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineCapacity {
    pub records: BTreeMap<DateKey, CapacityRecord>,
}

impl LineCapacity {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：加入月份紀錄
    pub fn with_record(mut self, date: DateKey, record: CapacityRecord) -> Self {
        self.records.insert(date, record);
        self
    }

    pub fn get(&self, date: DateKey) -> Option<&CapacityRecord> {
        self.records.get(&date)
    }

    pub fn dates(&self) -> impl Iterator<Item = DateKey> + '_ {
        self.records.keys().copied()
    }

    /// 從 `{DATE: [...], OEE: [...], ...}` 解析，同一日期重複時以第一筆為準
    pub fn from_json(line: &str, value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PlanError::InvalidRecordKey(format!("{line}: 產能資料必須是物件")))?;

        let dates: Vec<DateKey> = object
            .get("DATE")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .ok_or_else(|| PlanError::InvalidDate(item.to_string()))
                            .and_then(DateKey::parse)
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        let column = |key: &str| -> Result<Vec<Decimal>> {
            let values: Vec<Decimal> = object
                .get(key)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .map(|v| decimal_from_json(v).unwrap_or_default())
                        .collect()
                })
                .unwrap_or_default();
            if values.len() > dates.len() {
                return Err(PlanError::ShapeMismatch {
                    key: format!("{line}/{key}"),
                    expected: dates.len(),
                    actual: values.len(),
                });
            }
            Ok(values)
        };

        let planned = column("PLANNED_CAPACITY_HOURS")?;
        let oee = column("OEE")?;
        let productive = column("PRODUCTIVE_CAPACITY_HOURS")?;
        let min_shifts = column("MIN_SHIFTS")?;
        let max_shifts = column("MAX_SHIFTS")?;
        let hours_per_shift = column("HOURS_PER_SHIFT")?;

        let at = |values: &[Decimal], i: usize| values.get(i).copied().unwrap_or_default();

        let mut records = BTreeMap::new();
        for (i, date) in dates.iter().enumerate() {
            records.entry(*date).or_insert(CapacityRecord {
                planned_capacity_hours: at(&planned, i),
                oee: at(&oee, i),
                productive_capacity_hours: at(&productive, i),
                min_shifts: at(&min_shifts, i),
                max_shifts: at(&max_shifts, i),
                hours_per_shift: at(&hours_per_shift, i),
            });
        }

        Ok(Self { records })
    }
}

/// 所有產線的產能輸入
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityInputs {
    pub lines: BTreeMap<String, LineCapacity>,
}

impl CapacityInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line(mut self, line: impl Into<String>, capacity: LineCapacity) -> Self {
        self.lines.insert(line.into(), capacity);
        self
    }

    pub fn line(&self, line: &str) -> Option<&LineCapacity> {
        self.lines.get(line)
    }

    pub fn record(&self, line: &str, date: DateKey) -> Option<&CapacityRecord> {
        self.lines.get(line).and_then(|c| c.get(date))
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PlanError::InvalidRecordKey("產能資料必須是物件".to_string()))?;

        let mut lines = BTreeMap::new();
        for (line, line_value) in object {
            lines.insert(line.clone(), LineCapacity::from_json(line, line_value)?);
        }
        Ok(Self { lines })
    }
}

/// 使用者的產能編輯（逐欄覆寫，缺欄沿用基準值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityEdit {
    pub line: String,
    pub date: DateKey,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub planned_capacity_hours: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub oee: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub productive_capacity_hours: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min_shifts: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_shifts: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hours_per_shift: Option<Decimal>,
}

impl CapacityEdit {
    pub fn new(line: impl Into<String>, date: DateKey) -> Self {
        Self {
            line: line.into(),
            date,
            planned_capacity_hours: None,
            oee: None,
            productive_capacity_hours: None,
            min_shifts: None,
            max_shifts: None,
            hours_per_shift: None,
        }
    }

    pub fn with_oee(mut self, oee: Decimal) -> Self {
        self.oee = Some(oee);
        self
    }

    pub fn with_planned_hours(mut self, hours: Decimal) -> Self {
        self.planned_capacity_hours = Some(hours);
        self
    }

    pub fn with_productive_hours(mut self, hours: Decimal) -> Self {
        self.productive_capacity_hours = Some(hours);
        self
    }

    pub fn with_shifts(mut self, min_shifts: Decimal, max_shifts: Decimal) -> Self {
        self.min_shifts = Some(min_shifts);
        self.max_shifts = Some(max_shifts);
        self
    }

    pub fn with_hours_per_shift(mut self, hours: Decimal) -> Self {
        self.hours_per_shift = Some(hours);
        self
    }

    /// 合併同一 (產線, 月份) 的後到編輯：後到編輯給出的欄位覆寫，其餘保留
    pub fn merge(&mut self, later: CapacityEdit) {
        self.planned_capacity_hours = later.planned_capacity_hours.or(self.planned_capacity_hours);
        self.oee = later.oee.or(self.oee);
        self.productive_capacity_hours = later
            .productive_capacity_hours
            .or(self.productive_capacity_hours);
        self.min_shifts = later.min_shifts.or(self.min_shifts);
        self.max_shifts = later.max_shifts.or(self.max_shifts);
        self.hours_per_shift = later.hours_per_shift.or(self.hours_per_shift);
    }
}

/// 產能編輯覆蓋層，以 (產線, 月份) 為鍵，同一鍵的編輯逐欄合併
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityOverlay {
    edits: BTreeMap<(String, DateKey), CapacityEdit>,
}

impl CapacityOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, edit: CapacityEdit) {
        match self.edits.entry((edit.line.clone(), edit.date)) {
            Entry::Occupied(mut existing) => existing.get_mut().merge(edit),
            Entry::Vacant(slot) => {
                slot.insert(edit);
            }
        }
    }

    pub fn get(&self, line: &str, date: DateKey) -> Option<&CapacityEdit> {
        self.edits.get(&(line.to_string(), date))
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapacityEdit> {
        self.edits.values()
    }

    pub fn to_payload(&self) -> Vec<CapacityEdit> {
        self.edits.values().cloned().collect()
    }
}

/// 比較檢視用的扁平產能儲存格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityCell {
    pub simulation_id: String,
    pub line: String,
    pub date: DateKey,
    pub capacity_hours: Decimal,
    #[serde(default)]
    pub capacity_shifts: Option<Decimal>,
}

/// 外部提供的基準（手動）產能
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineCapacityEntry {
    #[serde(default)]
    pub simulation_id: String,
    pub line: String,
    pub date: DateKey,
    pub capacity_hours: Decimal,
    #[serde(default)]
    pub capacity_shifts: Option<Decimal>,
}

impl BaselineCapacityEntry {
    pub fn into_cell(self) -> CapacityCell {
        CapacityCell {
            simulation_id: self.simulation_id,
            line: self.line,
            date: self.date,
            capacity_hours: self.capacity_hours,
            capacity_shifts: self.capacity_shifts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_capacity_from_json() {
        let value = json!({
            "DATE": ["2024-01-01", "2024-02-01", "2024-01-01"],
            "PLANNED_CAPACITY_HOURS": [500, 480, 999],
            "OEE": [0.8, 0.75, 0.1],
            "PRODUCTIVE_CAPACITY_HOURS": [400, 360, 99.9],
            "MIN_SHIFTS": [20, 20, 1],
            "MAX_SHIFTS": [60, 60, 1],
            "HOURS_PER_SHIFT": [8, 8, 8]
        });

        let capacity = LineCapacity::from_json("L1", &value).unwrap();
        assert_eq!(capacity.records.len(), 2);

        let jan = capacity.get(DateKey::new(2024, 1).unwrap()).unwrap();
        assert_eq!(jan.productive_capacity_hours, Decimal::from(400));
        assert_eq!(jan.oee, Decimal::new(8, 1));
        assert_eq!(jan.shifts(ShiftBound::Max), Decimal::from(60));
    }

    #[test]
    fn test_line_capacity_rejects_long_column() {
        let value = json!({
            "DATE": ["2024-01-01"],
            "OEE": [0.8, 0.9]
        });
        assert!(matches!(
            LineCapacity::from_json("L1", &value),
            Err(PlanError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_overlay_merges_edits_per_field() {
        let jan = DateKey::new(2024, 1).unwrap();
        let mut overlay = CapacityOverlay::new();
        overlay.record(CapacityEdit::new("L1", jan).with_oee(Decimal::new(9, 1)));
        overlay.record(CapacityEdit::new("L1", jan).with_hours_per_shift(Decimal::from(7)));
        overlay.record(CapacityEdit::new("L1", jan).with_oee(Decimal::new(8, 1)));

        assert_eq!(overlay.len(), 1);
        let edit = overlay.get("L1", jan).unwrap();
        assert_eq!(edit.oee, Some(Decimal::new(8, 1)));
        assert_eq!(edit.hours_per_shift, Some(Decimal::from(7)));
        assert_eq!(edit.planned_capacity_hours, None);
    }

    #[test]
    fn test_record_new_tracks_oee() {
        let record = CapacityRecord::new(Decimal::from(500), Decimal::new(8, 1));
        assert_eq!(record.productive_capacity_hours, Decimal::from(400));
    }
}
