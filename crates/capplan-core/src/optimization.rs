//! 優化器輸出
//!
//! 產線的陣列為空代表優化器沒有為該產線產出結果

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::calendar::DateKey;
use crate::numeric::decimal_from_json;
use crate::{PlanError, Result};

/// 單一產線的優化結果（按日期排列）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineOptimization {
    pub dates: Vec<DateKey>,
    pub opt_capacity_shifts: Vec<Decimal>,
    pub opt_capacity_hours: Vec<Decimal>,
}

impl LineOptimization {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：加入一個月份的結果
    pub fn with_entry(mut self, date: DateKey, shifts: Decimal, hours: Decimal) -> Self {
        self.dates.push(date);
        self.opt_capacity_shifts.push(shifts);
        self.opt_capacity_hours.push(hours);
        self
    }

    /// 優化器是否為此產線產出結果
    pub fn has_output(&self) -> bool {
        !self.opt_capacity_hours.is_empty()
    }

    fn position(&self, date: DateKey) -> Option<usize> {
        self.dates.iter().position(|d| *d == date)
    }

    /// 指定月份的優化工時
    pub fn hours_at(&self, date: DateKey) -> Option<Decimal> {
        if !self.has_output() {
            return None;
        }
        self.position(date)
            .and_then(|i| self.opt_capacity_hours.get(i).copied())
    }

    /// 指定月份的優化班次
    pub fn shifts_at(&self, date: DateKey) -> Option<Decimal> {
        self.position(date)
            .and_then(|i| self.opt_capacity_shifts.get(i).copied())
    }

    pub fn from_json(line: &str, value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PlanError::InvalidRecordKey(format!("{line}: 優化結果必須是物件")))?;

        let dates = match object.get("DATE").and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| PlanError::InvalidDate(item.to_string()))
                        .and_then(DateKey::parse)
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let column = |key: &str| -> Vec<Decimal> {
            object
                .get(key)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .map(|v| decimal_from_json(v).unwrap_or_default())
                        .collect()
                })
                .unwrap_or_default()
        };

        let opt_capacity_shifts = column("OPT_CAPACITY_SHIFTS");
        let opt_capacity_hours = column("OPT_CAPACITY_HOURS");

        for (key, len) in [
            ("OPT_CAPACITY_SHIFTS", opt_capacity_shifts.len()),
            ("OPT_CAPACITY_HOURS", opt_capacity_hours.len()),
        ] {
            if len > dates.len() {
                return Err(PlanError::ShapeMismatch {
                    key: format!("{line}/{key}"),
                    expected: dates.len(),
                    actual: len,
                });
            }
        }

        Ok(Self {
            dates,
            opt_capacity_shifts,
            opt_capacity_hours,
        })
    }
}

/// 所有產線的優化結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizationInputs {
    pub lines: BTreeMap<String, LineOptimization>,
}

impl OptimizationInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line(mut self, line: impl Into<String>, optimization: LineOptimization) -> Self {
        self.lines.insert(line.into(), optimization);
        self
    }

    pub fn line(&self, line: &str) -> Option<&LineOptimization> {
        self.lines.get(line)
    }

    /// 任一指定產線是否有優化輸出
    pub fn any_output<'a>(&self, lines: impl IntoIterator<Item = &'a String>) -> bool {
        lines
            .into_iter()
            .any(|line| self.lines.get(line).is_some_and(LineOptimization::has_output))
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PlanError::InvalidRecordKey("優化結果必須是物件".to_string()))?;

        let mut lines = BTreeMap::new();
        for (line, line_value) in object {
            lines.insert(line.clone(), LineOptimization::from_json(line, line_value)?);
        }
        Ok(Self { lines })
    }
}
