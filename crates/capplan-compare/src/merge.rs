//! 兩個模擬資料集的命名空間合併

use capplan_calc::CapacityResolver;
use capplan_core::numeric::round_half_up;
use capplan_core::{
    safe_div, BaselineCapacityEntry, BaselineLoadEntry, CapacityCell, CapacityInputs,
    CapacityRecord, DateKey, DemandUnit, LineLoadSeries, OptimizationInputs, PlanError, Result,
    SimulationId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// 單一模擬的比較資料
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationDataset {
    /// 產線 -> 負荷序列
    pub load: BTreeMap<String, LineLoadSeries>,

    /// 情境基準負荷
    pub baseline_load: Vec<BaselineLoadEntry>,

    /// 情境產能
    pub capacity: CapacityInputs,

    /// 基準（手動）產能
    pub baseline_capacity: Vec<BaselineCapacityEntry>,

    pub optimization: OptimizationInputs,
}

impl SimulationDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 `{load, baseline_load, capacity, baseline_capacity, optimization}` 解析，缺少的鍵視為空
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PlanError::InvalidRecordKey("比較資料必須是物件".to_string()))?;

        let load = match object.get("load") {
            Some(v) if !v.is_null() => serde_json::from_value(v.clone())?,
            _ => BTreeMap::new(),
        };
        let baseline_load = match object.get("baseline_load") {
            Some(v) if !v.is_null() => serde_json::from_value(v.clone())?,
            _ => Vec::new(),
        };
        let capacity = match object.get("capacity") {
            Some(v) if !v.is_null() => CapacityInputs::from_json(v)?,
            _ => CapacityInputs::new(),
        };
        let baseline_capacity = match object.get("baseline_capacity") {
            Some(v) if !v.is_null() => serde_json::from_value(v.clone())?,
            _ => Vec::new(),
        };
        let optimization = match object.get("optimization") {
            Some(v) if !v.is_null() => OptimizationInputs::from_json(v)?,
            _ => OptimizationInputs::new(),
        };

        Ok(Self {
            load,
            baseline_load,
            capacity,
            baseline_capacity,
            optimization,
        })
    }
}

/// 合併後的負荷列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRow {
    pub simulation_id: String,
    pub line: String,
    pub date: DateKey,
    pub hours: Decimal,
    pub qty: Decimal,
    pub batches: Decimal,
    pub pallets: Decimal,
    pub absorption: Decimal,
}

impl LoadRow {
    pub fn value(&self, unit: DemandUnit) -> Decimal {
        match unit {
            DemandUnit::Hours => self.hours,
            DemandUnit::Qty => self.qty,
            DemandUnit::Batches => self.batches,
            DemandUnit::Pallets => self.pallets,
            DemandUnit::Absorption => self.absorption,
        }
    }
}

/// 情境產能列（未經優化結果調整）
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseCapacityRow {
    pub simulation_id: String,
    pub line: String,
    pub date: DateKey,
    pub record: CapacityRecord,
}

impl ExerciseCapacityRow {
    pub fn capacity_hours(&self) -> Decimal {
        self.record.productive_capacity_hours
    }

    /// 有效工時 / (OEE × 每班工時)
    pub fn capacity_shifts(&self) -> Decimal {
        safe_div(
            self.record.productive_capacity_hours,
            self.record.oee * self.record.hours_per_shift,
        )
    }
}

/// 優化結果列
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRow {
    pub simulation_id: String,
    pub line: String,
    pub date: DateKey,
    pub capacity_shifts: Decimal,

    /// round(班次 × OEE × 每班工時)，以對應的情境產能計算
    pub capacity_hours: Decimal,
}

/// 合併後的資料集，每一列都帶有來源模擬 id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedDataset {
    pub load: Vec<LoadRow>,
    pub capacity: Vec<CapacityCell>,
}

impl MergedDataset {
    /// 出現過的模擬 id
    pub fn simulation_ids(&self) -> BTreeSet<&str> {
        self.load
            .iter()
            .map(|row| row.simulation_id.as_str())
            .chain(self.capacity.iter().map(|cell| cell.simulation_id.as_str()))
            .collect()
    }

    /// 出現過的產線
    pub fn lines(&self) -> BTreeSet<&str> {
        self.load
            .iter()
            .map(|row| row.line.as_str())
            .chain(self.capacity.iter().map(|cell| cell.line.as_str()))
            .collect()
    }
}

/// 比較合併器
pub struct ComparisonMerger;

impl ComparisonMerger {
    /// 合併兩個模擬：每筆紀錄蓋上來源模擬 id 後串接，不去重
    pub fn merge_namespaces(
        first_id: &SimulationId,
        first: &SimulationDataset,
        second_id: &SimulationId,
        second: &SimulationDataset,
    ) -> Result<MergedDataset> {
        if first_id == second_id {
            return Err(PlanError::ComparisonNotAllowed(format!("兩個模擬 id 相同: {first_id}")));
        }

        tracing::debug!("合併比較資料: {} + {}", first_id, second_id);

        let mut load = Self::flatten_load(first_id, first)?;
        load.extend(Self::flatten_load(second_id, second)?);

        let baseline_capacity: Vec<BaselineCapacityEntry> =
            Self::stamp_baseline_capacity(first_id, first)
                .into_iter()
                .chain(Self::stamp_baseline_capacity(second_id, second))
                .collect();

        let mut exercise = Self::flatten_capacity(first_id, first);
        exercise.extend(Self::flatten_capacity(second_id, second));

        let mut optimization = Self::flatten_optimization(first_id, first, &exercise);
        optimization.extend(Self::flatten_optimization(second_id, second, &exercise));

        let cells = Self::reconcile_optimization_capacity(&exercise, &optimization);
        let capacity = CapacityResolver::accumulate_baseline(cells, &baseline_capacity);

        tracing::debug!("合併完成: 負荷 {} 列，產能 {} 列", load.len(), capacity.len());
        Ok(MergedDataset { load, capacity })
    }

    /// 負荷序列攤平成列，並附加屬於此模擬且產線存在的基準負荷
    pub fn flatten_load(
        simulation_id: &SimulationId,
        dataset: &SimulationDataset,
    ) -> Result<Vec<LoadRow>> {
        let id = simulation_id.as_str();
        let mut rows = Vec::new();

        for (line, series) in &dataset.load {
            for (index, date) in series.dates()?.into_iter().enumerate() {
                rows.push(LoadRow {
                    simulation_id: id.to_string(),
                    line: line.clone(),
                    date,
                    hours: series.value(DemandUnit::Hours, index),
                    qty: series.value(DemandUnit::Qty, index),
                    batches: series.value(DemandUnit::Batches, index),
                    pallets: series.value(DemandUnit::Pallets, index),
                    absorption: series.value(DemandUnit::Absorption, index),
                });
            }
        }

        for entry in &dataset.baseline_load {
            if entry.simulation_id == id && dataset.load.contains_key(&entry.line) {
                rows.push(LoadRow {
                    simulation_id: entry.simulation_id.clone(),
                    line: entry.line.clone(),
                    date: entry.date,
                    hours: entry.hours,
                    qty: entry.qty,
                    batches: entry.batches,
                    pallets: entry.pallets,
                    absorption: entry.absorption,
                });
            }
        }

        Ok(rows)
    }

    fn stamp_baseline_capacity(
        simulation_id: &SimulationId,
        dataset: &SimulationDataset,
    ) -> Vec<BaselineCapacityEntry> {
        dataset
            .baseline_capacity
            .iter()
            .map(|entry| BaselineCapacityEntry {
                simulation_id: simulation_id.to_string(),
                ..entry.clone()
            })
            .collect()
    }

    pub fn flatten_capacity(
        simulation_id: &SimulationId,
        dataset: &SimulationDataset,
    ) -> Vec<ExerciseCapacityRow> {
        dataset
            .capacity
            .lines
            .iter()
            .flat_map(|(line, capacity)| {
                capacity.records.iter().map(move |(date, record)| ExerciseCapacityRow {
                    simulation_id: simulation_id.to_string(),
                    line: line.clone(),
                    date: *date,
                    record: *record,
                })
            })
            .collect()
    }

    /// 優化結果攤平成列；工時以第一筆對應的情境產能換算，沒有對應時為 0
    pub fn flatten_optimization(
        simulation_id: &SimulationId,
        dataset: &SimulationDataset,
        exercise: &[ExerciseCapacityRow],
    ) -> Vec<OptimizationRow> {
        let id = simulation_id.as_str();
        let mut rows = Vec::new();

        for (line, optimization) in &dataset.optimization.lines {
            for (index, date) in optimization.dates.iter().enumerate() {
                let shifts = optimization
                    .opt_capacity_shifts
                    .get(index)
                    .copied()
                    .unwrap_or_default();
                let hours = exercise
                    .iter()
                    .find(|row| row.simulation_id == id && row.line == *line && row.date == *date)
                    .map(|row| round_half_up(shifts * row.record.oee * row.record.hours_per_shift))
                    .unwrap_or_default();

                rows.push(OptimizationRow {
                    simulation_id: id.to_string(),
                    line: line.clone(),
                    date: *date,
                    capacity_shifts: shifts,
                    capacity_hours: hours,
                });
            }
        }

        rows
    }

    /// 以優化結果覆寫情境產能
    ///
    /// 對有優化結果的 (模擬, 產線)，先篩出該組合的優化列，再以日期在篩選結果中的位置取值；
    /// 找不到時沿用情境產能。所有值四捨五入到整數。
    pub fn reconcile_optimization_capacity(
        exercise: &[ExerciseCapacityRow],
        optimization: &[OptimizationRow],
    ) -> Vec<CapacityCell> {
        let optimized: BTreeSet<(&str, &str)> = optimization
            .iter()
            .map(|row| (row.simulation_id.as_str(), row.line.as_str()))
            .collect();

        exercise
            .iter()
            .map(|row| {
                let mut hours = round_half_up(row.capacity_hours());
                let mut shifts = round_half_up(row.capacity_shifts());

                if optimized.contains(&(row.simulation_id.as_str(), row.line.as_str())) {
                    let filtered: Vec<&OptimizationRow> = optimization
                        .iter()
                        .filter(|opt| {
                            opt.simulation_id == row.simulation_id && opt.line == row.line
                        })
                        .collect();
                    let dates: Vec<DateKey> = filtered.iter().map(|opt| opt.date).collect();

                    if let Some(index) = dates.iter().position(|date| *date == row.date) {
                        hours = round_half_up(filtered[index].capacity_hours);
                        shifts = round_half_up(filtered[index].capacity_shifts);
                    }
                }

                CapacityCell {
                    simulation_id: row.simulation_id.clone(),
                    line: row.line.clone(),
                    date: row.date,
                    capacity_hours: hours,
                    capacity_shifts: Some(shifts),
                }
            })
            .collect()
    }
}
