//! 需求模型
//!
//! 需求輸入以產線為單位，每條產線有一組產品（SKU），
//! 每個 `{YYYY}_{MM}_{DD}_{UNIT}` 鍵對應一個按產品索引排列的數值陣列，
//! `{YYYY}_{MM}_{DD}_ORIGINAL_{UNIT}` 為不可變的基準值。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::calendar::DateKey;
use crate::numeric::decimal_from_json;
use crate::{PlanError, Result};

/// 需求單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandUnit {
    /// 工時
    #[default]
    #[serde(alias = "HOURS", alias = "Hours")]
    Hours,
    /// 數量（換算樞紐）
    #[serde(alias = "QTY", alias = "Quantity", alias = "quantity")]
    Qty,
    /// 批次
    #[serde(alias = "BATCHES", alias = "Batches")]
    Batches,
    /// 棧板
    #[serde(alias = "PALLETS", alias = "Pallets")]
    Pallets,
    /// 費用吸收
    #[serde(alias = "ABSORPTION", alias = "Absorption")]
    Absorption,
}

impl DemandUnit {
    pub const ALL: [DemandUnit; 5] = [
        DemandUnit::Hours,
        DemandUnit::Qty,
        DemandUnit::Batches,
        DemandUnit::Pallets,
        DemandUnit::Absorption,
    ];

    /// 紀錄鍵中的單位名稱
    pub fn key(&self) -> &'static str {
        match self {
            DemandUnit::Hours => "HOURS",
            DemandUnit::Qty => "QTY",
            DemandUnit::Batches => "BATCHES",
            DemandUnit::Pallets => "PALLETS",
            DemandUnit::Absorption => "ABSORPTION",
        }
    }

    /// 由紀錄鍵單位名稱解析
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| unit.key() == key)
    }

    /// 是否可由使用者直接編輯（棧板與費用吸收永遠是衍生值）
    pub fn is_editable(&self) -> bool {
        matches!(self, DemandUnit::Hours | DemandUnit::Qty | DemandUnit::Batches)
    }
}

impl fmt::Display for DemandUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DemandUnit {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HOURS" => Ok(DemandUnit::Hours),
            "QTY" | "QUANTITY" => Ok(DemandUnit::Qty),
            "BATCHES" => Ok(DemandUnit::Batches),
            "PALLETS" => Ok(DemandUnit::Pallets),
            "ABSORPTION" => Ok(DemandUnit::Absorption),
            _ => Err(PlanError::UnknownUnit(s.to_string())),
        }
    }
}

/// 產品換算係數種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateKind {
    /// 每小時產量
    #[serde(rename = "PRODRATE")]
    ProdRate,
    /// 每批數量
    BatchSize,
    /// 每棧板數量
    UnitPerPallet,
    /// 每單位間接費用
    OverheadCostByUnit,
}

impl RateKind {
    pub const ALL: [RateKind; 4] = [
        RateKind::ProdRate,
        RateKind::BatchSize,
        RateKind::UnitPerPallet,
        RateKind::OverheadCostByUnit,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RateKind::ProdRate => "PRODRATE",
            RateKind::BatchSize => "BATCH_SIZE",
            RateKind::UnitPerPallet => "UNIT_PER_PALLET",
            RateKind::OverheadCostByUnit => "OVERHEAD_COST_BY_UNIT",
        }
    }

    /// 此係數換算出的單位
    pub fn target_unit(&self) -> DemandUnit {
        match self {
            RateKind::ProdRate => DemandUnit::Hours,
            RateKind::BatchSize => DemandUnit::Batches,
            RateKind::UnitPerPallet => DemandUnit::Pallets,
            RateKind::OverheadCostByUnit => DemandUnit::Absorption,
        }
    }
}

/// 單一產品的換算係數
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductRates {
    pub prodrate: Decimal,
    pub batch_size: Decimal,
    pub unit_per_pallet: Decimal,
    pub overhead_cost_by_unit: Decimal,
}

impl ProductRates {
    pub fn new(
        prodrate: Decimal,
        batch_size: Decimal,
        unit_per_pallet: Decimal,
        overhead_cost_by_unit: Decimal,
    ) -> Self {
        Self {
            prodrate,
            batch_size,
            unit_per_pallet,
            overhead_cost_by_unit,
        }
    }

    pub fn get(&self, kind: RateKind) -> Decimal {
        match kind {
            RateKind::ProdRate => self.prodrate,
            RateKind::BatchSize => self.batch_size,
            RateKind::UnitPerPallet => self.unit_per_pallet,
            RateKind::OverheadCostByUnit => self.overhead_cost_by_unit,
        }
    }

    pub fn set(&mut self, kind: RateKind, value: Decimal) {
        match kind {
            RateKind::ProdRate => self.prodrate = value,
            RateKind::BatchSize => self.batch_size = value,
            RateKind::UnitPerPallet => self.unit_per_pallet = value,
            RateKind::OverheadCostByUnit => self.overhead_cost_by_unit = value,
        }
    }
}

/// 解析後的序列鍵
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesKey {
    pub date: DateKey,
    pub unit: DemandUnit,
    pub original: bool,
}

impl SeriesKey {
    /// 解析 `{YYYY}_{MM}_{DD}_{UNIT}` 或 `{YYYY}_{MM}_{DD}_ORIGINAL_{UNIT}`
    ///
    /// 非日期開頭的鍵（如 `PRODRATE`）或未知單位回傳 `Ok(None)`；
    /// 日期部分看起來像日期卻無效時回傳錯誤
    pub fn parse(key: &str) -> Result<Option<Self>> {
        let parts: Vec<&str> = key.split('_').collect();
        if parts.len() < 4 || !parts[..3].iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
            return Ok(None);
        }

        let (original, unit_part) = match parts.len() {
            4 => (false, parts[3]),
            5 if parts[3] == "ORIGINAL" => (true, parts[4]),
            _ => return Ok(None),
        };

        let Some(unit) = DemandUnit::from_key(unit_part) else {
            return Ok(None);
        };

        let date = DateKey::parse(&parts[..3].join("-"))
            .map_err(|_| PlanError::InvalidRecordKey(key.to_string()))?;

        Ok(Some(Self {
            date,
            unit,
            original,
        }))
    }

    /// 編碼回紀錄鍵
    pub fn encode(&self) -> String {
        if self.original {
            format!("{}_ORIGINAL_{}", self.date.record_key(), self.unit.key())
        } else {
            format!("{}_{}", self.date.record_key(), self.unit.key())
        }
    }
}

type UnitSeries = BTreeMap<(DateKey, DemandUnit), Vec<Option<Decimal>>>;

/// 單一產線的需求資料
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineDemand {
    /// 產品（IOP_PRODUCT）
    pub products: Vec<String>,

    /// 按產品索引排列的換算係數
    pub rates: Vec<ProductRates>,

    /// 出現過的日期（排序、去重）
    pub dates: Vec<DateKey>,

    current: UnitSeries,
    original: UnitSeries,
}

impl LineDemand {
    /// 創建空的產線需求
    pub fn new(products: Vec<String>) -> Self {
        let rates = vec![ProductRates::default(); products.len()];
        Self {
            products,
            rates,
            dates: Vec::new(),
            current: BTreeMap::new(),
            original: BTreeMap::new(),
        }
    }

    /// 建構器模式：設置產品換算係數
    pub fn with_rates(mut self, index: usize, rates: ProductRates) -> Self {
        if index < self.rates.len() {
            self.rates[index] = rates;
        }
        self
    }

    /// 建構器模式：設置目前值
    pub fn with_value(
        mut self,
        date: DateKey,
        unit: DemandUnit,
        index: usize,
        value: Decimal,
    ) -> Self {
        self.set_value(date, unit, index, value, false);
        self
    }

    /// 建構器模式：設置基準值
    pub fn with_original(
        mut self,
        date: DateKey,
        unit: DemandUnit,
        index: usize,
        value: Decimal,
    ) -> Self {
        self.set_value(date, unit, index, value, true);
        self
    }

    fn set_value(
        &mut self,
        date: DateKey,
        unit: DemandUnit,
        index: usize,
        value: Decimal,
        original: bool,
    ) {
        let count = self.products.len().max(index + 1);
        let series = if original {
            &mut self.original
        } else {
            &mut self.current
        };
        let values = series.entry((date, unit)).or_default();
        if values.len() < count {
            values.resize(count, None);
        }
        values[index] = Some(value);
        self.register_date(date);
    }

    fn register_date(&mut self, date: DateKey) {
        if let Err(pos) = self.dates.binary_search(&date) {
            self.dates.insert(pos, date);
        }
    }

    /// 產品數量
    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn product_name(&self, index: usize) -> Option<&str> {
        self.products.get(index).map(String::as_str)
    }

    pub fn product_index(&self, product: &str) -> Option<usize> {
        self.products.iter().position(|p| p == product)
    }

    /// 產品換算係數，缺值視為 0
    pub fn rates(&self, index: usize) -> ProductRates {
        self.rates.get(index).copied().unwrap_or_default()
    }

    /// 目前儲存值（`{date}_{UNIT}`）
    pub fn value(&self, date: DateKey, unit: DemandUnit, index: usize) -> Option<Decimal> {
        self.current
            .get(&(date, unit))
            .and_then(|values| values.get(index).copied().flatten())
    }

    /// 基準值（`{date}_ORIGINAL_{UNIT}`）
    pub fn original(&self, date: DateKey, unit: DemandUnit, index: usize) -> Option<Decimal> {
        self.original
            .get(&(date, unit))
            .and_then(|values| values.get(index).copied().flatten())
    }

    /// 是否有該日期該單位的序列
    pub fn has_series(&self, date: DateKey, unit: DemandUnit) -> bool {
        self.current.contains_key(&(date, unit))
    }

    /// 從 JSON 物件解析單一產線
    pub fn from_json(line: &str, value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PlanError::InvalidRecordKey(format!("{line}: 產線資料必須是物件")))?;

        let products: Vec<String> = object
            .get("IOP_PRODUCT")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut series: Vec<(SeriesKey, Vec<Option<Decimal>>)> = Vec::new();
        for (key, raw) in object {
            if let Some(series_key) = SeriesKey::parse(key)? {
                series.push((series_key, decimal_array(raw)));
            }
        }

        let product_count = if products.is_empty() {
            series.iter().map(|(_, values)| values.len()).max().unwrap_or(0)
        } else {
            products.len()
        };

        for (key, values) in &series {
            if values.len() > product_count {
                return Err(PlanError::ShapeMismatch {
                    key: format!("{line}/{}", key.encode()),
                    expected: product_count,
                    actual: values.len(),
                });
            }
        }

        let products = if products.is_empty() {
            (0..product_count).map(|i| format!("#{i}")).collect()
        } else {
            products
        };

        let mut line_demand = Self::new(products);
        for kind in RateKind::ALL {
            if let Some(raw) = object.get(kind.key()) {
                let rates = decimal_array(raw).into_iter().enumerate().take(product_count);
                for (index, rate) in rates {
                    line_demand.rates[index].set(kind, rate.unwrap_or_default());
                }
            }
        }

        for (key, mut values) in series {
            values.resize(product_count, None);
            line_demand.register_date(key.date);
            if key.original {
                line_demand.original.insert((key.date, key.unit), values);
            } else {
                line_demand.current.insert((key.date, key.unit), values);
            }
        }

        Ok(line_demand)
    }
}

fn decimal_array(value: &Value) -> Vec<Option<Decimal>> {
    value
        .as_array()
        .map(|items| items.iter().map(decimal_from_json).collect())
        .unwrap_or_default()
}

/// 所有產線的需求輸入
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandInputs {
    pub lines: BTreeMap<String, LineDemand>,
}

impl DemandInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：加入產線
    pub fn with_line(mut self, line: impl Into<String>, demand: LineDemand) -> Self {
        self.lines.insert(line.into(), demand);
        self
    }

    pub fn line(&self, line: &str) -> Option<&LineDemand> {
        self.lines.get(line)
    }

    /// 從 `Line -> {...}` 形狀的 JSON 解析
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PlanError::InvalidRecordKey("需求資料必須是物件".to_string()))?;

        let mut lines = BTreeMap::new();
        for (line, line_value) in object {
            lines.insert(line.clone(), LineDemand::from_json(line, line_value)?);
        }
        Ok(Self { lines })
    }

    /// 所有產線的日期聯集
    pub fn all_dates(&self) -> Vec<DateKey> {
        let dates: BTreeSet<DateKey> = self
            .lines
            .values()
            .flat_map(|line| line.dates.iter().copied())
            .collect();
        dates.into_iter().collect()
    }

    /// 將編輯覆蓋層寫入目前值，基準值保持不變
    ///
    /// 覆蓋層中不存在的產線或產品會被略過
    pub fn commit_overlay(&mut self, overlay: &DemandOverlay) {
        for ((line, product, date), units) in &overlay.cells {
            let Some(demand) = self.lines.get_mut(line) else {
                continue;
            };
            let Some(index) = demand.product_index(product) else {
                continue;
            };
            for (unit, value) in units {
                demand.set_value(*date, *unit, index, *value, false);
            }
        }

        for ((line, product), rates) in &overlay.rates {
            let Some(demand) = self.lines.get_mut(line) else {
                continue;
            };
            let Some(index) = demand.product_index(product) else {
                continue;
            };
            if let Some(slot) = demand.rates.get_mut(index) {
                for (kind, value) in rates {
                    slot.set(*kind, *value);
                }
            }
        }
    }
}

type CellEditKey = (String, String, DateKey);
type RateEditKey = (String, String);

/// 需求編輯覆蓋層
///
/// 以 (產線, 產品, 日期) 為鍵累積使用者編輯，不會修改原始輸入；
/// 同一鍵的多次編輯按單位逐欄合併。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandOverlay {
    cells: BTreeMap<CellEditKey, BTreeMap<DemandUnit, Decimal>>,
    rates: BTreeMap<RateEditKey, BTreeMap<RateKind, Decimal>>,
}

impl DemandOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已編輯的值
    pub fn edited(
        &self,
        line: &str,
        product: &str,
        date: DateKey,
        unit: DemandUnit,
    ) -> Option<Decimal> {
        self.cells
            .get(&(line.to_string(), product.to_string(), date))
            .and_then(|units| units.get(&unit).copied())
    }

    /// 記錄一筆單位編輯
    pub fn set_value(
        &mut self,
        line: &str,
        product: &str,
        date: DateKey,
        unit: DemandUnit,
        value: Decimal,
    ) {
        self.cells
            .entry((line.to_string(), product.to_string(), date))
            .or_default()
            .insert(unit, value);
    }

    /// 已編輯的換算係數
    pub fn rate(&self, line: &str, product: &str, kind: RateKind) -> Option<Decimal> {
        self.rates
            .get(&(line.to_string(), product.to_string()))
            .and_then(|rates| rates.get(&kind).copied())
    }

    /// 記錄一筆換算係數編輯
    pub fn set_rate(&mut self, line: &str, product: &str, kind: RateKind, value: Decimal) {
        self.rates
            .entry((line.to_string(), product.to_string()))
            .or_default()
            .insert(kind, value);
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.rates.is_empty()
    }

    /// 編輯條目數量（儲存格與係數）
    pub fn len(&self) -> usize {
        self.cells.len() + self.rates.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.rates.clear();
    }

    /// 有編輯的產線
    pub fn lines(&self) -> BTreeSet<String> {
        self.cells
            .keys()
            .map(|(line, _, _)| line.clone())
            .chain(self.rates.keys().map(|(line, _)| line.clone()))
            .collect()
    }

    /// 轉換為儲存用的批次內容
    pub fn to_payload(&self) -> Vec<DemandEditEntry> {
        let mut payload = Vec::with_capacity(self.len());

        for ((line, product, date), units) in &self.cells {
            let mut entry = DemandEditEntry::new(line.clone(), product.clone(), Some(*date));
            for (unit, value) in units {
                entry.set_unit(*unit, *value);
            }
            payload.push(entry);
        }

        for ((line, product), rates) in &self.rates {
            let mut entry = DemandEditEntry::new(line.clone(), product.clone(), None);
            for (kind, value) in rates {
                entry.set_rate(*kind, *value);
            }
            payload.push(entry);
        }

        payload
    }
}

/// 儲存批次中的一筆需求編輯
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DemandEditEntry {
    pub line: String,
    pub iop_product: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date: Option<DateKey>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hours: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub qty: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub batches: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pallets: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub absorption: Option<Decimal>,
    #[serde(rename = "PRODRATE", skip_serializing_if = "Option::is_none", default)]
    pub prodrate: Option<Decimal>,
    #[serde(rename = "BATCH_SIZE", skip_serializing_if = "Option::is_none", default)]
    pub batch_size: Option<Decimal>,
    #[serde(rename = "UNIT_PER_PALLET", skip_serializing_if = "Option::is_none", default)]
    pub unit_per_pallet: Option<Decimal>,
    #[serde(rename = "OVERHEAD_COST_BY_UNIT", skip_serializing_if = "Option::is_none", default)]
    pub overhead_cost_by_unit: Option<Decimal>,
}

impl DemandEditEntry {
    pub fn new(line: String, iop_product: String, date: Option<DateKey>) -> Self {
        Self {
            line,
            iop_product,
            date,
            ..Self::default()
        }
    }

    fn set_unit(&mut self, unit: DemandUnit, value: Decimal) {
        let slot = match unit {
            DemandUnit::Hours => &mut self.hours,
            DemandUnit::Qty => &mut self.qty,
            DemandUnit::Batches => &mut self.batches,
            DemandUnit::Pallets => &mut self.pallets,
            DemandUnit::Absorption => &mut self.absorption,
        };
        *slot = Some(value);
    }

    fn set_rate(&mut self, kind: RateKind, value: Decimal) {
        let slot = match kind {
            RateKind::ProdRate => &mut self.prodrate,
            RateKind::BatchSize => &mut self.batch_size,
            RateKind::UnitPerPallet => &mut self.unit_per_pallet,
            RateKind::OverheadCostByUnit => &mut self.overhead_cost_by_unit,
        };
        *slot = Some(value);
    }
}

/// 比較檢視用的產線負荷序列（已按產線、日期彙總）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LineLoadSeries {
    #[serde(default)]
    pub date: Vec<String>,
    #[serde(default)]
    pub hours: Vec<Option<Decimal>>,
    #[serde(default)]
    pub qty: Vec<Option<Decimal>>,
    #[serde(default)]
    pub batches: Vec<Option<Decimal>>,
    #[serde(default)]
    pub pallets: Vec<Option<Decimal>>,
    #[serde(default)]
    pub absorption: Vec<Option<Decimal>>,
}

impl LineLoadSeries {
    /// 解析後的日期
    pub fn dates(&self) -> Result<Vec<DateKey>> {
        self.date.iter().map(|d| DateKey::parse(d)).collect()
    }

    /// 第 `index` 筆的單位值，缺值視為 0
    pub fn value(&self, unit: DemandUnit, index: usize) -> Decimal {
        let values = match unit {
            DemandUnit::Hours => &self.hours,
            DemandUnit::Qty => &self.qty,
            DemandUnit::Batches => &self.batches,
            DemandUnit::Pallets => &self.pallets,
            DemandUnit::Absorption => &self.absorption,
        };
        values.get(index).copied().flatten().unwrap_or_default()
    }
}

/// 情境基準負荷（扁平紀錄）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineLoadEntry {
    pub simulation_id: String,
    pub line: String,
    pub date: DateKey,
    #[serde(default)]
    pub hours: Decimal,
    #[serde(default)]
    pub qty: Decimal,
    #[serde(default)]
    pub batches: Decimal,
    #[serde(default)]
    pub pallets: Decimal,
    #[serde(default)]
    pub absorption: Decimal,
}

impl BaselineLoadEntry {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jan() -> DateKey {
        DateKey::new(2024, 1).unwrap()
    }

    #[test]
    fn test_series_key_parse() {
        let key = SeriesKey::parse("2024_01_01_HOURS").unwrap().unwrap();
        assert_eq!(key.date, jan());
        assert_eq!(key.unit, DemandUnit::Hours);
        assert!(!key.original);

        let key = SeriesKey::parse("2024_01_01_ORIGINAL_QTY").unwrap().unwrap();
        assert!(key.original);
        assert_eq!(key.unit, DemandUnit::Qty);
        assert_eq!(key.encode(), "2024_01_01_ORIGINAL_QTY");

        assert!(SeriesKey::parse("PRODRATE").unwrap().is_none());
        assert!(SeriesKey::parse("2024_01_01_SOMETHING").unwrap().is_none());
        assert!(SeriesKey::parse("2024_13_01_HOURS").is_err());
    }

    #[test]
    fn test_line_demand_from_json() {
        let value = json!({
            "IOP_PRODUCT": ["SKU-A", "SKU-B"],
            "PRODRATE": [50, 25],
            "BATCH_SIZE": [200, 100],
            "UNIT_PER_PALLET": [40, 40],
            "OVERHEAD_COST_BY_UNIT": [0.5, 1.25],
            "DATE": ["2024-01-01"],
            "2024_01_01_QTY": [1000, 500],
            "2024_01_01_HOURS": [20, 20],
            "2024_01_01_ORIGINAL_HOURS": [20],
            "LINE_DESCRIPTION": "ignored"
        });

        let line = LineDemand::from_json("L1", &value).unwrap();
        assert_eq!(line.product_count(), 2);
        assert_eq!(line.dates, vec![jan()]);
        assert_eq!(line.rates(1).prodrate, Decimal::from(25));
        assert_eq!(line.rates(1).overhead_cost_by_unit, Decimal::new(125, 2));
        assert_eq!(line.value(jan(), DemandUnit::Qty, 0), Some(Decimal::from(1000)));
        assert_eq!(line.original(jan(), DemandUnit::Hours, 0), Some(Decimal::from(20)));
        // 較短的基準陣列以缺值補齊
        assert_eq!(line.original(jan(), DemandUnit::Hours, 1), None);
    }

    #[test]
    fn test_line_demand_rejects_oversized_series() {
        let value = json!({
            "IOP_PRODUCT": ["SKU-A"],
            "2024_01_01_QTY": [1, 2, 3]
        });
        let err = LineDemand::from_json("L1", &value).unwrap_err();
        assert!(matches!(err, PlanError::ShapeMismatch { expected: 1, actual: 3, .. }));
    }

    #[test]
    fn test_overlay_merges_units_per_key() {
        let mut overlay = DemandOverlay::new();
        overlay.set_value("L1", "SKU-A", jan(), DemandUnit::Hours, Decimal::from(150));
        overlay.set_value("L1", "SKU-A", jan(), DemandUnit::Qty, Decimal::from(7500));
        overlay.set_rate("L1", "SKU-A", RateKind::ProdRate, Decimal::from(60));

        assert_eq!(overlay.len(), 2);
        assert_eq!(
            overlay.edited("L1", "SKU-A", jan(), DemandUnit::Hours),
            Some(Decimal::from(150))
        );
        assert_eq!(overlay.edited("L1", "SKU-A", jan(), DemandUnit::Batches), None);

        let payload = overlay.to_payload();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].hours, Some(Decimal::from(150)));
        assert_eq!(payload[0].qty, Some(Decimal::from(7500)));
        assert_eq!(payload[1].date, None);
        assert_eq!(payload[1].prodrate, Some(Decimal::from(60)));

        let json = serde_json::to_value(&payload[1]).unwrap();
        assert!(json.get("hours").is_none());
        assert_eq!(json["iop_product"], "SKU-A");
    }

    #[test]
    fn test_commit_overlay_keeps_original() {
        let mut inputs = DemandInputs::new().with_line(
            "L1",
            LineDemand::new(vec!["SKU-A".into()])
                .with_value(jan(), DemandUnit::Hours, 0, Decimal::from(100))
                .with_original(jan(), DemandUnit::Hours, 0, Decimal::from(100)),
        );
        let mut overlay = DemandOverlay::new();
        overlay.set_value("L1", "SKU-A", jan(), DemandUnit::Hours, Decimal::from(150));
        overlay.set_value("L1", "SKU-Z", jan(), DemandUnit::Hours, Decimal::from(1));
        overlay.set_rate("L1", "SKU-A", RateKind::ProdRate, Decimal::from(60));

        inputs.commit_overlay(&overlay);
        let line = inputs.line("L1").unwrap();
        assert_eq!(line.value(jan(), DemandUnit::Hours, 0), Some(Decimal::from(150)));
        assert_eq!(line.original(jan(), DemandUnit::Hours, 0), Some(Decimal::from(100)));
        assert_eq!(line.rates(0).get(RateKind::ProdRate), Decimal::from(60));
        assert_eq!(line.product_count(), 1);
    }

    #[test]
    fn test_demand_unit_parse() {
        assert_eq!("hours".parse::<DemandUnit>().unwrap(), DemandUnit::Hours);
        assert_eq!("Quantity".parse::<DemandUnit>().unwrap(), DemandUnit::Qty);
        assert!("liters".parse::<DemandUnit>().is_err());
        assert!(!DemandUnit::Pallets.is_editable());
    }
}
