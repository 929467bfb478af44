//! 輸出表格與圖表序列
//!
//! `ProjectionTable` 以列為單位保存，序列化時轉為
//! `欄位 -> 依列索引對齊的陣列` 的欄式結構

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// 標籤欄位名稱
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelColumn {
    /// 單一模擬的摘要表（按產線）
    Line,
    /// 比較表（按演練／模擬）
    Exercise,
}

impl LabelColumn {
    pub fn key(&self) -> &'static str {
        match self {
            LabelColumn::Line => "LINE",
            LabelColumn::Exercise => "EXERCISE",
        }
    }
}

/// 一列投影資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    /// 指標名稱
    pub projection: String,

    /// 產線或演練名稱（含合計列 `TOTAL`）
    pub label: String,

    /// 按時間桶排列的值
    pub values: Vec<Decimal>,

    /// 合計欄
    pub total: Decimal,
}

impl ProjectionRow {
    pub fn new(
        projection: impl Into<String>,
        label: impl Into<String>,
        values: Vec<Decimal>,
        total: Decimal,
    ) -> Self {
        Self {
            projection: projection.into(),
            label: label.into(),
            values,
            total,
        }
    }

    /// 以值加總作為合計
    pub fn summed(
        projection: impl Into<String>,
        label: impl Into<String>,
        values: Vec<Decimal>,
    ) -> Self {
        let total = values.iter().copied().sum();
        Self::new(projection, label, values, total)
    }
}

/// 投影表
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionTable {
    pub label_column: LabelColumn,

    /// 時間桶標籤（欄位順序）
    pub columns: Vec<String>,

    pub rows: Vec<ProjectionRow>,
}

impl ProjectionTable {
    pub fn new(label_column: LabelColumn, columns: Vec<String>) -> Self {
        Self {
            label_column,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ProjectionRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find(&self, projection: &str, label: &str) -> Option<&ProjectionRow> {
        self.rows
            .iter()
            .find(|row| row.projection == projection && row.label == label)
    }

    pub fn find_mut(&mut self, projection: &str, label: &str) -> Option<&mut ProjectionRow> {
        self.rows
            .iter_mut()
            .find(|row| row.projection == projection && row.label == label)
    }

    /// 移除某指標的所有列，回傳移除數量
    pub fn remove_projection(&mut self, projection: &str) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| row.projection != projection);
        before - self.rows.len()
    }

    /// 某個時間桶欄位的所有值（依列順序）
    pub fn column(&self, label: &str) -> Option<Vec<Decimal>> {
        let index = self.columns.iter().position(|c| c == label)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.values.get(index).copied().unwrap_or_default())
                .collect(),
        )
    }

    /// 某指標出現的所有標籤（依列順序）
    pub fn labels_of(&self, projection: &str) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|row| row.projection == projection)
            .map(|row| row.label.as_str())
            .collect()
    }

    pub fn projections(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.projection.as_str()) {
                seen.push(&row.projection);
            }
        }
        seen
    }
}

impl Serialize for ProjectionTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.columns.len()))?;

        let projections: Vec<&str> = self.rows.iter().map(|r| r.projection.as_str()).collect();
        let labels: Vec<&str> = self.rows.iter().map(|r| r.label.as_str()).collect();
        let totals: Vec<Decimal> = self.rows.iter().map(|r| r.total).collect();

        map.serialize_entry("PROJECTION", &projections)?;
        map.serialize_entry(self.label_column.key(), &labels)?;
        map.serialize_entry("TOTALS", &totals)?;

        for (index, column) in self.columns.iter().enumerate() {
            let values: Vec<Decimal> = self
                .rows
                .iter()
                .map(|row| row.values.get(index).copied().unwrap_or_default())
                .collect();
            map.serialize_entry(column, &values)?;
        }

        map.end()
    }
}

/// 圖表序列（長格式：dates/values/labels 依索引對齊）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub dates: Vec<String>,
    pub values: Vec<Decimal>,
    pub labels: Vec<String>,
}

impl ChartSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, date: impl Into<String>, value: Decimal, label: impl Into<String>) {
        self.dates.push(date.into());
        self.values.push(value);
        self.labels.push(label.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 產能圖表：有效產能與理論最小／最大產能
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityChart {
    pub dates: Vec<String>,
    pub productive_capacity: Vec<Decimal>,
    pub min_capacity: Vec<Decimal>,
    pub max_capacity: Vec<Decimal>,
}

impl CapacityChart {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProjectionTable {
        let mut table =
            ProjectionTable::new(LabelColumn::Line, vec!["2024-Q1".into(), "2024-Q2".into()]);
        let values = |a: i64, b: i64| vec![Decimal::from(a), Decimal::from(b)];
        table.push(ProjectionRow::summed("Demand Load (h)", "L1", values(10, 20)));
        table.push(ProjectionRow::summed("Demand Load (h)", "TOTAL", values(10, 20)));
        table.push(ProjectionRow::summed("Initial (h)", "L1", values(5, 5)));
        table
    }

    #[test]
    fn test_columnar_serialization() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["PROJECTION"].as_array().unwrap().len(), 3);
        assert_eq!(json["LINE"][1], "TOTAL");
        assert_eq!(json["TOTALS"][0], serde_json::json!("30"));
        assert_eq!(json["2024-Q2"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_remove_projection_shrinks_columns() {
        let mut table = sample();
        assert_eq!(table.remove_projection("Demand Load (h)"), 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.column("2024-Q1").unwrap(), vec![Decimal::from(5)]);
        assert_eq!(table.projections(), vec!["Initial (h)"]);
    }
}
