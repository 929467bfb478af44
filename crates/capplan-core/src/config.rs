//! 報表配置模型

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calendar::{DateKey, Granularity};
use crate::demand::DemandUnit;
use crate::simulation::SimulationMeta;
use crate::{PlanError, Result};

/// 報表計算配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 選取的產線（決定輸出順序）
    #[serde(default)]
    pub lines: Vec<String>,

    /// 時間粒度
    #[serde(default)]
    pub granularity: Granularity,

    /// 圖表、摘要表與比較表使用的需求單位
    #[serde(default)]
    pub demand_unit: DemandUnit,

    /// 區間起點（預設為模擬起始月）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start: Option<DateKey>,

    /// 區間終點（預設為模擬結束月）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end: Option<DateKey>,
}

impl ReportConfig {
    /// 創建新的報表配置
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    /// 建構器模式：設置時間粒度
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// 建構器模式：設置需求單位
    pub fn with_demand_unit(mut self, unit: DemandUnit) -> Self {
        self.demand_unit = unit;
        self
    }

    /// 建構器模式：設置區間
    pub fn with_window(mut self, start: DateKey, end: DateKey) -> Self {
        self.window_start = Some(start);
        self.window_end = Some(end);
        self
    }

    /// 從 JSON 文件載入
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// 從 JSON 字串載入
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 是否選取了某條產線
    pub fn includes_line(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l == line)
    }

    /// 決定實際計算的月份區間
    ///
    /// 未設置的端點沿用模擬區間；設置的端點會被限制在模擬區間內
    pub fn resolve_window(&self, meta: &SimulationMeta) -> Result<(DateKey, DateKey)> {
        let (sim_start, sim_end) = meta.window()?;

        let start = self.window_start.map_or(sim_start, |s| s.max(sim_start));
        let end = self.window_end.map_or(sim_end, |e| e.min(sim_end));

        if start > end {
            return Err(PlanError::InvalidWindow { start, end });
        }
        Ok((start, end))
    }
}
