//! 模擬身分與中繼資料

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::DateKey;
use crate::{PlanError, Result};

/// 模擬識別碼
///
/// 真實模擬使用其 id，情境基準（by-scenario）以名稱中的空白替換為底線後作為鍵
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationId(String);

impl SimulationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 情境基準名稱轉為鍵
    pub fn by_scenario(name: &str) -> Self {
        Self(name.replace(' ', "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SimulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SimulationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 優化執行狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationStatus {
    #[default]
    NotRun,
    Running,
    Success,
    Fail,
}

impl SimulationStatus {
    /// 狀態說明（顯示給規劃人員）
    pub fn description(&self) -> &'static str {
        match self {
            SimulationStatus::NotRun => "No capacity optimization has run for this exercise yet.",
            SimulationStatus::Running => {
                "Capacity optimization is currently running for this exercise."
            }
            SimulationStatus::Success => "Capacity optimization succeeded for this exercise.",
            SimulationStatus::Fail => {
                "Capacity optimization ran but failed for this exercise. \
                 See the logs for more information."
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SimulationStatus::Success)
    }
}

/// 模擬中繼資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMeta {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub plant: String,
    #[serde(default)]
    pub status: SimulationStatus,
    pub init_date: String,
    pub end_date: String,
    #[serde(default)]
    pub by_scenario: Option<String>,
}

impl SimulationMeta {
    pub fn new(
        plant: impl Into<String>,
        init_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: None,
            plant: plant.into(),
            status: SimulationStatus::NotRun,
            init_date: init_date.into(),
            end_date: end_date.into(),
            by_scenario: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: SimulationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_by_scenario(mut self, by_scenario: impl Into<String>) -> Self {
        self.by_scenario = Some(by_scenario.into());
        self
    }

    /// 模擬的月份區間（首尾皆正規化為月初）
    pub fn window(&self) -> Result<(DateKey, DateKey)> {
        let start = DateKey::parse(&self.init_date)?;
        let end = DateKey::parse(&self.end_date)?;
        if start > end {
            return Err(PlanError::InvalidWindow { start, end });
        }
        Ok((start, end))
    }

    /// 原始起始日（未正規化）
    pub fn init_naive_date(&self) -> Result<NaiveDate> {
        let text: String = self.init_date.chars().take(10).collect();
        NaiveDate::parse_from_str(&text.replace('_', "-"), "%Y-%m-%d")
            .map_err(|_| PlanError::InvalidDate(self.init_date.clone()))
    }

    /// 識別碼：優先使用 id，否則為情境基準名稱
    pub fn simulation_id(&self) -> Option<SimulationId> {
        self.id
            .as_deref()
            .map(SimulationId::new)
            .or_else(|| self.by_scenario.as_deref().map(SimulationId::by_scenario))
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .or_else(|| self.by_scenario.clone())
            .unwrap_or_default()
    }
}
