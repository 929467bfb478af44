//! 月份日期鍵與時間粒度

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{PlanError, Result};

/// 月份日期鍵（永遠是該月一日）
///
/// 顯示格式為 `YYYY-MM-01`，紀錄鍵格式為 `YYYY_MM_01`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// 由年、月創建
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// 由任意日期創建（正規化到該月一日）
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// 解析日期字串
    ///
    /// 接受 `YYYY-MM-DD`、`YYYY_MM_DD` 以及帶時間的 ISO 字串，日一律正規化為 1
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let head: String = trimmed.chars().take(10).collect();
        let normalized = head.replace('_', "-");
        NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
            .map(Self::from_date)
            .map_err(|_| PlanError::InvalidDate(value.to_string()))
    }

    /// 底層日期
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// 所屬季度（1-4）
    pub fn quarter(&self) -> u32 {
        (self.month() - 1) / 3 + 1
    }

    /// 下一個月份（UTC 月份運算，不經過時區）
    pub fn next_month(&self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }

    /// 紀錄鍵編碼 `YYYY_MM_01`
    pub fn record_key(&self) -> String {
        self.0.format("%Y_%m_%d").to_string()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// 時間粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Granularity {
    /// 每月
    #[default]
    #[serde(alias = "Month", alias = "months")]
    Months,
    /// 每季
    #[serde(alias = "Quarter", alias = "quarters")]
    Quarters,
    /// 每年
    #[serde(alias = "Year", alias = "years")]
    Years,
}

impl Granularity {
    /// 圖表標籤用的單位名稱
    pub fn label_unit(&self) -> &'static str {
        match self {
            Granularity::Months => "Months",
            Granularity::Quarters => "Quarters",
            Granularity::Years => "Years",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label_unit())
    }
}

impl FromStr for Granularity {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "month" | "months" => Ok(Granularity::Months),
            "quarter" | "quarters" => Ok(Granularity::Quarters),
            "year" | "years" => Ok(Granularity::Years),
            _ => Err(PlanError::UnknownGranularity(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-01-15")]
    #[case("2024_01_01")]
    #[case("2024-01-01T00:00:00Z")]
    fn test_parse_normalizes_to_first_of_month(#[case] raw: &str) {
        let key = DateKey::parse(raw).unwrap();
        assert_eq!(key, DateKey::new(2024, 1).unwrap());
        assert_eq!(key.to_string(), "2024-01-01");
        assert_eq!(key.record_key(), "2024_01_01");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DateKey::parse("2024-13-01").is_err());
        assert!(DateKey::parse("HOURS").is_err());
    }

    #[test]
    fn test_next_month_crosses_year() {
        let dec = DateKey::new(2024, 12).unwrap();
        assert_eq!(dec.next_month(), DateKey::new(2025, 1));
    }

    #[test]
    fn test_quarter() {
        assert_eq!(DateKey::new(2024, 3).unwrap().quarter(), 1);
        assert_eq!(DateKey::new(2024, 4).unwrap().quarter(), 2);
        assert_eq!(DateKey::new(2024, 9).unwrap().quarter(), 3);
        assert_eq!(DateKey::new(2024, 10).unwrap().quarter(), 4);
    }

    #[test]
    fn test_granularity_from_str() {
        assert_eq!("Quarters".parse::<Granularity>().unwrap(), Granularity::Quarters);
        assert_eq!("year".parse::<Granularity>().unwrap(), Granularity::Years);
        assert!("weeks".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_date_key_serde() {
        let key = DateKey::new(2025, 6).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2025-06-01\"");
        let back: DateKey = serde_json::from_str("\"2025_06_01\"").unwrap();
        assert_eq!(back, key);
    }
}
