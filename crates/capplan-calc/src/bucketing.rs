//! 時間分桶

use capplan_core::{DateKey, Granularity, PlanError, Result};

/// 有序的時間桶：標籤 -> 組成月份
///
/// 桶的順序依月份首次出現的順序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateBuckets {
    buckets: Vec<(String, Vec<DateKey>)>,
}

impl DateBuckets {
    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(|(label, _)| label.clone()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&[DateKey]> {
        self.buckets
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, dates)| dates.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DateKey])> {
        self.buckets
            .iter()
            .map(|(label, dates)| (label.as_str(), dates.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// 時間分桶計算器
pub struct BucketingCalculator;

impl BucketingCalculator {
    /// 產生 `start` 到 `end`（含）之間每個月的月初
    ///
    /// 起點晚於終點時回傳空序列
    pub fn month_range(start: DateKey, end: DateKey) -> Vec<DateKey> {
        let mut months = Vec::new();
        let mut current = Some(start);

        while let Some(month) = current {
            if month > end {
                break;
            }
            months.push(month);
            current = month.next_month();
        }

        months
    }

    /// 從日期字串產生月份序列
    pub fn month_range_str(start: &str, end: &str) -> Result<Vec<DateKey>> {
        Ok(Self::month_range(DateKey::parse(start)?, DateKey::parse(end)?))
    }

    /// 月份所屬的桶標籤
    pub fn bucket_label(date: DateKey, granularity: Granularity) -> String {
        match granularity {
            Granularity::Months => date.to_string(),
            Granularity::Quarters => format!("{}-Q{}", date.year(), date.quarter()),
            Granularity::Years => format!("Year {}", date.year()),
        }
    }

    /// 將月份分組到時間桶
    pub fn group_by_bucket(dates: &[DateKey], granularity: Granularity) -> DateBuckets {
        let mut buckets: Vec<(String, Vec<DateKey>)> = Vec::new();

        for date in dates {
            let label = Self::bucket_label(*date, granularity);
            match buckets.iter_mut().find(|(l, _)| *l == label) {
                Some((_, members)) => members.push(*date),
                None => buckets.push((label, vec![*date])),
            }
        }

        DateBuckets { buckets }
    }

    /// 桶在月份軸上的代表日期
    ///
    /// 年 -> 該年一月；季 -> 該季第一個月；月 -> 自身
    pub fn representative_date(label: &str, granularity: Granularity) -> Result<DateKey> {
        let invalid = || PlanError::InvalidDate(label.to_string());

        match granularity {
            Granularity::Months => DateKey::parse(label),
            Granularity::Quarters => {
                let (year, quarter) = label.split_once("-Q").ok_or_else(invalid)?;
                let year: i32 = year.parse().map_err(|_| invalid())?;
                let quarter: u32 = quarter.parse().map_err(|_| invalid())?;
                if !(1..=4).contains(&quarter) {
                    return Err(invalid());
                }
                DateKey::new(year, (quarter - 1) * 3 + 1).ok_or_else(invalid)
            }
            Granularity::Years => {
                let year: i32 = label
                    .strip_prefix("Year ")
                    .ok_or_else(invalid)?
                    .parse()
                    .map_err(|_| invalid())?;
                DateKey::new(year, 1).ok_or_else(invalid)
            }
        }
    }
}
