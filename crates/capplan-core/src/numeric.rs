//! 數值工具：捨入規則與安全除法

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// 捨入規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// 四捨五入到整數（.5 遠離零）
    Round,
    /// 無條件進位
    Ceil,
    /// 無條件捨去
    Floor,
    /// 四捨五入到小數點後兩位
    Round2,
}

impl Rounding {
    /// 套用捨入規則
    pub fn apply(self, value: Decimal) -> Decimal {
        match self {
            Rounding::Round => round_half_up(value),
            Rounding::Ceil => value.ceil(),
            Rounding::Floor => value.floor(),
            Rounding::Round2 => {
                value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            }
        }
    }
}

/// 四捨五入到整數
///
/// `Decimal::round` 使用銀行家捨入，這裡固定 .5 遠離零
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// 安全除法：分母為 0 時回傳 0
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// 百分比（四捨五入到整數），任一側為 0 時回傳 0
pub fn rounded_percent(numerator: Decimal, denominator: Decimal) -> Decimal {
    if numerator.is_zero() || denominator.is_zero() {
        return Decimal::ZERO;
    }
    round_half_up(numerator / denominator * Decimal::ONE_HUNDRED)
}

/// 從 JSON 值讀取數值
///
/// 接受數字與數字字串，`null` 或無法解析的值視為缺值
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            if let Some(u) = n.as_u64() {
                return Some(Decimal::from(u));
            }
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
        }
        Value::String(s) => {
            let trimmed = s.trim();
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
        }
        _ => None,
    }
}
