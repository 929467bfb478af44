//! 紀錄正規化與單位換算
//!
//! 編輯值永遠遮蔽儲存值，儲存值本身不會被修改

use capplan_core::numeric::round_half_up;
use capplan_core::{
    safe_div, DateKey, DemandInputs, DemandOverlay, DemandUnit, LineDemand, PlanError,
    ProductRates, RateKind, Result, Rounding,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 取得有效值：有編輯值時用編輯值，否則用原始值，皆缺時為 0
pub fn resolve_value(original: Option<Decimal>, edited: Option<Decimal>) -> Decimal {
    edited.or(original).unwrap_or_default()
}

/// 目前值相對基準值的變化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Above,
    Below,
    Equal,
}

/// 三向比較，無容差；沒有基準值時視為 0
pub fn classify_change(current: Decimal, original: Option<Decimal>) -> ChangeKind {
    let original = original.unwrap_or_default();
    match current.cmp(&original) {
        std::cmp::Ordering::Greater => ChangeKind::Above,
        std::cmp::Ordering::Less => ChangeKind::Below,
        std::cmp::Ordering::Equal => ChangeKind::Equal,
    }
}

/// 需求輸入加上編輯覆蓋層的唯讀視圖
#[derive(Debug, Clone, Copy)]
pub struct DemandView<'a> {
    pub inputs: &'a DemandInputs,
    pub overlay: &'a DemandOverlay,
}

impl<'a> DemandView<'a> {
    pub fn new(inputs: &'a DemandInputs, overlay: &'a DemandOverlay) -> Self {
        Self { inputs, overlay }
    }

    pub fn line(&self, line: &str) -> Option<&'a LineDemand> {
        self.inputs.line(line)
    }

    /// 目前值（編輯值優先）
    pub fn current(&self, line: &str, index: usize, date: DateKey, unit: DemandUnit) -> Decimal {
        let Some(demand) = self.inputs.line(line) else {
            return Decimal::ZERO;
        };
        let edited = demand
            .product_name(index)
            .and_then(|product| self.overlay.edited(line, product, date, unit));
        resolve_value(demand.value(date, unit, index), edited)
    }

    /// 基準值：`ORIGINAL` 序列，缺時為 0（與 `change` 的分類一致）
    pub fn baseline(&self, line: &str, index: usize, date: DateKey, unit: DemandUnit) -> Decimal {
        self.inputs
            .line(line)
            .and_then(|demand| demand.original(date, unit, index))
            .unwrap_or_default()
    }

    /// 目前換算係數（係數編輯優先）
    pub fn rates(&self, line: &str, index: usize) -> ProductRates {
        let Some(demand) = self.inputs.line(line) else {
            return ProductRates::default();
        };
        let mut rates = demand.rates(index);
        if let Some(product) = demand.product_name(index) {
            for kind in RateKind::ALL {
                if let Some(value) = self.overlay.rate(line, product, kind) {
                    rates.set(kind, value);
                }
            }
        }
        rates
    }

    /// 儲存格的變化分類
    pub fn change(&self, line: &str, index: usize, date: DateKey, unit: DemandUnit) -> ChangeKind {
        let original = self
            .inputs
            .line(line)
            .and_then(|demand| demand.original(date, unit, index));
        classify_change(self.current(line, index, date, unit), original)
    }
}

/// 換算運算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOp {
    Multiply,
    Divide,
}

/// 一個儲存格的全部單位值
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitValues {
    pub hours: Decimal,
    pub qty: Decimal,
    pub batches: Decimal,
    pub pallets: Decimal,
    pub absorption: Decimal,
}

impl UnitValues {
    pub fn get(&self, unit: DemandUnit) -> Decimal {
        match unit {
            DemandUnit::Hours => self.hours,
            DemandUnit::Qty => self.qty,
            DemandUnit::Batches => self.batches,
            DemandUnit::Pallets => self.pallets,
            DemandUnit::Absorption => self.absorption,
        }
    }

    pub fn set(&mut self, unit: DemandUnit, value: Decimal) {
        match unit {
            DemandUnit::Hours => self.hours = value,
            DemandUnit::Qty => self.qty = value,
            DemandUnit::Batches => self.batches = value,
            DemandUnit::Pallets => self.pallets = value,
            DemandUnit::Absorption => self.absorption = value,
        }
    }
}

/// 單位換算器
///
/// QTY 為樞紐：
/// - HOURS = round(QTY / PRODRATE)
/// - BATCHES = round2(QTY / BATCH_SIZE)
/// - PALLETS = ceil(QTY / UNIT_PER_PALLET)
/// - ABSORPTION = round(QTY × OVERHEAD_COST_BY_UNIT)
pub struct UnitConverter;

impl UnitConverter {
    /// 套用一次換算，除數為 0 時結果為 0
    pub fn derive_unit(
        value: Decimal,
        rate: Decimal,
        op: ConversionOp,
        rounding: Rounding,
    ) -> Decimal {
        let raw = match op {
            ConversionOp::Multiply => value * rate,
            ConversionOp::Divide => safe_div(value, rate),
        };
        rounding.apply(raw)
    }

    /// 由 QTY 換算出係數對應的單位
    pub fn from_qty(qty: Decimal, kind: RateKind, rate: Decimal) -> Decimal {
        match kind {
            RateKind::ProdRate => {
                Self::derive_unit(qty, rate, ConversionOp::Divide, Rounding::Round)
            }
            RateKind::BatchSize => {
                Self::derive_unit(qty, rate, ConversionOp::Divide, Rounding::Round2)
            }
            RateKind::UnitPerPallet => {
                Self::derive_unit(qty, rate, ConversionOp::Divide, Rounding::Ceil)
            }
            RateKind::OverheadCostByUnit => {
                Self::derive_unit(qty, rate, ConversionOp::Multiply, Rounding::Round)
            }
        }
    }

    /// 由可編輯單位反推 QTY
    pub fn qty_from_unit(
        unit: DemandUnit,
        value: Decimal,
        rates: &ProductRates,
    ) -> Result<Decimal> {
        match unit {
            DemandUnit::Hours => Ok(round_half_up(value * rates.prodrate)),
            DemandUnit::Qty => Ok(value),
            DemandUnit::Batches => Ok(round_half_up(value * rates.batch_size)),
            other => Err(PlanError::NotEditable(other)),
        }
    }

    /// 由 QTY 換算所有單位
    pub fn derive_all(qty: Decimal, rates: &ProductRates) -> UnitValues {
        let mut values = UnitValues {
            qty,
            ..UnitValues::default()
        };
        for kind in RateKind::ALL {
            values.set(kind.target_unit(), Self::from_qty(qty, kind, rates.get(kind)));
        }
        values
    }

    /// 編輯一個可編輯單位
    ///
    /// 編輯值原樣保存，其餘四個單位由樞紐 QTY 重新計算，全部寫入覆蓋層
    pub fn apply_unit_edit(
        inputs: &DemandInputs,
        overlay: &mut DemandOverlay,
        line: &str,
        index: usize,
        date: DateKey,
        unit: DemandUnit,
        value: Decimal,
    ) -> Result<UnitValues> {
        if !unit.is_editable() {
            return Err(PlanError::NotEditable(unit));
        }
        let product = product_of(inputs, line, index)?;

        let rates = DemandView::new(inputs, overlay).rates(line, index);
        let qty = Self::qty_from_unit(unit, value, &rates)?;
        let mut values = Self::derive_all(qty, &rates);
        values.set(unit, value);

        for target in DemandUnit::ALL {
            overlay.set_value(line, product, date, target, values.get(target));
        }

        tracing::debug!("需求編輯: {} {} {} {}={}", line, product, date, unit, value);
        Ok(values)
    }

    /// 編輯換算係數
    ///
    /// 對該產品每個有目標單位序列的月份，以目前 QTY 重新計算目標單位
    pub fn apply_rate_edit(
        inputs: &DemandInputs,
        overlay: &mut DemandOverlay,
        line: &str,
        index: usize,
        kind: RateKind,
        value: Decimal,
    ) -> Result<usize> {
        let product = product_of(inputs, line, index)?;
        let demand = inputs
            .line(line)
            .ok_or_else(|| PlanError::LineNotFound(line.to_string()))?;

        let target = kind.target_unit();
        let updates: Vec<(DateKey, Decimal)> = {
            let view = DemandView::new(inputs, overlay);
            demand
                .dates
                .iter()
                .filter(|date| demand.has_series(**date, target))
                .map(|date| {
                    let qty = view.current(line, index, *date, DemandUnit::Qty);
                    (*date, Self::from_qty(qty, kind, value))
                })
                .collect()
        };

        overlay.set_rate(line, product, kind, value);
        for (date, derived) in &updates {
            overlay.set_value(line, product, *date, target, *derived);
        }

        tracing::debug!(
            "係數編輯: {} {} {}={}，更新 {} 個月份",
            line,
            product,
            kind.key(),
            value,
            updates.len()
        );
        Ok(updates.len())
    }
}

fn product_of<'a>(inputs: &'a DemandInputs, line: &str, index: usize) -> Result<&'a str> {
    inputs
        .line(line)
        .ok_or_else(|| PlanError::LineNotFound(line.to_string()))?
        .product_name(index)
        .ok_or_else(|| PlanError::ProductNotFound {
            line: line.to_string(),
            index,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn jan() -> DateKey {
        DateKey::new(2024, 1).unwrap()
    }

    fn feb() -> DateKey {
        DateKey::new(2024, 2).unwrap()
    }

    fn inputs() -> DemandInputs {
        let line = LineDemand::new(vec!["SKU-A".into()])
            .with_rates(
                0,
                ProductRates::new(
                    Decimal::from(50),
                    Decimal::from(200),
                    Decimal::from(40),
                    Decimal::new(5, 1),
                ),
            )
            .with_value(jan(), DemandUnit::Qty, 0, Decimal::from(1000))
            .with_value(jan(), DemandUnit::Hours, 0, Decimal::from(100))
            .with_original(jan(), DemandUnit::Hours, 0, Decimal::from(100))
            .with_value(feb(), DemandUnit::Qty, 0, Decimal::from(500))
            .with_value(feb(), DemandUnit::Hours, 0, Decimal::from(80))
            .with_original(feb(), DemandUnit::Hours, 0, Decimal::from(80));
        DemandInputs::new().with_line("L1", line)
    }

    #[test]
    fn test_resolve_value() {
        assert_eq!(
            resolve_value(Some(Decimal::from(100)), Some(Decimal::from(150))),
            Decimal::from(150)
        );
        assert_eq!(resolve_value(Some(Decimal::from(100)), None), Decimal::from(100));
        assert_eq!(resolve_value(None, None), Decimal::ZERO);
    }

    #[test]
    fn test_edit_shadows_only_its_cell() {
        let inputs = inputs();
        let mut overlay = DemandOverlay::new();
        overlay.set_value("L1", "SKU-A", jan(), DemandUnit::Hours, Decimal::from(150));
        let view = DemandView::new(&inputs, &overlay);

        assert_eq!(view.current("L1", 0, jan(), DemandUnit::Hours), Decimal::from(150));
        assert_eq!(view.current("L1", 0, feb(), DemandUnit::Hours), Decimal::from(80));
        assert_eq!(view.current("L1", 0, jan(), DemandUnit::Qty), Decimal::from(1000));
        assert_eq!(view.baseline("L1", 0, jan(), DemandUnit::Hours), Decimal::from(100));
        assert_eq!(view.change("L1", 0, jan(), DemandUnit::Hours), ChangeKind::Above);
        assert_eq!(view.current("L9", 0, jan(), DemandUnit::Hours), Decimal::ZERO);
    }

    #[rstest]
    #[case(Decimal::from(1000), RateKind::ProdRate, Decimal::from(50), Decimal::from(20))]
    #[case(Decimal::from(1000), RateKind::ProdRate, Decimal::ZERO, Decimal::ZERO)]
    #[case(Decimal::from(1000), RateKind::BatchSize, Decimal::from(300), Decimal::new(333, 2))]
    #[case(Decimal::from(1000), RateKind::UnitPerPallet, Decimal::from(300), Decimal::from(4))]
    #[case(Decimal::from(1000), RateKind::UnitPerPallet, Decimal::ZERO, Decimal::ZERO)]
    #[case(
        Decimal::from(1001),
        RateKind::OverheadCostByUnit,
        Decimal::new(5, 1),
        Decimal::from(501)
    )]
    fn test_from_qty(
        #[case] qty: Decimal,
        #[case] kind: RateKind,
        #[case] rate: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(UnitConverter::from_qty(qty, kind, rate), expected);
    }

    #[test]
    fn test_hours_round_trip() {
        let rates =
            ProductRates::new(Decimal::from(50), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        let hours =
            UnitConverter::from_qty(Decimal::from(1000), RateKind::ProdRate, rates.prodrate);
        assert_eq!(hours, Decimal::from(20));
        let qty = UnitConverter::qty_from_unit(DemandUnit::Hours, hours, &rates).unwrap();
        assert_eq!(qty, Decimal::from(1000));
    }

    #[test]
    fn test_apply_unit_edit_recomputes_from_qty() {
        let inputs = inputs();
        let mut overlay = DemandOverlay::new();
        let values = UnitConverter::apply_unit_edit(
            &inputs,
            &mut overlay,
            "L1",
            0,
            jan(),
            DemandUnit::Hours,
            Decimal::from(30),
        )
        .unwrap();

        assert_eq!(values.hours, Decimal::from(30));
        assert_eq!(values.qty, Decimal::from(1500));
        assert_eq!(values.batches, Decimal::new(75, 1));
        assert_eq!(values.pallets, Decimal::from(38));
        assert_eq!(values.absorption, Decimal::from(750));

        let view = DemandView::new(&inputs, &overlay);
        assert_eq!(view.current("L1", 0, jan(), DemandUnit::Pallets), Decimal::from(38));
    }

    #[test]
    fn test_pallets_not_editable() {
        let inputs = inputs();
        let mut overlay = DemandOverlay::new();
        let err = UnitConverter::apply_unit_edit(
            &inputs,
            &mut overlay,
            "L1",
            0,
            jan(),
            DemandUnit::Pallets,
            Decimal::ONE,
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::NotEditable(DemandUnit::Pallets)));
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_apply_rate_edit_updates_target_series() {
        let inputs = inputs();
        let mut overlay = DemandOverlay::new();
        let updated = UnitConverter::apply_rate_edit(
            &inputs,
            &mut overlay,
            "L1",
            0,
            RateKind::ProdRate,
            Decimal::from(25),
        )
        .unwrap();
        assert_eq!(updated, 2);

        let view = DemandView::new(&inputs, &overlay);
        assert_eq!(view.current("L1", 0, jan(), DemandUnit::Hours), Decimal::from(40));
        assert_eq!(view.current("L1", 0, feb(), DemandUnit::Hours), Decimal::from(20));
        assert_eq!(view.rates("L1", 0).prodrate, Decimal::from(25));
        assert_eq!(view.change("L1", 0, feb(), DemandUnit::Hours), ChangeKind::Below);
    }

    #[test]
    fn test_classify_without_original() {
        assert_eq!(classify_change(Decimal::from(5), None), ChangeKind::Above);
        assert_eq!(classify_change(Decimal::ZERO, None), ChangeKind::Equal);
    }
}
