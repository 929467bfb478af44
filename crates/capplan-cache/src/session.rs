//! 編輯會話
//!
//! 持有一個模擬的輸入快照與兩個編輯覆蓋層。每次影響報表的變更都會遞增版本，
//! 報表記錄計算時的版本以便呼叫端判斷是否過期。

use capplan_calc::{
    CapacityReport, CapacityReportCalculator, CapacityResolver, ReportInputs, UnitConverter,
    UnitValues,
};
use capplan_core::{
    CapacityEdit, CapacityInputs, CapacityOverlay, DateKey, DemandInputs, DemandOverlay,
    DemandUnit, Granularity, OptimizationInputs, PlanError, RateKind, ReportConfig, Result,
    SimulationId, SimulationMeta,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dirty_tracking::DirtyTracker;
use crate::store::{CapacitySaveBatch, DemandSaveBatch, SimulationStore};

/// 單一模擬的編輯會話
#[derive(Debug, Clone)]
pub struct EditSession {
    meta: SimulationMeta,
    demand: DemandInputs,
    demand_overlay: DemandOverlay,
    capacity: CapacityInputs,
    capacity_overlay: CapacityOverlay,
    optimization: OptimizationInputs,
    config: ReportConfig,
    dirty: DirtyTracker,
    version: u64,
}

impl EditSession {
    /// 創建新的會話
    pub fn new(
        meta: SimulationMeta,
        demand: DemandInputs,
        capacity: CapacityInputs,
        optimization: OptimizationInputs,
        config: ReportConfig,
    ) -> Self {
        Self {
            meta,
            demand,
            demand_overlay: DemandOverlay::new(),
            capacity,
            capacity_overlay: CapacityOverlay::new(),
            optimization,
            config,
            dirty: DirtyTracker::new(),
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn meta(&self) -> &SimulationMeta {
        &self.meta
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn demand(&self) -> &DemandInputs {
        &self.demand
    }

    pub fn demand_overlay(&self) -> &DemandOverlay {
        &self.demand_overlay
    }

    pub fn capacity(&self) -> &CapacityInputs {
        &self.capacity
    }

    pub fn capacity_overlay(&self) -> &CapacityOverlay {
        &self.capacity_overlay
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    /// 是否有未儲存的編輯
    pub fn has_pending_edits(&self) -> bool {
        !self.demand_overlay.is_empty() || !self.capacity_overlay.is_empty()
    }

    fn bump(&mut self) {
        self.version += 1;
        tracing::trace!("會話版本: {}", self.version);
    }

    /// 編輯產品的需求單位值
    pub fn edit_unit(
        &mut self,
        line: &str,
        index: usize,
        date: DateKey,
        unit: DemandUnit,
        value: Decimal,
    ) -> Result<UnitValues> {
        let values = UnitConverter::apply_unit_edit(
            &self.demand,
            &mut self.demand_overlay,
            line,
            index,
            date,
            unit,
            value,
        )?;
        self.dirty.mark_demand(line);
        self.bump();
        Ok(values)
    }

    /// 編輯產品的換算係數，回傳更新的月份數
    pub fn edit_rate(
        &mut self,
        line: &str,
        index: usize,
        kind: RateKind,
        value: Decimal,
    ) -> Result<usize> {
        let updated = UnitConverter::apply_rate_edit(
            &self.demand,
            &mut self.demand_overlay,
            line,
            index,
            kind,
            value,
        )?;
        self.dirty.mark_demand(line);
        self.bump();
        Ok(updated)
    }

    /// 記錄產能編輯；同一 (產線, 月份) 的後到編輯取代先前的
    pub fn edit_capacity(&mut self, edit: CapacityEdit) -> Result<()> {
        if self.capacity.line(&edit.line).is_none() {
            return Err(PlanError::LineNotFound(edit.line));
        }
        self.dirty.mark_capacity(&edit.line);
        self.capacity_overlay.record(edit);
        self.bump();
        Ok(())
    }

    pub fn select_lines(&mut self, lines: Vec<String>) {
        self.config.lines = lines;
        self.bump();
    }

    /// 設置報表區間，無效區間時保持原設置
    pub fn set_window(&mut self, start: Option<DateKey>, end: Option<DateKey>) -> Result<()> {
        let mut candidate = self.config.clone();
        candidate.window_start = start;
        candidate.window_end = end;
        candidate.resolve_window(&self.meta)?;

        self.config = candidate;
        self.bump();
        Ok(())
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.config.granularity = granularity;
        self.bump();
    }

    pub fn set_demand_unit(&mut self, unit: DemandUnit) {
        self.config.demand_unit = unit;
        self.bump();
    }

    fn simulation_id(&self) -> Result<SimulationId> {
        self.meta.simulation_id().ok_or_else(|| {
            PlanError::Store(format!("{} 沒有模擬 id，無法儲存", self.meta.display_name()))
        })
    }

    /// 以單一批次儲存需求編輯
    ///
    /// 成功後編輯併入目前值並清空覆蓋層；失敗時覆蓋層保持不變
    pub fn save_demand(&mut self, store: &mut dyn SimulationStore) -> Result<Uuid> {
        if self.demand_overlay.is_empty() {
            return Err(PlanError::NothingToSave);
        }

        let batch = DemandSaveBatch::new(self.simulation_id()?, self.demand_overlay.to_payload());
        tracing::info!("儲存需求編輯: 批次 {}，{} 筆", batch.batch_id, batch.entries.len());

        if let Err(e) = store.save_demand(&batch) {
            tracing::warn!("需求編輯儲存失敗，保留覆蓋層: {}", e);
            return Err(e);
        }

        self.demand.commit_overlay(&self.demand_overlay);
        self.demand_overlay.clear();
        self.dirty.clear_demand();
        self.bump();
        Ok(batch.batch_id)
    }

    /// 以單一批次儲存產能編輯
    pub fn save_capacity(&mut self, store: &mut dyn SimulationStore) -> Result<Uuid> {
        if self.capacity_overlay.is_empty() {
            return Err(PlanError::NothingToSave);
        }

        let batch =
            CapacitySaveBatch::new(self.simulation_id()?, self.capacity_overlay.to_payload());
        tracing::info!("儲存產能編輯: 批次 {}，{} 筆", batch.batch_id, batch.entries.len());

        if let Err(e) = store.save_capacity(&batch) {
            tracing::warn!("產能編輯儲存失敗，保留覆蓋層: {}", e);
            return Err(e);
        }

        self.capacity = CapacityResolver::apply_overlay(&self.capacity, &self.capacity_overlay);
        self.capacity_overlay.clear();
        self.dirty.clear_capacity();
        self.bump();
        Ok(batch.batch_id)
    }

    /// 捨棄所有未儲存編輯
    pub fn discard(&mut self) {
        if !self.has_pending_edits() {
            return;
        }
        self.demand_overlay.clear();
        self.capacity_overlay.clear();
        self.dirty.clear();
        self.bump();
    }

    /// 以目前版本計算報表
    pub fn report(&self) -> Result<CapacityReport> {
        let inputs = ReportInputs {
            meta: &self.meta,
            demand: &self.demand,
            demand_overlay: &self.demand_overlay,
            capacity: &self.capacity,
            capacity_overlay: &self.capacity_overlay,
            optimization: &self.optimization,
        };
        CapacityReportCalculator::new(self.config.clone()).calculate(&inputs, self.version)
    }
}
