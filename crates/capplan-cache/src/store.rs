//! 模擬資料儲存介面
//!
//! 編輯在會話中累積，儲存時以單一批次送出

use capplan_core::{CapacityEdit, DemandEditEntry, PlanError, Result, SimulationId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 需求編輯儲存批次
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandSaveBatch {
    pub batch_id: Uuid,
    pub simulation_id: SimulationId,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<DemandEditEntry>,
}

impl DemandSaveBatch {
    pub fn new(simulation_id: SimulationId, entries: Vec<DemandEditEntry>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            simulation_id,
            created_at: Utc::now(),
            entries,
        }
    }
}

/// 產能編輯儲存批次
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacitySaveBatch {
    pub batch_id: Uuid,
    pub simulation_id: SimulationId,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<CapacityEdit>,
}

impl CapacitySaveBatch {
    pub fn new(simulation_id: SimulationId, entries: Vec<CapacityEdit>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            simulation_id,
            created_at: Utc::now(),
            entries,
        }
    }
}

/// 外部模擬資料儲存
///
/// 失敗時回傳 `PlanError::Store`，重試由呼叫端決定
pub trait SimulationStore {
    fn save_demand(&mut self, batch: &DemandSaveBatch) -> Result<()>;

    fn save_capacity(&mut self, batch: &CapacitySaveBatch) -> Result<()>;
}

/// 記憶體內的儲存（測試與示範用）
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub demand_batches: Vec<DemandSaveBatch>,
    pub capacity_batches: Vec<CapacitySaveBatch>,

    /// 設置後所有儲存都失敗
    pub fail_with: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：模擬儲存失敗
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<()> {
        match &self.fail_with {
            Some(message) => Err(PlanError::Store(message.clone())),
            None => Ok(()),
        }
    }
}

impl SimulationStore for MemoryStore {
    fn save_demand(&mut self, batch: &DemandSaveBatch) -> Result<()> {
        self.check()?;
        self.demand_batches.push(batch.clone());
        Ok(())
    }

    fn save_capacity(&mut self, batch: &CapacitySaveBatch) -> Result<()> {
        self.check()?;
        self.capacity_batches.push(batch.clone());
        Ok(())
    }
}
