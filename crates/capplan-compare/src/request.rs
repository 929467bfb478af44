//! 比較請求與資格檢查

use capplan_core::{PlanError, Result, SimulationId, SimulationMeta, SimulationStatus};

use crate::table::Exercise;

/// 兩個模擬（或情境基準）的比較請求
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRequest {
    pub first: SimulationMeta,
    pub second: SimulationMeta,
}

impl ComparisonRequest {
    pub fn new(first: SimulationMeta, second: SimulationMeta) -> Self {
        Self { first, second }
    }

    /// 比較資格
    ///
    /// 兩者須屬於同一廠區；真實模擬的優化狀態須為成功（情境基準沒有優化狀態）
    pub fn validate(&self) -> Result<(SimulationId, SimulationId)> {
        let first_id = Self::identity(&self.first)?;
        let second_id = Self::identity(&self.second)?;

        if first_id == second_id {
            return Err(PlanError::ComparisonNotAllowed(format!("不能與自身比較: {first_id}")));
        }

        if self.first.plant != self.second.plant {
            return Err(PlanError::ComparisonNotAllowed(format!(
                "廠區不同: {} / {}",
                self.first.plant, self.second.plant
            )));
        }

        for meta in [&self.first, &self.second] {
            if meta.by_scenario.is_none() && meta.status != SimulationStatus::Success {
                return Err(PlanError::ComparisonNotAllowed(format!(
                    "{} 的狀態為 {:?}: {}",
                    meta.display_name(),
                    meta.status,
                    meta.status.description()
                )));
            }
        }

        Ok((first_id, second_id))
    }

    fn identity(meta: &SimulationMeta) -> Result<SimulationId> {
        meta.simulation_id().ok_or_else(|| {
            PlanError::ComparisonNotAllowed(format!("{} 沒有模擬 id", meta.display_name()))
        })
    }

    /// 表中的情境順序：情境基準在前，模擬在後
    ///
    /// 顯示名稱重複時以 id 區分
    pub fn exercises(&self) -> Vec<Exercise> {
        let metas = [&self.first, &self.second];
        let mut exercises: Vec<Exercise> = metas
            .iter()
            .filter_map(|meta| meta.by_scenario.as_deref().map(Exercise::by_scenario))
            .collect();

        for meta in metas.iter().filter(|meta| meta.by_scenario.is_none()) {
            let Some(id) = meta.simulation_id() else {
                continue;
            };
            let name = meta.display_name();
            let name = if exercises.iter().any(|e| e.name == name) {
                id.to_string()
            } else {
                name
            };
            exercises.push(Exercise::simulation(id, name));
        }

        exercises
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulation(id: &str, plant: &str, status: SimulationStatus) -> SimulationMeta {
        SimulationMeta::new(plant, "2024-01-01", "2024-12-01")
            .with_id(id)
            .with_name(format!("Sim {id}"))
            .with_status(status)
    }

    #[test]
    fn test_both_success_same_plant() {
        let request = ComparisonRequest::new(
            simulation("S1", "MSA", SimulationStatus::Success),
            simulation("S2", "MSA", SimulationStatus::Success),
        );
        let (a, b) = request.validate().unwrap();
        assert_eq!(a.as_str(), "S1");
        assert_eq!(b.as_str(), "S2");
    }

    #[test]
    fn test_rejections() {
        let different_plant = ComparisonRequest::new(
            simulation("S1", "MSA", SimulationStatus::Success),
            simulation("S2", "OTHER", SimulationStatus::Success),
        );
        assert!(matches!(different_plant.validate(), Err(PlanError::ComparisonNotAllowed(_))));

        let failed = ComparisonRequest::new(
            simulation("S1", "MSA", SimulationStatus::Success),
            simulation("S2", "MSA", SimulationStatus::Fail),
        );
        assert!(matches!(failed.validate(), Err(PlanError::ComparisonNotAllowed(_))));

        let same = ComparisonRequest::new(
            simulation("S1", "MSA", SimulationStatus::Success),
            simulation("S1", "MSA", SimulationStatus::Success),
        );
        assert!(same.validate().is_err());
    }

    #[test]
    fn test_by_scenario_listed_first() {
        let baseline = SimulationMeta::new("MSA", "2024-01-01", "2024-12-01")
            .with_by_scenario("Base Case");
        let request =
            ComparisonRequest::new(simulation("S7", "MSA", SimulationStatus::Success), baseline);

        assert!(request.validate().is_ok());
        let exercises = request.exercises();
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].id.as_str(), "Base_Case");
        assert!(exercises[0].by_scenario);
        assert_eq!(exercises[1].name, "Sim S7");
    }
}
