//! 模擬比較示例：情境基準 vs 優化後的模擬
//!
//! 執行：`cargo run --example compare_simulations`

use capplan::{
    logging, ComparisonCalculator, ComparisonRequest, DemandUnit, Granularity, ReportConfig,
    SimulationDataset, SimulationMeta, SimulationStatus,
};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    logging::init();
    println!("=== 模擬比較示例 ===\n");

    let baseline_meta =
        SimulationMeta::new("MSA", "2024-01-01", "2024-06-01").with_by_scenario("Budget 2024");
    let simulation_meta = SimulationMeta::new("MSA", "2024-01-01", "2024-06-01")
        .with_id("SIM-77")
        .with_name("Extra shift on PKG-02")
        .with_status(SimulationStatus::Success);

    let baseline = SimulationDataset::from_json(&json!({
        "load": {
            "PKG-01": {
                "DATE": [
                    "2024-01-01", "2024-02-01", "2024-03-01",
                    "2024-04-01", "2024-05-01", "2024-06-01"
                ],
                "HOURS": [120, 130, 110, 140, 150, 90],
                "QTY": [6000, 6500, 5500, 7000, 7500, 4500],
                "ABSORPTION": [12000, 13000, 11000, 14000, 15000, 9000]
            }
        },
        "capacity": {
            "PKG-01": {
                "DATE": [
                    "2024-01-01", "2024-02-01", "2024-03-01",
                    "2024-04-01", "2024-05-01", "2024-06-01"
                ],
                "PRODUCTIVE_CAPACITY_HOURS": [160, 160, 160, 160, 160, 160],
                "OEE": [0.8, 0.8, 0.8, 0.8, 0.8, 0.8],
                "HOURS_PER_SHIFT": [8, 8, 8, 8, 8, 8]
            }
        }
    }))?;

    let simulation = SimulationDataset::from_json(&json!({
        "load": {
            "PKG-01": {
                "DATE": [
                    "2024-01-01", "2024-02-01", "2024-03-01",
                    "2024-04-01", "2024-05-01", "2024-06-01"
                ],
                "HOURS": [125, 135, 115, 145, 155, 95],
                "QTY": [6250, 6750, 5750, 7250, 7750, 4750],
                "ABSORPTION": [12500, 13500, 11500, 14500, 15500, 9500]
            }
        },
        "capacity": {
            "PKG-01": {
                "DATE": [
                    "2024-01-01", "2024-02-01", "2024-03-01",
                    "2024-04-01", "2024-05-01", "2024-06-01"
                ],
                "PRODUCTIVE_CAPACITY_HOURS": [160, 160, 160, 160, 160, 160],
                "OEE": [0.8, 0.8, 0.8, 0.8, 0.8, 0.8],
                "HOURS_PER_SHIFT": [8, 8, 8, 8, 8, 8]
            }
        },
        "optimization": {
            "PKG-01": {
                "DATE": ["2024-04-01", "2024-05-01"],
                "OPT_CAPACITY_SHIFTS": [30, 32]
            }
        },
        "baseline_capacity": [
            {"line": "PKG-01", "date": "2024-06-01", "capacity_hours": 40}
        ]
    }))?;

    let request = ComparisonRequest::new(simulation_meta, baseline_meta);

    let views = [
        (DemandUnit::Hours, Granularity::Quarters),
        (DemandUnit::Qty, Granularity::Months),
    ];
    for (unit, granularity) in views {
        let config = ReportConfig::new(vec!["PKG-01".to_string()])
            .with_demand_unit(unit)
            .with_granularity(granularity);
        let table = ComparisonCalculator::new(config).compare(&request, &simulation, &baseline)?;

        println!("單位 {unit}，粒度 {granularity}:");
        println!(
            "{:<20} {:<24} {}  TOTALS",
            "PROJECTION",
            "EXERCISE",
            table.columns.iter().map(|c| format!("{c:>11}")).collect::<String>()
        );
        for row in &table.rows {
            println!(
                "{:<20} {:<24} {}  {:>8}",
                row.projection,
                row.label,
                row.values.iter().map(|v| format!("{v:>11}")).collect::<String>(),
                row.total
            );
        }
        println!();
    }

    Ok(())
}
