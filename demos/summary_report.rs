//! 產能摘要報表示例
//!
//! 執行：`RUST_LOG=debug cargo run --example summary_report`

use capplan::{
    logging, CapacityEdit, CapacityInputs, DateKey, DemandInputs, DemandUnit, EditSession,
    Granularity, MemoryStore, OptimizationInputs, OptimizerOutcome, ProjectionTable, ReportConfig,
    SimulationMeta, SimulationStatus,
};
use rust_decimal::Decimal;
use serde_json::json;

fn print_table(table: &ProjectionTable) {
    println!(
        "{:<34} {:<8} {}  TOTALS",
        "PROJECTION",
        table.label_column.key(),
        table.columns.iter().map(|c| format!("{c:>10}")).collect::<String>()
    );
    for row in &table.rows {
        println!(
            "{:<34} {:<8} {}  {:>8}",
            row.projection,
            row.label,
            row.values.iter().map(|v| format!("{v:>10}")).collect::<String>(),
            row.total
        );
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();
    println!("=== 產能摘要報表示例 ===\n");

    let demand = DemandInputs::from_json(&json!({
        "PKG-01": {
            "IOP_PRODUCT": ["SKU-A", "SKU-B"],
            "PRODRATE": [50, 40],
            "BATCH_SIZE": [100, 80],
            "UNIT_PER_PALLET": [40, 40],
            "OVERHEAD_COST_BY_UNIT": [2, 3],
            "2024_01_01_QTY": [1000, 800],
            "2024_01_01_HOURS": [20, 20],
            "2024_01_01_ORIGINAL_HOURS": [20, 20],
            "2024_02_01_QTY": [1500, 800],
            "2024_02_01_HOURS": [30, 20],
            "2024_02_01_ORIGINAL_HOURS": [25, 20],
            "2024_03_01_QTY": [500, 400],
            "2024_03_01_HOURS": [10, 10],
            "2024_03_01_ORIGINAL_HOURS": [20, 10]
        }
    }))?;

    let capacity = CapacityInputs::from_json(&json!({
        "PKG-01": {
            "DATE": ["2024-01-01", "2024-02-01", "2024-03-01"],
            "PLANNED_CAPACITY_HOURS": [80, 80, 80],
            "OEE": [0.8, 0.8, 0.8],
            "PRODUCTIVE_CAPACITY_HOURS": [64, 64, 64],
            "MIN_SHIFTS": [5, 5, 5],
            "MAX_SHIFTS": [15, 15, 15],
            "HOURS_PER_SHIFT": [8, 8, 8]
        }
    }))?;

    let optimization = OptimizationInputs::from_json(&json!({
        "PKG-01": {
            "DATE": ["2024-02-01"],
            "OPT_CAPACITY_SHIFTS": [9],
            "OPT_CAPACITY_HOURS": [57.6]
        }
    }))?;

    let meta = SimulationMeta::new("MSA", "2024-01-01", "2024-03-01")
        .with_id("SIM-2024-01")
        .with_name("Base plan")
        .with_status(SimulationStatus::Success);

    let outcome = OptimizerOutcome::from_inputs(meta.status, &optimization);
    for message in &outcome.messages {
        println!("優化狀態: {message}");
    }

    let config =
        ReportConfig::new(vec!["PKG-01".to_string()]).with_granularity(Granularity::Quarters);
    let mut session = EditSession::new(meta, demand, capacity, optimization.clone(), config);

    let report = session.report()?;
    println!("\n摘要表（版本 {}）:", report.version);
    print_table(&report.summary);

    // 規劃人員把 3 月 SKU-A 的工時改回 20，並把 3 月 OEE 調到 0.9
    let march = DateKey::parse("2024-03-01")?;
    session.edit_unit("PKG-01", 0, march, DemandUnit::Hours, Decimal::from(20))?;
    session.edit_capacity(CapacityEdit::new("PKG-01", march).with_oee(Decimal::new(9, 1)))?;

    let edited = session.report()?;
    println!("\n編輯後摘要表（版本 {}）:", edited.version);
    print_table(&edited.summary);
    println!("\n負荷圖:");
    for ((date, value), label) in edited
        .load_chart
        .dates
        .iter()
        .zip(&edited.load_chart.values)
        .zip(&edited.load_chart.labels)
    {
        println!("  {date} {label:<16} {value}");
    }
    for warning in &edited.warnings {
        println!("  [{:?}] {} {}", warning.severity, warning.line, warning.message);
    }

    let mut store = MemoryStore::new();
    let demand_batch = session.save_demand(&mut store)?;
    let capacity_batch = session.save_capacity(&mut store)?;
    println!("\n已儲存批次: 需求 {demand_batch}，產能 {capacity_batch}");

    println!("\n班次分配:");
    for (line, rows) in outcome.shift_distribution(&optimization, &["PKG-01".to_string()]) {
        for row in rows {
            println!(
                "  {line} {} 總班次 {} 平日 {}×{} 週六 {}×{} 週日 {}×{} 臨時 {}",
                row.date,
                row.total_shifts,
                row.days.weekdays,
                row.shifts_per_weekday,
                row.days.saturdays,
                row.shifts_per_saturday,
                row.days.sundays,
                row.shifts_per_sunday,
                row.ad_hoc_shifts
            );
        }
    }

    Ok(())
}
