use chrono::{Duration, NaiveDate};
use pump_forecast::{
    CapacityConfig, FnCatalog, ForecastEngine, LeadTimes, ModelCatalog, ModelSpec, PowderCoatVendor,
    Priority, Scenario, Stage, StageCapacity, TimelineStatus, WorkHours, WorkItem,
    calendar::week_start, compare_scenarios, forecast::calendar_for_start, run_forecast,
};
use std::collections::BTreeMap;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monday() -> NaiveDate {
    d(2026, 3, 2)
}

fn catalog() -> ModelCatalog {
    ModelCatalog::new().with_model(
        "P100",
        ModelSpec {
            lead_times: LeadTimes {
                fabrication: 2.0,
                powder_coat: 3.0,
                assembly: 2.0,
                ship: 1.0,
            },
            work_hours: WorkHours {
                fabrication: 8.0,
                assembly: 8.0,
                ship: 4.0,
            },
        },
    )
}

fn queued(id: &str) -> WorkItem {
    WorkItem::new(id, "P100", Stage::Queue)
}

#[test]
fn single_item_walks_every_stage() {
    let report = run_forecast(&[queued("A")], &CapacityConfig::default(), &catalog(), monday());
    let timeline = report.timeline("A").unwrap();
    assert_eq!(timeline.status, TimelineStatus::Complete);

    let spans: Vec<(Stage, NaiveDate, NaiveDate)> = timeline
        .blocks
        .iter()
        .map(|block| (block.stage, block.start, block.end))
        .collect();
    assert_eq!(
        spans,
        vec![
            (Stage::Fabrication, d(2026, 3, 2), d(2026, 3, 3)),
            (Stage::StagedForPowder, d(2026, 3, 3), d(2026, 3, 5)),
            (Stage::PowderCoat, d(2026, 3, 5), d(2026, 3, 10)),
            (Stage::Assembly, d(2026, 3, 10), d(2026, 3, 11)),
            (Stage::Ship, d(2026, 3, 11), d(2026, 3, 12)),
        ]
    );
    // 8 h against 32 man-hours a day
    assert!((timeline.blocks[0].work_days - 0.25).abs() < 1e-9);
    assert_eq!(timeline.blocks[2].work_days, 3.0);
}

#[test]
fn active_items_never_exceed_max_wip() {
    let items: Vec<WorkItem> = (0..10).map(|n| queued(&format!("P{n}"))).collect();
    let config = CapacityConfig::default();
    let catalog = catalog();
    let calendar = calendar_for_start(monday());
    let report = ForecastEngine::new(&config, &catalog, &calendar)
        .record_allocations(true)
        .run(&items, monday());

    assert!(!report.allocations.is_empty());
    for allocation in &report.allocations {
        if let Some(limit) = config.max_wip(allocation.stage) {
            assert!(
                allocation.active.len() <= limit,
                "{} had {} active on {}",
                allocation.stage,
                allocation.active.len(),
                allocation.date
            );
        }
    }
    let first_fab = report
        .allocations
        .iter()
        .find(|a| a.stage == Stage::Fabrication)
        .unwrap();
    assert_eq!(first_fab.active.len(), 4);
    assert_eq!(first_fab.paused.len(), 6);
    assert_eq!(report.summary().complete_count, 10);
}

#[test]
fn higher_priority_finishes_no_later() {
    let config = CapacityConfig {
        fabrication: StageCapacity::new(4, 1.0, Some(1)),
        ..CapacityConfig::default()
    };
    let items = vec![
        queued("low").with_priority(Priority::Low),
        queued("urgent").with_priority(Priority::Urgent),
    ];
    let report = run_forecast(&items, &config, &catalog(), monday());

    let urgent = report.timeline("urgent").unwrap();
    let low = report.timeline("low").unwrap();
    assert!(urgent.end().unwrap() < low.end().unwrap());
    assert_eq!(low.blocks[0].paused_days, 1);
    assert_eq!(urgent.blocks[0].paused_days, 0);
}

#[test]
fn earlier_start_finishes_no_later() {
    let config = CapacityConfig::default();
    let early = run_forecast(
        &[queued("A").with_start_date(d(2026, 3, 2))],
        &config,
        &catalog(),
        monday(),
    );
    let late = run_forecast(
        &[queued("A").with_start_date(d(2026, 3, 9))],
        &config,
        &catalog(),
        monday(),
    );
    let early_end = early.timeline("A").and_then(|t| t.end()).unwrap();
    let late_end = late.timeline("A").and_then(|t| t.end()).unwrap();
    assert!(early_end <= late_end);
    assert_eq!(late.timeline("A").and_then(|t| t.start()), Some(d(2026, 3, 9)));
}

#[test]
fn repeated_runs_are_identical() {
    let items: Vec<WorkItem> = (0..6)
        .map(|n| queued(&format!("P{n}")).with_vendor("acme"))
        .collect();
    let config = CapacityConfig {
        powder_coat_vendors: vec![PowderCoatVendor::new("acme", 2)],
        ..CapacityConfig::default()
    };
    let first = run_forecast(&items, &config, &catalog(), monday());
    let second = run_forecast(&items, &config, &catalog(), monday());
    assert_eq!(first, second);
}

#[test]
fn vendor_overflow_defers_to_next_week_and_shifts_downstream() {
    pump_forecast::logging::init_test();
    let config = CapacityConfig {
        powder_coat_vendors: vec![PowderCoatVendor::new("acme", 1)],
        ..CapacityConfig::default()
    };
    let items = vec![
        queued("A").with_vendor("acme"),
        queued("B").with_vendor("acme"),
    ];
    let report = run_forecast(&items, &config, &catalog(), monday());

    assert_eq!(report.deferrals.len(), 1);
    let deferral = &report.deferrals[0];
    assert_eq!(deferral.work_item_id, "B");
    assert_eq!(deferral.vendor, "acme");
    assert_eq!(deferral.original_start, d(2026, 3, 5));
    assert_eq!(deferral.new_start, d(2026, 3, 9));

    let a = report.timeline("A").unwrap();
    let b = report.timeline("B").unwrap();
    assert_eq!(a.block(Stage::PowderCoat).unwrap().start, d(2026, 3, 5));

    let staging = b.block(Stage::StagedForPowder).unwrap();
    assert_eq!(staging.start, d(2026, 3, 3));
    assert_eq!(staging.end, d(2026, 3, 9));
    assert_eq!(staging.work_days, 4.0);

    let delta = Duration::days(4);
    for stage in [Stage::PowderCoat, Stage::Assembly, Stage::Ship] {
        let before = a.block(stage).unwrap();
        let after = b.block(stage).unwrap();
        assert_eq!(after.start, before.start + delta, "{stage} start");
        assert_eq!(after.end - after.start, before.end - before.start, "{stage} span");
    }
    for pair in b.blocks.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
}

#[test]
fn items_already_at_vendor_respect_weekly_quota() {
    let config = CapacityConfig {
        powder_coat_vendors: vec![PowderCoatVendor::new("acme", 1)],
        ..CapacityConfig::default()
    };
    let items = vec![
        WorkItem::new("X", "P100", Stage::PowderCoat).with_vendor("acme"),
        WorkItem::new("Y", "P100", Stage::PowderCoat).with_vendor("acme"),
    ];
    let report = run_forecast(&items, &config, &catalog(), monday());

    assert_eq!(report.deferrals.len(), 1);
    assert_eq!(report.deferrals[0].work_item_id, "Y");

    let x = report.timeline("X").unwrap();
    let x_week = week_start(x.block(Stage::PowderCoat).unwrap().start);
    let y = report.timeline("Y").unwrap();
    let y_week = week_start(y.block(Stage::PowderCoat).unwrap().start);
    assert_eq!(x_week, monday());
    assert_eq!(y_week, d(2026, 3, 9));

    // Y waits staged from the forecast start until its slot opens
    assert_eq!(y.blocks[0].stage, Stage::StagedForPowder);
    assert_eq!(y.blocks[0].start, monday());
    assert_eq!(y.blocks[0].end, d(2026, 3, 9));
}

#[test]
fn vendor_weeks_never_exceed_quota() {
    let config = CapacityConfig {
        powder_coat_vendors: vec![PowderCoatVendor::new("acme", 2)],
        ..CapacityConfig::default()
    };
    let mut items: Vec<WorkItem> = (0..3)
        .map(|n| WorkItem::new(format!("C{n}"), "P100", Stage::PowderCoat).with_vendor("acme"))
        .collect();
    items.extend((0..5).map(|n| queued(&format!("Q{n}")).with_vendor("acme")));
    let report = run_forecast(&items, &config, &catalog(), monday());

    let mut per_week: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for timeline in report.timelines.values() {
        let start = timeline.block(Stage::PowderCoat).unwrap().start;
        *per_week.entry(week_start(start)).or_insert(0) += 1;
    }
    assert!(per_week.values().all(|&count| count <= 2), "{per_week:?}");
}

#[test]
fn equal_priority_contention_goes_to_earliest_date() {
    let config = CapacityConfig {
        fabrication: StageCapacity::new(4, 1.0, Some(1)),
        ..CapacityConfig::default()
    };
    let items = vec![
        queued("late").with_date_received(d(2026, 2, 10)),
        queued("undated"),
        queued("early").with_date_received(d(2026, 2, 1)),
    ];
    let report = run_forecast(&items, &config, &catalog(), monday());

    let fab_paused = |id: &str| report.timeline(id).unwrap().blocks[0].paused_days;
    assert_eq!(fab_paused("early"), 0);
    assert_eq!(fab_paused("late"), 1);
    assert_eq!(fab_paused("undated"), 2);
}

#[test]
fn identical_keys_keep_input_order() {
    let config = CapacityConfig {
        fabrication: StageCapacity::new(4, 1.0, Some(1)),
        ..CapacityConfig::default()
    };
    let received = d(2026, 2, 1);
    let items = vec![
        queued("listed-first").with_date_received(received),
        queued("listed-second").with_date_received(received),
    ];
    let report = run_forecast(&items, &config, &catalog(), monday());

    assert_eq!(report.timeline("listed-first").unwrap().blocks[0].paused_days, 0);
    assert_eq!(report.timeline("listed-second").unwrap().blocks[0].paused_days, 1);
}

#[test]
fn unknown_models_and_closed_items_are_omitted() {
    let items = vec![
        queued("A"),
        WorkItem::new("ghost", "NOPE", Stage::Queue),
        WorkItem::new("done", "P100", Stage::Closed),
    ];
    let report = run_forecast(&items, &CapacityConfig::default(), &catalog(), monday());
    assert_eq!(report.omitted, vec!["ghost".to_string(), "done".to_string()]);
    assert!(report.timeline("ghost").is_none());
    assert_eq!(report.timelines.len(), 1);
}

#[test]
fn item_mid_assembly_only_projects_remaining_stages() {
    let items = vec![WorkItem::new("A", "P100", Stage::Assembly)];
    let report = run_forecast(&items, &CapacityConfig::default(), &catalog(), monday());
    let stages: Vec<Stage> = report
        .timeline("A")
        .unwrap()
        .blocks
        .iter()
        .map(|b| b.stage)
        .collect();
    assert_eq!(stages, vec![Stage::Assembly, Stage::Ship]);
}

#[test]
fn unstaffed_stage_reports_horizon_exceeded() {
    let config = CapacityConfig {
        assembly: StageCapacity::new(0, 1.0, Some(3)),
        ..CapacityConfig::default()
    };
    let report = run_forecast(&[queued("A")], &config, &catalog(), monday());
    assert_eq!(report.incomplete(), vec!["A"]);
    let timeline = report.timeline("A").unwrap();
    assert_eq!(timeline.status, TimelineStatus::HorizonExceeded);
    assert_eq!(timeline.blocks.last().map(|b| b.stage), Some(Stage::PowderCoat));
    assert!(report.summary().latest_finish.is_none());
}

#[test]
fn date_changes_lists_only_moved_items() {
    let mut on_plan = queued("A").with_start_date(monday());
    on_plan.scheduled_end = Some(d(2026, 3, 12));
    let unplanned = queued("B");
    let items = vec![on_plan, unplanned];

    let report = run_forecast(&items, &CapacityConfig::default(), &catalog(), monday());
    let changes = report.date_changes(&items);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].work_item_id, "B");
    assert_eq!(changes[0].recorded_start, None);
    assert_eq!(changes[0].projected_start, Some(monday()));
    assert_eq!(changes[0].projected_end, Some(d(2026, 3, 12)));
}

#[test]
fn dataframe_has_one_row_per_block() {
    let items = vec![queued("A"), WorkItem::new("B", "P100", Stage::Ship)];
    let report = run_forecast(&items, &CapacityConfig::default(), &catalog(), monday());
    let df = report.to_dataframe().unwrap();
    assert_eq!(df.height(), 6);
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(
        names,
        vec!["work_item_id", "stage", "start", "end", "paused_days", "work_days", "status"]
    );
}

#[test]
fn summary_line_mentions_counts_and_finish() {
    let items = vec![queued("A"), WorkItem::new("ghost", "NOPE", Stage::Queue)];
    let report = run_forecast(&items, &CapacityConfig::default(), &catalog(), monday());
    let line = report.summary().to_cli_summary();
    assert_eq!(line, "items=1, complete=1, omitted=1, finish=2026-03-12");
}

#[test]
fn compare_scenarios_keeps_input_order() {
    let mut base = Scenario::new(monday());
    base.catalog = catalog();
    base.work_items = (0..4).map(|n| queued(&format!("P{n}"))).collect();

    let mut short_staffed = base.clone();
    short_staffed.name = "short".into();
    short_staffed.config.fabrication = StageCapacity::new(1, 1.0, Some(1));

    let reports = compare_scenarios(&[base.clone(), short_staffed]);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0], base.run());
    let base_finish = reports[0].summary().latest_finish.unwrap();
    let short_finish = reports[1].summary().latest_finish.unwrap();
    assert!(base_finish <= short_finish);
}

#[test]
fn closure_catalog_matches_model_catalog() {
    let models = catalog();
    let lookup = FnCatalog::new(
        |model: &str| models.get(model).map(|spec| spec.lead_times),
        |model: &str| models.get(model).map(|spec| spec.work_hours),
    );
    let items = vec![queued("A"), queued("B")];
    let config = CapacityConfig::default();
    assert_eq!(
        run_forecast(&items, &config, &lookup, monday()),
        run_forecast(&items, &config, &models, monday())
    );
}
