use std::io::{self, Write};

use chrono::{Datelike, Local, NaiveDate};
use polars::prelude::*;
use pump_forecast::{
    ForecastReport, Priority, Scenario, Stage, WorkCalendar, WorkItem,
    calendar::federal_holidays, logging, persistence, validation,
};

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| match col.get(row_idx) {
                    Ok(AnyValue::Null) | Err(_) => String::new(),
                    Ok(AnyValue::String(s)) => s.to_string(),
                    Ok(AnyValue::Float64(v)) => format!("{v:.3}"),
                    Ok(av) => av.to_string(),
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, s) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(s);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(s.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn work_items_dataframe(items: &[WorkItem]) -> PolarsResult<DataFrame> {
    let text = |f: fn(&WorkItem) -> Option<String>| -> Vec<Option<String>> {
        items.iter().map(f).collect()
    };
    let columns: Vec<Column> = vec![
        Series::new(PlSmallStr::from_static("id"), text(|i| Some(i.id.clone()))).into_column(),
        Series::new(PlSmallStr::from_static("model"), text(|i| Some(i.model.clone())))
            .into_column(),
        Series::new(
            PlSmallStr::from_static("stage"),
            text(|i| Some(i.stage.to_string())),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("priority"),
            text(|i| Some(i.priority.as_str().to_string())),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("start_date"),
            text(|i| i.start_date.map(|d| d.to_string())),
        )
        .into_column(),
        Series::new(PlSmallStr::from_static("vendor"), text(|i| i.vendor.clone())).into_column(),
    ];
    DataFrame::new(columns)
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  load <path>                        Load a scenario from JSON\n  save <path>                        Save the scenario to JSON\n  start <YYYY-MM-DD>                 Set the forecast start date\n  add <id> <model> <stage> [priority] [vendor]\n                                     Add or replace a work item\n  remove <id>                        Remove a work item\n  show                               Show work items\n  config                             Show capacity configuration\n  forecast                           Run the forecast and show timelines\n  changes                            Show dates that differ from the last forecast\n  export json|csv <path>             Write the last forecast\n  holidays <year>                    List federal holidays\n  workdays <start> <end>             Count working days in (start, end]\n  quit|exit                          Exit"
    );
}

fn show_items(scenario: &Scenario) {
    match work_items_dataframe(&scenario.work_items) {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error: {}", e),
    }
}

fn show_report(report: &ForecastReport) {
    println!("Forecast ({})", report.summary().to_cli_summary());
    match report.to_dataframe() {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error: {}", e),
    }
    if !report.omitted.is_empty() {
        println!("Omitted: {}", report.omitted.join(", "));
    }
    for deferral in &report.deferrals {
        println!(
            "Deferred {} at {}: {} -> {}",
            deferral.work_item_id, deferral.vendor, deferral.original_start, deferral.new_start
        );
    }
}

fn main() {
    logging::init();

    let mut scenario = Scenario::new(Local::now().date_naive());
    let mut last_report: Option<ForecastReport> = None;

    println!("Pump Forecast (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "load" => match parts.next() {
                Some(path) => match persistence::load_scenario_from_json(path) {
                    Ok(loaded) => {
                        scenario = loaded;
                        last_report = None;
                        println!(
                            "Loaded {} work items starting {}.",
                            scenario.work_items.len(),
                            scenario.start_date
                        );
                    }
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: load <path>"),
            },
            "save" => match parts.next() {
                Some(path) => match persistence::save_scenario_to_json(&scenario, path) {
                    Ok(()) => println!("Scenario saved to {}.", path),
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: save <path>"),
            },
            "start" => match parts.next().and_then(parse_date) {
                Some(date) => {
                    scenario.start_date = date;
                    println!("Start date set to {}.", date);
                }
                None => println!("Usage: start <YYYY-MM-DD>"),
            },
            "add" => {
                let (Some(id), Some(model), Some(stage_s)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    println!("Usage: add <id> <model> <stage> [priority] [vendor]");
                    continue;
                };
                let stage: Stage = match stage_s.parse() {
                    Ok(v) => v,
                    Err(e) => {
                        println!("Error: {}", e);
                        continue;
                    }
                };
                let mut item = WorkItem::new(id, model, stage);
                if let Some(priority_s) = parts.next() {
                    match priority_s.parse::<Priority>() {
                        Ok(priority) => item = item.with_priority(priority),
                        Err(e) => {
                            println!("Error: {}", e);
                            continue;
                        }
                    }
                }
                if let Some(vendor) = parts.next() {
                    item = item.with_vendor(vendor);
                }
                if let Err(e) = validation::validate_work_item(&item) {
                    println!("Error: {}", e);
                    continue;
                }
                scenario.remove_work_item(id);
                scenario.work_items.push(item);
                println!("Work item {} added.", id);
            }
            "remove" => match parts.next() {
                Some(id) if scenario.remove_work_item(id) => println!("Work item {} removed.", id),
                Some(id) => println!("Work item {} not found.", id),
                None => println!("Usage: remove <id>"),
            },
            "show" => show_items(&scenario),
            "config" => match serde_json::to_string_pretty(&scenario.config) {
                Ok(text) => println!("{}", text),
                Err(e) => println!("Error: {}", e),
            },
            "forecast" => {
                let report = scenario.run();
                show_report(&report);
                last_report = Some(report);
            }
            "changes" => match &last_report {
                Some(report) => {
                    let changes = report.date_changes(&scenario.work_items);
                    if changes.is_empty() {
                        println!("No date changes.");
                    }
                    let fmt = |d: Option<NaiveDate>| {
                        d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
                    };
                    for change in changes {
                        println!(
                            "{}: start {} -> {}, end {} -> {}",
                            change.work_item_id,
                            fmt(change.recorded_start),
                            fmt(change.projected_start),
                            fmt(change.recorded_end),
                            fmt(change.projected_end)
                        );
                    }
                }
                None => println!("Run 'forecast' first."),
            },
            "export" => {
                let (Some(format), Some(path)) = (parts.next(), parts.next()) else {
                    println!("Usage: export json|csv <path>");
                    continue;
                };
                let Some(report) = &last_report else {
                    println!("Run 'forecast' first.");
                    continue;
                };
                let result = match format {
                    "json" => persistence::save_report_to_json(report, path),
                    "csv" => persistence::save_timelines_to_csv(report, path),
                    _ => {
                        println!("Usage: export json|csv <path>");
                        continue;
                    }
                };
                match result {
                    Ok(()) => println!("Forecast exported to {}.", path),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "holidays" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                Some(year) => {
                    for date in federal_holidays(year).iter() {
                        println!("{} {}", date, date.format("%A"));
                    }
                }
                None => println!("Usage: holidays <year>"),
            },
            "workdays" => match (
                parts.next().and_then(parse_date),
                parts.next().and_then(parse_date),
            ) {
                (Some(start), Some(end)) => {
                    let calendar = match &scenario.calendar {
                        Some(_) => scenario.work_calendar(),
                        None => WorkCalendar::with_year_range(start.year(), end.year()),
                    };
                    let count = calendar.count_working_days(start, end);
                    println!("{} working days", count);
                }
                _ => println!("Usage: workdays <YYYY-MM-DD> <YYYY-MM-DD>"),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
