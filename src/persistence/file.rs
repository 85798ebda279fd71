use super::{PersistenceError, PersistenceResult, ScenarioStore};
use crate::{
    forecast::ForecastReport,
    scenario::Scenario,
    timeline::{StageTimelineBlock, Timeline, TimelineStatus},
    work_item::Stage,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub fn save_scenario_to_json<P: AsRef<Path>>(
    scenario: &Scenario,
    path: P,
) -> PersistenceResult<()> {
    super::validate_scenario(scenario)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, scenario)?;
    Ok(())
}

pub fn load_scenario_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Scenario> {
    let file = File::open(path)?;
    let scenario: Scenario = serde_json::from_reader(file)?;
    super::validate_scenario(&scenario)?;
    Ok(scenario)
}

pub fn save_report_to_json<P: AsRef<Path>>(
    report: &ForecastReport,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

/// Keeps a single scenario in a JSON file.
pub struct JsonScenarioStore {
    path: PathBuf,
}

impl JsonScenarioStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl ScenarioStore for JsonScenarioStore {
    fn save_scenario(&self, scenario: &Scenario) -> PersistenceResult<()> {
        save_scenario_to_json(scenario, &self.path)
    }

    fn load_scenario(&self) -> PersistenceResult<Option<Scenario>> {
        match load_scenario_from_json(&self.path) {
            Ok(scenario) => Ok(Some(scenario)),
            Err(PersistenceError::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TimelineCsvRecord {
    work_item_id: String,
    status: String,
    stage: String,
    start: String,
    end: String,
    paused_days: u32,
    work_days: f64,
}

impl TimelineCsvRecord {
    fn new(work_item_id: &str, status: TimelineStatus, block: &StageTimelineBlock) -> Self {
        Self {
            work_item_id: work_item_id.to_string(),
            status: status.as_str().to_string(),
            stage: block.stage.as_str().to_string(),
            start: format_date(block.start),
            end: format_date(block.end),
            paused_days: block.paused_days,
            work_days: block.work_days,
        }
    }

    fn into_block(self) -> PersistenceResult<(String, TimelineStatus, StageTimelineBlock)> {
        let stage = self
            .stage
            .parse::<Stage>()
            .map_err(PersistenceError::InvalidData)?;
        let status = parse_status(&self.status)?;
        let block = StageTimelineBlock {
            stage,
            start: parse_date(&self.start)?,
            end: parse_date(&self.end)?,
            paused_days: self.paused_days,
            work_days: self.work_days,
        };
        Ok((self.work_item_id, status, block))
    }
}

/// Writes one row per block. Items with no blocks yet get no rows.
pub fn save_timelines_to_csv<P: AsRef<Path>>(
    report: &ForecastReport,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for (id, timeline) in &report.timelines {
        for block in &timeline.blocks {
            writer.serialize(TimelineCsvRecord::new(id, timeline.status, block))?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn load_timelines_from_csv<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<BTreeMap<String, Timeline>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut timelines: BTreeMap<String, Timeline> = BTreeMap::new();
    for record in reader.deserialize::<TimelineCsvRecord>() {
        let (id, status, block) = record?.into_block()?;
        timelines
            .entry(id)
            .or_insert_with(|| Timeline {
                status,
                blocks: Vec::new(),
            })
            .blocks
            .push(block);
    }
    Ok(timelines)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_status(input: &str) -> PersistenceResult<TimelineStatus> {
    match input.trim() {
        "complete" => Ok(TimelineStatus::Complete),
        "horizon_exceeded" => Ok(TimelineStatus::HorizonExceeded),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid timeline status '{other}'"
        ))),
    }
}
