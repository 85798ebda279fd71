use crate::calculations::{
    CapacityForecastSimulator, DailyAllocation, Deferral, HORIZON_YEARS, SimulationEntry,
    VendorCapacityLeveler,
};
use crate::calendar::WorkCalendar;
use crate::catalog::Catalog;
use crate::config::CapacityConfig;
use crate::requirements::build_requirements;
use crate::timeline::Timeline;
use crate::work_item::WorkItem;
use chrono::{Datelike, NaiveDate};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Calendar covering every year a run starting at `start` can touch.
pub fn calendar_for_start(start: NaiveDate) -> WorkCalendar {
    WorkCalendar::with_year_range(start.year() - 1, start.year() + HORIZON_YEARS as i32 + 1)
}

/// Projects per-item stage timelines for `items` starting at `start`.
pub fn run_forecast<C: Catalog>(
    items: &[WorkItem],
    config: &CapacityConfig,
    catalog: &C,
    start: NaiveDate,
) -> ForecastReport {
    let calendar = calendar_for_start(start);
    ForecastEngine::new(config, catalog, &calendar).run(items, start)
}

pub struct ForecastEngine<'a, C> {
    config: &'a CapacityConfig,
    catalog: &'a C,
    calendar: &'a WorkCalendar,
    record_allocations: bool,
}

impl<'a, C: Catalog> ForecastEngine<'a, C> {
    pub fn new(config: &'a CapacityConfig, catalog: &'a C, calendar: &'a WorkCalendar) -> Self {
        Self {
            config,
            catalog,
            calendar,
            record_allocations: false,
        }
    }

    pub fn record_allocations(mut self, enabled: bool) -> Self {
        self.record_allocations = enabled;
        self
    }

    /// Items whose model is missing from the catalog, or that have nothing left
    /// to do, are left out of the timelines and listed in `omitted`.
    pub fn run(&self, items: &[WorkItem], start: NaiveDate) -> ForecastReport {
        let mut entries = Vec::with_capacity(items.len());
        let mut omitted = Vec::new();

        for item in items {
            let (Some(lead_times), Some(work_hours)) = (
                self.catalog.lead_times(&item.model),
                self.catalog.work_hours(&item.model),
            ) else {
                tracing::warn!(work_item = %item.id, model = %item.model, "no catalog data for model");
                omitted.push(item.id.clone());
                continue;
            };
            let requirements = build_requirements(
                item.stage,
                &lead_times,
                &work_hours,
                self.config.staging_buffer_days,
            );
            if requirements.is_empty() {
                omitted.push(item.id.clone());
                continue;
            }
            entries.push(SimulationEntry {
                id: item.id.clone(),
                priority: item.priority,
                sort_key: item.sort_key(),
                stage_start: item.start_date.unwrap_or(start),
                requirements,
            });
        }

        let outcome = CapacityForecastSimulator::new(self.config, self.calendar)
            .record_allocations(self.record_allocations)
            .execute(start, entries);
        let mut timelines = outcome.timelines;
        let deferrals =
            VendorCapacityLeveler::new(self.config, self.calendar).execute(items, &mut timelines);

        ForecastReport {
            start_date: start,
            timelines,
            omitted,
            deferrals,
            allocations: outcome.allocations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub start_date: NaiveDate,
    pub timelines: BTreeMap<String, Timeline>,
    /// Items left out for missing catalog data or an empty requirement list.
    pub omitted: Vec<String>,
    pub deferrals: Vec<Deferral>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocations: Vec<DailyAllocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub item_count: usize,
    pub complete_count: usize,
    pub incomplete_count: usize,
    pub omitted_count: usize,
    pub deferred_count: usize,
    pub latest_finish: Option<NaiveDate>,
}

impl ForecastSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("items={}", self.item_count));
        parts.push(format!("complete={}", self.complete_count));
        if self.incomplete_count > 0 {
            parts.push(format!("incomplete={}", self.incomplete_count));
        }
        if self.omitted_count > 0 {
            parts.push(format!("omitted={}", self.omitted_count));
        }
        if self.deferred_count > 0 {
            parts.push(format!("deferred={}", self.deferred_count));
        }
        if let Some(date) = self.latest_finish {
            parts.push(format!("finish={}", date));
        }
        parts.join(", ")
    }
}

/// Recorded dates that differ from the projection for one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateChange {
    pub work_item_id: String,
    pub recorded_start: Option<NaiveDate>,
    pub projected_start: Option<NaiveDate>,
    pub recorded_end: Option<NaiveDate>,
    pub projected_end: Option<NaiveDate>,
}

impl ForecastReport {
    pub fn timeline(&self, work_item_id: &str) -> Option<&Timeline> {
        self.timelines.get(work_item_id)
    }

    /// Ids whose projection ran past the horizon.
    pub fn incomplete(&self) -> Vec<&str> {
        self.timelines
            .iter()
            .filter(|(_, timeline)| !timeline.is_complete())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn summary(&self) -> ForecastSummary {
        let complete_count = self
            .timelines
            .values()
            .filter(|timeline| timeline.is_complete())
            .count();
        ForecastSummary {
            item_count: self.timelines.len(),
            complete_count,
            incomplete_count: self.timelines.len() - complete_count,
            omitted_count: self.omitted.len(),
            deferred_count: self.deferrals.len(),
            latest_finish: self
                .timelines
                .values()
                .filter(|timeline| timeline.is_complete())
                .filter_map(Timeline::end)
                .max(),
        }
    }

    /// Items whose projected start or end differs from what the store holds,
    /// so callers write back only what changed.
    pub fn date_changes(&self, items: &[WorkItem]) -> Vec<DateChange> {
        items
            .iter()
            .filter_map(|item| {
                let timeline = self.timelines.get(&item.id)?;
                let projected_start = timeline.start();
                let projected_end = timeline.end();
                if projected_start == item.start_date && projected_end == item.scheduled_end {
                    return None;
                }
                Some(DateChange {
                    work_item_id: item.id.clone(),
                    recorded_start: item.start_date,
                    projected_start,
                    recorded_end: item.scheduled_end,
                    projected_end,
                })
            })
            .collect()
    }

    /// One row per timeline block.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let rows: Vec<(&str, &Timeline, usize)> = self
            .timelines
            .iter()
            .flat_map(|(id, timeline)| {
                (0..timeline.blocks.len()).map(move |idx| (id.as_str(), timeline, idx))
            })
            .collect();

        let ids: Vec<&str> = rows.iter().map(|(id, _, _)| *id).collect();
        let stages: Vec<&str> = rows
            .iter()
            .map(|(_, timeline, idx)| timeline.blocks[*idx].stage.as_str())
            .collect();
        let starts: Vec<i32> = rows
            .iter()
            .map(|(_, timeline, idx)| date_to_i32(timeline.blocks[*idx].start))
            .collect();
        let ends: Vec<i32> = rows
            .iter()
            .map(|(_, timeline, idx)| date_to_i32(timeline.blocks[*idx].end))
            .collect();
        let paused: Vec<i64> = rows
            .iter()
            .map(|(_, timeline, idx)| timeline.blocks[*idx].paused_days as i64)
            .collect();
        let work_days: Vec<f64> = rows
            .iter()
            .map(|(_, timeline, idx)| timeline.blocks[*idx].work_days)
            .collect();
        let statuses: Vec<&str> = rows
            .iter()
            .map(|(_, timeline, _)| timeline.status.as_str())
            .collect();

        let columns: Vec<Column> = vec![
            Series::new(PlSmallStr::from_static("work_item_id"), ids).into_column(),
            Series::new(PlSmallStr::from_static("stage"), stages).into_column(),
            Series::new(PlSmallStr::from_static("start"), starts)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new(PlSmallStr::from_static("end"), ends)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new(PlSmallStr::from_static("paused_days"), paused).into_column(),
            Series::new(PlSmallStr::from_static("work_days"), work_days).into_column(),
            Series::new(PlSmallStr::from_static("status"), statuses).into_column(),
        ];
        DataFrame::new(columns)
    }
}

/// Days from 0001-01-01 (CE) to 1970-01-01, the polars `Date` epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_to_i32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}
