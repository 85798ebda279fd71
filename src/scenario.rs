use crate::calendar::{WorkCalendar, WorkCalendarConfig};
use crate::catalog::ModelCatalog;
use crate::config::CapacityConfig;
use crate::forecast::{ForecastEngine, ForecastReport, calendar_for_start};
use crate::work_item::WorkItem;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Everything one forecast run needs, as stored on disk or sent over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub config: CapacityConfig,
    #[serde(default)]
    pub catalog: ModelCatalog,
    #[serde(default)]
    pub work_items: Vec<WorkItem>,
    /// Replaces the federal-holiday calendar when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<WorkCalendarConfig>,
}

impl Scenario {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            name: String::new(),
            start_date,
            config: CapacityConfig::default(),
            catalog: ModelCatalog::default(),
            work_items: Vec::new(),
            calendar: None,
        }
    }

    pub fn work_calendar(&self) -> WorkCalendar {
        match &self.calendar {
            Some(config) => WorkCalendar::from_config(config),
            None => calendar_for_start(self.start_date),
        }
    }

    pub fn find_work_item(&self, id: &str) -> Option<&WorkItem> {
        self.work_items.iter().find(|item| item.id == id)
    }

    /// Removes the item with `id`; returns whether one was present.
    pub fn remove_work_item(&mut self, id: &str) -> bool {
        let before = self.work_items.len();
        self.work_items.retain(|item| item.id != id);
        self.work_items.len() != before
    }

    pub fn run(&self) -> ForecastReport {
        let calendar = self.work_calendar();
        ForecastEngine::new(&self.config, &self.catalog, &calendar)
            .run(&self.work_items, self.start_date)
    }
}

/// Runs independent what-if scenarios in parallel, preserving input order.
pub fn compare_scenarios(scenarios: &[Scenario]) -> Vec<ForecastReport> {
    scenarios.par_iter().map(Scenario::run).collect()
}
