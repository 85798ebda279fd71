use crate::calendar::{WorkCalendar, week_start};
use crate::config::CapacityConfig;
use crate::timeline::{StageTimelineBlock, Timeline};
use crate::work_item::{Stage, WorkItem};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket key for items without a valid vendor assignment.
pub const SHARED_POOL: &str = "__shared_pool__";

/// A powder-coat intake pushed into a later week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deferral {
    pub work_item_id: String,
    pub vendor: String,
    pub original_start: NaiveDate,
    pub new_start: NaiveDate,
}

impl Deferral {
    pub fn weeks(&self) -> i64 {
        (week_start(self.new_start) - week_start(self.original_start)).num_weeks()
    }
}

/// Per-vendor weekly intake commitments, keyed by Monday.
#[derive(Debug, Default)]
struct WeeklyLedger {
    weeks: BTreeMap<String, BTreeMap<NaiveDate, u32>>,
}

impl WeeklyLedger {
    fn committed(&self, vendor: &str, week: NaiveDate) -> u32 {
        self.weeks
            .get(vendor)
            .and_then(|weeks| weeks.get(&week))
            .copied()
            .unwrap_or(0)
    }

    fn commit(&mut self, vendor: &str, week: NaiveDate) {
        *self
            .weeks
            .entry(vendor.to_string())
            .or_default()
            .entry(week)
            .or_insert(0) += 1;
    }

    /// First week at or after `from` with room under `capacity`.
    fn first_open_week(&self, vendor: &str, from: NaiveDate, capacity: u32) -> NaiveDate {
        let mut week = from;
        while self.committed(vendor, week) >= capacity {
            week = week + Duration::weeks(1);
        }
        week
    }
}

/// Defers powder-coat intake so no vendor exceeds its weekly pump quota.
pub struct VendorCapacityLeveler<'a> {
    config: &'a CapacityConfig,
    calendar: &'a WorkCalendar,
}

impl<'a> VendorCapacityLeveler<'a> {
    pub fn new(config: &'a CapacityConfig, calendar: &'a WorkCalendar) -> Self {
        Self { config, calendar }
    }

    /// Resolved vendor bucket and its weekly capacity.
    fn resolve_vendor(&self, item: &WorkItem) -> (String, u32) {
        match item.vendor.as_deref().and_then(|id| self.config.vendor(id)) {
            Some(vendor) => (vendor.id.clone(), vendor.max_pumps_per_week),
            None => (
                SHARED_POOL.to_string(),
                self.config.pooled_weekly_capacity(),
            ),
        }
    }

    /// Levels `timelines` in place and returns the deferrals applied.
    ///
    /// A deferred powder coat starts on the first working day of its new week.
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    pub fn execute(
        &self,
        items: &[WorkItem],
        timelines: &mut BTreeMap<String, Timeline>,
    ) -> Vec<Deferral> {
        let mut candidates: Vec<(&WorkItem, NaiveDate)> = items
            .iter()
            .filter_map(|item| {
                let block = timelines.get(&item.id)?.block(Stage::PowderCoat)?;
                Some((item, block.start))
            })
            .collect();
        candidates.sort_by_key(|(_, start)| *start);

        let mut ledger = WeeklyLedger::default();
        let mut deferrals = Vec::new();

        for (item, original_start) in candidates {
            let (vendor, capacity) = self.resolve_vendor(item);
            let original_week = week_start(original_start);

            if capacity == 0 {
                ledger.commit(&vendor, original_week);
                continue;
            }

            let week = ledger.first_open_week(&vendor, original_week, capacity);
            ledger.commit(&vendor, week);
            if week == original_week {
                continue;
            }

            let new_start = self.calendar.working_day_on_or_after(week);
            if let Some(timeline) = timelines.get_mut(&item.id) {
                self.defer(timeline, original_start, new_start);
            }
            tracing::debug!(
                work_item = %item.id,
                %vendor,
                from = %original_start,
                to = %new_start,
                "powder coat deferred"
            );
            deferrals.push(Deferral {
                work_item_id: item.id.clone(),
                vendor,
                original_start,
                new_start,
            });
        }

        if !deferrals.is_empty() {
            tracing::info!(deferred = deferrals.len(), "vendor leveling applied");
        }
        deferrals
    }

    /// Stretches staging up to `new_start` and shifts powder coat onward by the same delta.
    fn defer(&self, timeline: &mut Timeline, original_start: NaiveDate, new_start: NaiveDate) {
        let Some(position) = timeline.position(Stage::PowderCoat) else {
            return;
        };
        let delta = new_start - original_start;

        let staging_idx = match position
            .checked_sub(1)
            .filter(|&idx| timeline.blocks[idx].stage == Stage::StagedForPowder)
        {
            Some(idx) => idx,
            None => {
                // No buffer configured: the item still waits staged for the vendor.
                timeline.blocks.insert(
                    position,
                    StageTimelineBlock {
                        stage: Stage::StagedForPowder,
                        start: original_start,
                        end: original_start,
                        paused_days: 0,
                        work_days: 0.0,
                    },
                );
                position
            }
        };

        let staging = &mut timeline.blocks[staging_idx];
        staging.end = new_start;
        staging.work_days = self.calendar.count_working_days(staging.start, new_start) as f64;

        for block in &mut timeline.blocks[staging_idx + 1..] {
            block.shift(delta);
        }
    }
}
