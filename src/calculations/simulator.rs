use crate::calendar::WorkCalendar;
use crate::config::CapacityConfig;
use crate::requirements::{StageRequirement, UnitKind};
use crate::timeline::{StageTimelineBlock, Timeline, TimelineStatus};
use crate::work_item::{Priority, Stage};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Simulated years after which unfinished items are reported as incomplete.
pub const HORIZON_YEARS: u32 = 5;

/// A work item prepared for simulation.
#[derive(Debug, Clone)]
pub struct SimulationEntry {
    pub id: String,
    pub priority: Priority,
    pub sort_key: NaiveDate,
    pub stage_start: NaiveDate,
    pub requirements: Vec<StageRequirement>,
}

/// How one stage's capacity was split on one working day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAllocation {
    pub date: NaiveDate,
    pub stage: Stage,
    pub active: Vec<String>,
    pub paused: Vec<String>,
    /// Man-hours granted to each active item; zero for day-quota stages.
    pub hours_per_item: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SimulationOutcome {
    pub timelines: BTreeMap<String, Timeline>,
    pub allocations: Vec<DailyAllocation>,
    pub days_simulated: u32,
}

struct WorkItemState {
    id: String,
    priority: Priority,
    sort_key: NaiveDate,
    queue: Vec<StageRequirement>,
    index: usize,
    stage_start: NaiveDate,
    paused_days: u32,
    work_days: f64,
    blocks: Vec<StageTimelineBlock>,
}

impl WorkItemState {
    fn new(entry: SimulationEntry) -> Self {
        let mut state = Self {
            id: entry.id,
            priority: entry.priority,
            sort_key: entry.sort_key,
            queue: entry.requirements,
            index: 0,
            stage_start: entry.stage_start,
            paused_days: 0,
            work_days: 0.0,
            blocks: Vec::new(),
        };
        state.skip_exhausted();
        state
    }

    fn head(&self) -> Option<&StageRequirement> {
        self.queue.get(self.index)
    }

    fn is_finished(&self) -> bool {
        self.index >= self.queue.len()
    }

    fn skip_exhausted(&mut self) {
        while self.head().is_some_and(StageRequirement::is_exhausted) {
            self.index += 1;
        }
    }

    /// Higher priority first, then earlier sort key.
    fn contention_order(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.sort_key.cmp(&other.sort_key))
    }

    fn close_stage(&mut self, stage: Stage, end: NaiveDate) {
        self.blocks.push(StageTimelineBlock {
            stage,
            start: self.stage_start,
            end,
            paused_days: self.paused_days,
            work_days: self.work_days,
        });
        self.index += 1;
        self.skip_exhausted();
        self.paused_days = 0;
        self.work_days = 0.0;
        self.stage_start = end;
    }

    fn into_timeline(self) -> (String, Timeline) {
        let status = if self.is_finished() {
            TimelineStatus::Complete
        } else {
            TimelineStatus::HorizonExceeded
        };
        (
            self.id,
            Timeline {
                status,
                blocks: self.blocks,
            },
        )
    }
}

/// Day-stepped allocation of shared stage capacity across contending work items.
pub struct CapacityForecastSimulator<'a> {
    config: &'a CapacityConfig,
    calendar: &'a WorkCalendar,
    record_allocations: bool,
}

impl<'a> CapacityForecastSimulator<'a> {
    pub fn new(config: &'a CapacityConfig, calendar: &'a WorkCalendar) -> Self {
        Self {
            config,
            calendar,
            record_allocations: false,
        }
    }

    /// Keep a per-day record of active and paused items for every stage.
    pub fn record_allocations(mut self, enabled: bool) -> Self {
        self.record_allocations = enabled;
        self
    }

    #[tracing::instrument(skip_all, fields(items = entries.len(), %start))]
    pub fn execute(&self, start: NaiveDate, entries: Vec<SimulationEntry>) -> SimulationOutcome {
        let mut states: Vec<WorkItemState> = entries
            .into_iter()
            .map(WorkItemState::new)
            .filter(|state| !state.is_finished())
            .collect();
        let horizon = start
            .checked_add_months(Months::new(12 * HORIZON_YEARS))
            .unwrap_or(NaiveDate::MAX);

        let mut outcome = SimulationOutcome::default();
        let mut unfinished = states.len();
        let mut cursor = start;

        while unfinished > 0 && cursor < horizon {
            if self.calendar.is_working_day(cursor) {
                outcome.days_simulated += 1;
                for stage in Stage::PRODUCTION {
                    unfinished -= self.allocate_stage(stage, cursor, &mut states, &mut outcome);
                }
            }
            cursor = match cursor.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        for state in states {
            if !state.is_finished() {
                tracing::warn!(
                    work_item = %state.id,
                    stage = ?state.head().map(|req| req.stage),
                    "work item did not complete within the forecast horizon"
                );
            }
            let (id, timeline) = state.into_timeline();
            outcome.timelines.insert(id, timeline);
        }
        tracing::info!(
            days = outcome.days_simulated,
            timelines = outcome.timelines.len(),
            "capacity simulation finished"
        );
        outcome
    }

    /// Runs one stage for one working day. Returns how many items finished.
    fn allocate_stage(
        &self,
        stage: Stage,
        cursor: NaiveDate,
        states: &mut [WorkItemState],
        outcome: &mut SimulationOutcome,
    ) -> usize {
        let mut selected: Vec<usize> = states
            .iter()
            .enumerate()
            .filter(|(_, state)| {
                state.head().is_some_and(|req| req.stage == stage) && state.stage_start <= cursor
            })
            .map(|(idx, _)| idx)
            .collect();
        if selected.is_empty() {
            return 0;
        }
        // Stable: identical priority and sort key keep input order.
        selected.sort_by(|&a, &b| states[a].contention_order(&states[b]));

        let limit = self
            .config
            .max_wip(stage)
            .unwrap_or(selected.len())
            .min(selected.len());
        let (active, paused) = selected.split_at(limit);

        for &idx in paused {
            states[idx].paused_days += 1;
        }

        let hours_per_item = if active.is_empty() {
            0.0
        } else {
            self.config.daily_man_hours(stage) / active.len() as f64
        };

        let mut finished = 0;
        for &idx in active {
            let state = &mut states[idx];
            let Some(requirement) = state.queue.get_mut(state.index) else {
                continue;
            };
            let progress = match requirement.unit {
                UnitKind::Hours if hours_per_item > 0.0 => {
                    requirement.consume(hours_per_item) / hours_per_item
                }
                UnitKind::Hours => 0.0,
                UnitKind::Days => requirement.consume(1.0),
            };
            state.work_days += progress;

            if requirement.is_exhausted() {
                let end = self.calendar.next_working_day(cursor);
                tracing::debug!(
                    work_item = %state.id,
                    %stage,
                    start = %state.stage_start,
                    %end,
                    paused_days = state.paused_days,
                    "stage complete"
                );
                state.close_stage(stage, end);
                if state.is_finished() {
                    finished += 1;
                }
            }
        }

        if self.record_allocations {
            outcome.allocations.push(DailyAllocation {
                date: cursor,
                stage,
                active: active.iter().map(|&idx| states[idx].id.clone()).collect(),
                paused: paused.iter().map(|&idx| states[idx].id.clone()).collect(),
                hours_per_item,
            });
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageCapacity;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fab_only(id: &str, hours: f64, priority: Priority, start: NaiveDate) -> SimulationEntry {
        SimulationEntry {
            id: id.to_string(),
            priority,
            sort_key: start,
            stage_start: start,
            requirements: vec![StageRequirement::hours(Stage::Fabrication, hours)],
        }
    }

    fn config_with_fab(employees: u32, max_wip: Option<u32>) -> CapacityConfig {
        CapacityConfig {
            fabrication: StageCapacity::new(employees, 1.0, max_wip),
            ..CapacityConfig::default()
        }
    }

    #[test]
    fn single_item_fractional_day() {
        let config = config_with_fab(4, Some(2));
        let calendar = WorkCalendar::with_year_range(2026, 2026);
        let monday = date(2026, 3, 2);
        let outcome = CapacityForecastSimulator::new(&config, &calendar)
            .execute(monday, vec![fab_only("A", 12.0, Priority::Normal, monday)]);

        let timeline = &outcome.timelines["A"];
        assert!(timeline.is_complete());
        let block = &timeline.blocks[0];
        assert_eq!(block.start, monday);
        assert_eq!(block.end, date(2026, 3, 3));
        assert!((block.work_days - 0.375).abs() < 1e-9);
        assert_eq!(block.paused_days, 0);
    }

    #[test]
    fn man_hours_split_evenly_across_active_items() {
        let config = config_with_fab(4, None);
        let calendar = WorkCalendar::with_year_range(2026, 2026);
        let monday = date(2026, 3, 2);
        let outcome = CapacityForecastSimulator::new(&config, &calendar)
            .record_allocations(true)
            .execute(
                monday,
                vec![
                    fab_only("A", 32.0, Priority::Normal, monday),
                    fab_only("B", 32.0, Priority::Normal, monday),
                ],
            );

        // 16 h each per day: both finish on Tuesday, block ends Wednesday
        for id in ["A", "B"] {
            assert_eq!(outcome.timelines[id].blocks[0].end, date(2026, 3, 4));
        }
        assert_eq!(outcome.allocations[0].hours_per_item, 16.0);
    }

    #[test]
    fn paused_items_accrue_paused_days_only() {
        let config = config_with_fab(1, Some(1));
        let calendar = WorkCalendar::with_year_range(2026, 2026);
        let monday = date(2026, 3, 2);
        let outcome = CapacityForecastSimulator::new(&config, &calendar).execute(
            monday,
            vec![
                fab_only("low", 8.0, Priority::Low, monday),
                fab_only("urgent", 8.0, Priority::Urgent, monday),
            ],
        );

        let urgent = &outcome.timelines["urgent"].blocks[0];
        assert_eq!(urgent.end, date(2026, 3, 3));
        assert_eq!(urgent.paused_days, 0);

        let low = &outcome.timelines["low"].blocks[0];
        assert_eq!(low.start, monday);
        assert_eq!(low.end, date(2026, 3, 4));
        assert_eq!(low.paused_days, 1);
        assert!((low.work_days - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_capacity_stops_at_horizon() {
        let config = config_with_fab(0, Some(1));
        let calendar = WorkCalendar::with_year_range(2026, 2031);
        let monday = date(2026, 3, 2);
        let outcome = CapacityForecastSimulator::new(&config, &calendar)
            .execute(monday, vec![fab_only("stuck", 8.0, Priority::Rush, monday)]);

        let timeline = &outcome.timelines["stuck"];
        assert_eq!(timeline.status, TimelineStatus::HorizonExceeded);
        assert!(timeline.blocks.is_empty());
    }

    #[test]
    fn item_waits_for_its_start_date() {
        let config = config_with_fab(4, None);
        let calendar = WorkCalendar::with_year_range(2026, 2026);
        let monday = date(2026, 3, 2);
        let thursday = date(2026, 3, 5);
        let outcome = CapacityForecastSimulator::new(&config, &calendar)
            .execute(monday, vec![fab_only("later", 8.0, Priority::Normal, thursday)]);
        let block = &outcome.timelines["later"].blocks[0];
        assert_eq!(block.start, thursday);
        assert_eq!(block.end, date(2026, 3, 6));
    }
}
