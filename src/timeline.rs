use crate::work_item::Stage;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// One closed stage occupancy of a work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTimelineBlock {
    pub stage: Stage,
    pub start: NaiveDate,
    /// First working day after the stage quota ran out.
    pub end: NaiveDate,
    /// Working days spent waiting for a free slot in this stage.
    pub paused_days: u32,
    /// Effective working days of progress, fractional for labor stages.
    pub work_days: f64,
}

impl StageTimelineBlock {
    pub(crate) fn shift(&mut self, delta: Duration) {
        self.start = self.start + delta;
        self.end = self.end + delta;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineStatus {
    Complete,
    /// The simulation horizon elapsed first; the blocks are a partial projection.
    HorizonExceeded,
}

impl TimelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineStatus::Complete => "complete",
            TimelineStatus::HorizonExceeded => "horizon_exceeded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub status: TimelineStatus,
    pub blocks: Vec<StageTimelineBlock>,
}

impl Timeline {
    pub fn is_complete(&self) -> bool {
        self.status == TimelineStatus::Complete
    }

    pub fn block(&self, stage: Stage) -> Option<&StageTimelineBlock> {
        self.blocks.iter().find(|block| block.stage == stage)
    }

    pub(crate) fn position(&self, stage: Stage) -> Option<usize> {
        self.blocks.iter().position(|block| block.stage == stage)
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.blocks.first().map(|block| block.start)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.blocks.last().map(|block| block.end)
    }

    /// Stage the item occupies on `date`, if any.
    pub fn stage_on(&self, date: NaiveDate) -> Option<Stage> {
        self.blocks
            .iter()
            .find(|block| block.start <= date && date < block.end)
            .map(|block| block.stage)
    }

    pub fn total_paused_days(&self) -> u32 {
        self.blocks.iter().map(|block| block.paused_days).sum()
    }
}
