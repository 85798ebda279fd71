use crate::catalog::{LeadTimes, WorkHours};
use crate::work_item::Stage;
use serde::{Deserialize, Serialize};

/// Quotas at or below this are treated as exhausted.
pub(crate) const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Man-hours drawn from the stage's shared labor pool.
    Hours,
    /// Whole calendar-working days, independent of contention.
    Days,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRequirement {
    pub stage: Stage,
    pub unit: UnitKind,
    pub remaining: f64,
}

impl StageRequirement {
    pub fn hours(stage: Stage, hours: f64) -> Self {
        Self {
            stage,
            unit: UnitKind::Hours,
            remaining: hours,
        }
    }

    pub fn days(stage: Stage, days: u32) -> Self {
        Self {
            stage,
            unit: UnitKind::Days,
            remaining: days as f64,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_nan() || self.remaining <= EPSILON
    }

    /// Subtracts `amount`, clamping at zero. Returns the amount actually consumed.
    pub(crate) fn consume(&mut self, amount: f64) -> f64 {
        let used = amount.min(self.remaining).max(0.0);
        self.remaining = (self.remaining - amount).max(0.0);
        if self.remaining <= EPSILON {
            self.remaining = 0.0;
        }
        used
    }
}

/// Ordered requirements for an item sitting in `current`, skipping zero quotas.
pub fn build_requirements(
    current: Stage,
    lead_times: &LeadTimes,
    work_hours: &WorkHours,
    staging_buffer_days: u32,
) -> Vec<StageRequirement> {
    current
        .remaining_production()
        .iter()
        .map(|stage| match stage {
            Stage::Fabrication => StageRequirement::hours(*stage, work_hours.fabrication),
            Stage::StagedForPowder => StageRequirement::days(*stage, staging_buffer_days),
            Stage::PowderCoat => {
                StageRequirement::days(*stage, whole_days(lead_times.powder_coat))
            }
            Stage::Assembly => StageRequirement::hours(*stage, work_hours.assembly),
            _ => StageRequirement::hours(*stage, work_hours.ship),
        })
        .filter(|requirement| !requirement.is_exhausted())
        .collect()
}

fn whole_days(days: f64) -> u32 {
    if days.is_finite() && days > 0.0 {
        days.ceil() as u32
    } else {
        0
    }
}
