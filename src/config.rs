use crate::work_item::Stage;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOURS_PER_DAY: f64 = 8.0;

fn default_hours_per_day() -> f64 {
    DEFAULT_HOURS_PER_DAY
}

fn default_efficiency() -> f64 {
    1.0
}

/// Labor pool for one capacity-bounded stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCapacity {
    pub employees: u32,
    /// 1.0 means 100 %.
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,
    /// Maximum items worked at once; `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wip: Option<u32>,
}

impl StageCapacity {
    pub fn new(employees: u32, efficiency: f64, max_wip: Option<u32>) -> Self {
        Self {
            employees,
            efficiency,
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            max_wip,
        }
    }

    pub fn daily_man_hours(&self) -> f64 {
        self.employees as f64 * self.hours_per_day * self.efficiency
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowderCoatVendor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Pumps the vendor accepts per Monday-aligned week. Zero means no limit.
    pub max_pumps_per_week: u32,
}

impl PowderCoatVendor {
    pub fn new(id: impl Into<String>, max_pumps_per_week: u32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            max_pumps_per_week,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityConfig {
    pub fabrication: StageCapacity,
    pub assembly: StageCapacity,
    pub ship: StageCapacity,
    pub staging_buffer_days: u32,
    #[serde(default)]
    pub powder_coat_vendors: Vec<PowderCoatVendor>,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            fabrication: StageCapacity::new(4, 1.0, Some(4)),
            assembly: StageCapacity::new(3, 1.0, Some(3)),
            ship: StageCapacity::new(2, 1.0, None),
            staging_buffer_days: 2,
            powder_coat_vendors: Vec::new(),
        }
    }
}

impl CapacityConfig {
    /// Labor pool backing `stage`, if the stage is labor-bound.
    pub fn labor(&self, stage: Stage) -> Option<&StageCapacity> {
        match stage {
            Stage::Fabrication => Some(&self.fabrication),
            Stage::Assembly => Some(&self.assembly),
            Stage::Ship => Some(&self.ship),
            _ => None,
        }
    }

    pub fn daily_man_hours(&self, stage: Stage) -> f64 {
        self.labor(stage).map_or(0.0, StageCapacity::daily_man_hours)
    }

    /// WIP cap for `stage`; buffer and vendor stages are never capped.
    pub fn max_wip(&self, stage: Stage) -> Option<usize> {
        self.labor(stage)
            .and_then(|capacity| capacity.max_wip)
            .map(|wip| wip as usize)
    }

    pub fn vendor(&self, id: &str) -> Option<&PowderCoatVendor> {
        self.powder_coat_vendors.iter().find(|vendor| vendor.id == id)
    }

    /// Weekly intake of the shared pool used by items without a valid vendor.
    pub fn pooled_weekly_capacity(&self) -> u32 {
        self.powder_coat_vendors
            .iter()
            .map(|vendor| vendor.max_pumps_per_week)
            .sum()
    }
}
