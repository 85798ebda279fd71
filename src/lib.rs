pub mod calculations;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod forecast;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod persistence;
pub mod requirements;
pub mod scenario;
pub mod timeline;
pub mod validation;
pub mod work_item;

pub use calculations::{
    CapacityForecastSimulator, DailyAllocation, Deferral, SimulationEntry, SimulationOutcome,
    VendorCapacityLeveler,
};
pub use calendar::{HolidaySet, WorkCalendar, WorkCalendarConfig};
pub use catalog::{Catalog, FnCatalog, LeadTimes, ModelCatalog, ModelSpec, WorkHours};
pub use config::{CapacityConfig, PowderCoatVendor, StageCapacity};
pub use forecast::{DateChange, ForecastEngine, ForecastReport, ForecastSummary, run_forecast};
pub use persistence::{PersistenceError, ScenarioStore};
pub use requirements::{StageRequirement, UnitKind, build_requirements};
pub use scenario::{Scenario, compare_scenarios};
pub use timeline::{StageTimelineBlock, Timeline, TimelineStatus};
pub use validation::ValidationError;
pub use work_item::{Priority, Stage, WorkItem};
