pub mod leveler;
pub mod simulator;

pub use leveler::{Deferral, SHARED_POOL, VendorCapacityLeveler};
pub use simulator::{
    CapacityForecastSimulator, DailyAllocation, HORIZON_YEARS, SimulationEntry, SimulationOutcome,
};
