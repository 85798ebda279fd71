use crate::scenario::Scenario;
use crate::validation::{self, ValidationError};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid scenario: {0}")]
    Validation(#[from] ValidationError),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Somewhere a scenario can be kept between runs.
pub trait ScenarioStore {
    fn save_scenario(&self, scenario: &Scenario) -> PersistenceResult<()>;
    fn load_scenario(&self) -> PersistenceResult<Option<Scenario>>;
}

pub fn validate_scenario(scenario: &Scenario) -> PersistenceResult<()> {
    validation::validate_scenario(scenario)?;
    Ok(())
}

pub mod file;

pub use file::{
    JsonScenarioStore, load_scenario_from_json, load_timelines_from_csv, save_report_to_json,
    save_scenario_to_json, save_timelines_to_csv,
};
