use crate::catalog::ModelCatalog;
use crate::config::{CapacityConfig, StageCapacity};
use crate::scenario::Scenario;
use crate::work_item::WorkItem;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

pub fn validate_work_item(item: &WorkItem) -> Result<(), ValidationError> {
    if item.id.trim().is_empty() {
        return Err(ValidationError::new("work item requires a non-empty id"));
    }
    if item.model.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "work item {} requires a model code",
            item.id
        )));
    }
    Ok(())
}

pub fn validate_work_items(items: &[WorkItem]) -> Result<(), ValidationError> {
    let mut seen_ids = HashSet::with_capacity(items.len());
    for item in items {
        validate_work_item(item)?;
        if !seen_ids.insert(item.id.as_str()) {
            return Err(ValidationError::new(format!(
                "duplicate work item id {}",
                item.id
            )));
        }
    }
    Ok(())
}

fn validate_stage_capacity(name: &str, capacity: &StageCapacity) -> Result<(), ValidationError> {
    if !non_negative(capacity.efficiency) {
        return Err(ValidationError::new(format!(
            "{name} efficiency must be a non-negative number (got {})",
            capacity.efficiency
        )));
    }
    if !non_negative(capacity.hours_per_day) || capacity.hours_per_day > 24.0 {
        return Err(ValidationError::new(format!(
            "{name} hours_per_day must be between 0 and 24 (got {})",
            capacity.hours_per_day
        )));
    }
    Ok(())
}

pub fn validate_config(config: &CapacityConfig) -> Result<(), ValidationError> {
    validate_stage_capacity("fabrication", &config.fabrication)?;
    validate_stage_capacity("assembly", &config.assembly)?;
    validate_stage_capacity("ship", &config.ship)?;

    let mut vendor_ids = HashSet::with_capacity(config.powder_coat_vendors.len());
    for (idx, vendor) in config.powder_coat_vendors.iter().enumerate() {
        if vendor.id.trim().is_empty() {
            return Err(ValidationError::new(format!(
                "powder coat vendor #{idx} requires a non-empty id"
            )));
        }
        if !vendor_ids.insert(vendor.id.as_str()) {
            return Err(ValidationError::new(format!(
                "duplicate powder coat vendor id {}",
                vendor.id
            )));
        }
    }
    Ok(())
}

pub fn validate_catalog(catalog: &ModelCatalog) -> Result<(), ValidationError> {
    for (model, spec) in catalog.iter() {
        let values = [
            ("lead_times.fabrication", spec.lead_times.fabrication),
            ("lead_times.powder_coat", spec.lead_times.powder_coat),
            ("lead_times.assembly", spec.lead_times.assembly),
            ("lead_times.ship", spec.lead_times.ship),
            ("work_hours.fabrication", spec.work_hours.fabrication),
            ("work_hours.assembly", spec.work_hours.assembly),
            ("work_hours.ship", spec.work_hours.ship),
        ];
        for (field, value) in values {
            if !non_negative(value) {
                return Err(ValidationError::new(format!(
                    "model {model} has invalid {field} {value}"
                )));
            }
        }
    }
    Ok(())
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    validate_config(&scenario.config)?;
    validate_catalog(&scenario.catalog)?;
    validate_work_items(&scenario.work_items)
}
