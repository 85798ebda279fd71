use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-model lead times in working days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadTimes {
    pub fabrication: f64,
    pub powder_coat: f64,
    pub assembly: f64,
    pub ship: f64,
}

/// Per-model labor content in man-hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkHours {
    pub fabrication: f64,
    pub assembly: f64,
    pub ship: f64,
}

/// Model data the forecast needs from the catalog layer.
pub trait Catalog {
    fn lead_times(&self, model: &str) -> Option<LeadTimes>;
    fn work_hours(&self, model: &str) -> Option<WorkHours>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub lead_times: LeadTimes,
    pub work_hours: WorkHours,
}

/// In-memory catalog keyed by model code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog {
    models: BTreeMap<String, ModelSpec>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: impl Into<String>, spec: ModelSpec) {
        self.models.insert(model.into(), spec);
    }

    pub fn with_model(mut self, model: impl Into<String>, spec: ModelSpec) -> Self {
        self.insert(model, spec);
        self
    }

    pub fn get(&self, model: &str) -> Option<&ModelSpec> {
        self.models.get(model)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelSpec)> + '_ {
        self.models.iter().map(|(model, spec)| (model.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Catalog for ModelCatalog {
    fn lead_times(&self, model: &str) -> Option<LeadTimes> {
        self.get(model).map(|spec| spec.lead_times)
    }

    fn work_hours(&self, model: &str) -> Option<WorkHours> {
        self.get(model).map(|spec| spec.work_hours)
    }
}

/// Adapts two lookup closures into a [`Catalog`].
pub struct FnCatalog<L, W> {
    lead_times: L,
    work_hours: W,
}

impl<L, W> FnCatalog<L, W>
where
    L: Fn(&str) -> Option<LeadTimes>,
    W: Fn(&str) -> Option<WorkHours>,
{
    pub fn new(lead_times: L, work_hours: W) -> Self {
        Self {
            lead_times,
            work_hours,
        }
    }
}

impl<L, W> Catalog for FnCatalog<L, W>
where
    L: Fn(&str) -> Option<LeadTimes>,
    W: Fn(&str) -> Option<WorkHours>,
{
    fn lead_times(&self, model: &str) -> Option<LeadTimes> {
        (self.lead_times)(model)
    }

    fn work_hours(&self, model: &str) -> Option<WorkHours> {
        (self.work_hours)(model)
    }
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn lead_times(&self, model: &str) -> Option<LeadTimes> {
        (**self).lead_times(model)
    }

    fn work_hours(&self, model: &str) -> Option<WorkHours> {
        (**self).work_hours(model)
    }
}
