use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Position of a work item on the shop floor.
///
/// `Queue` and `Closed` bracket the five production stages; only the production
/// stages consume capacity or appear in a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Queue,
    Fabrication,
    StagedForPowder,
    PowderCoat,
    Assembly,
    Ship,
    Closed,
}

impl Stage {
    /// Canonical production order.
    pub const PRODUCTION: [Stage; 5] = [
        Stage::Fabrication,
        Stage::StagedForPowder,
        Stage::PowderCoat,
        Stage::Assembly,
        Stage::Ship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Queue => "QUEUE",
            Stage::Fabrication => "FABRICATION",
            Stage::StagedForPowder => "STAGED_FOR_POWDER",
            Stage::PowderCoat => "POWDER_COAT",
            Stage::Assembly => "ASSEMBLY",
            Stage::Ship => "SHIP",
            Stage::Closed => "CLOSED",
        }
    }

    /// Production stages still ahead of an item sitting in `self`, current stage included.
    pub fn remaining_production(&self) -> &'static [Stage] {
        match self {
            Stage::Queue | Stage::Fabrication => &Self::PRODUCTION,
            Stage::StagedForPowder => &Self::PRODUCTION[1..],
            Stage::PowderCoat => &Self::PRODUCTION[2..],
            Stage::Assembly => &Self::PRODUCTION[3..],
            Stage::Ship => &Self::PRODUCTION[4..],
            Stage::Closed => &[],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QUEUE" => Ok(Stage::Queue),
            "FABRICATION" => Ok(Stage::Fabrication),
            "STAGED_FOR_POWDER" => Ok(Stage::StagedForPowder),
            "POWDER_COAT" => Ok(Stage::PowderCoat),
            "ASSEMBLY" => Ok(Stage::Assembly),
            "SHIP" => Ok(Stage::Ship),
            "CLOSED" => Ok(Stage::Closed),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Rush,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
            Priority::Rush => "Rush",
            Priority::Urgent => "Urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "rush" => Ok(Priority::Rush),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// A pump order as supplied by the store. The engine never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub model: String,
    pub stage: Stage,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date_received: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub scheduled_end: Option<NaiveDate>,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, model: impl Into<String>, stage: Stage) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            stage,
            priority: Priority::Normal,
            start_date: None,
            date_received: None,
            vendor: None,
            scheduled_end: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_date_received(mut self, date: NaiveDate) -> Self {
        self.date_received = Some(date);
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    /// Tie-break key among equal priorities; undated items sort last.
    pub fn sort_key(&self) -> NaiveDate {
        self.start_date
            .or(self.date_received)
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Accepts `YYYY-MM-DD`, an RFC 3339 timestamp, null, or garbage. Anything that
/// does not parse becomes `None` so one bad record cannot fail a whole load.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(text)) = raw else {
        return Ok(None);
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|ts| ts.date_naive())
    });
    if parsed.is_none() {
        tracing::warn!(value = text, "ignoring malformed date");
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_is_ordinal() {
        assert!(Priority::Low < Priority::Normal);
        assert!(Priority::Normal < Priority::High);
        assert!(Priority::High < Priority::Rush);
        assert!(Priority::Rush < Priority::Urgent);
    }

    #[test]
    fn remaining_production_starts_at_current_stage() {
        assert_eq!(Stage::Queue.remaining_production().len(), 5);
        assert_eq!(
            Stage::PowderCoat.remaining_production(),
            &[Stage::PowderCoat, Stage::Assembly, Stage::Ship]
        );
        assert!(Stage::Closed.remaining_production().is_empty());
    }

    #[test]
    fn malformed_dates_deserialize_as_absent() {
        let item: WorkItem = serde_json::from_str(
            r#"{"id":"P-1","model":"M1","stage":"QUEUE","start_date":"not a date",
                "date_received":"2026-02-03T08:30:00Z"}"#,
        )
        .unwrap();
        assert_eq!(item.start_date, None);
        assert_eq!(item.date_received, NaiveDate::from_ymd_opt(2026, 2, 3));
        assert_eq!(item.priority, Priority::Normal);
    }

    #[test]
    fn undated_items_sort_last() {
        let dated = WorkItem::new("a", "M", Stage::Queue)
            .with_date_received(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        let undated = WorkItem::new("b", "M", Stage::Queue);
        assert!(dated.sort_key() < undated.sort_key());
    }
}
