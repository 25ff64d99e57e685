//! Company-wide working hours and the people we schedule for.

use anyhow::{bail, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Global working-hours window. All simulation is bounded to
/// `[start_hour, end_hour)` of each local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    /// The viewer's calendar. Hour-of-day and date keys are computed here.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

fn default_timezone() -> Tz {
    Tz::UTC
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            start_hour: 10,
            end_hour: 19,
            timezone: Tz::UTC,
        }
    }
}

impl CompanyConfig {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
            timezone: Tz::UTC,
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.end_hour > 24 {
            bail!("end_hour must be <= 24 (got {})", self.end_hour);
        }
        if self.start_hour >= self.end_hour {
            bail!(
                "start_hour must be before end_hour (got {}..{})",
                self.start_hour,
                self.end_hour
            );
        }
        Ok(())
    }

    pub fn day_start(&self) -> f64 {
        f64::from(self.start_hour)
    }

    pub fn day_end(&self) -> f64 {
        f64::from(self.end_hour)
    }
}

/// A schedulable person. Only `id` matters to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub manager_id: Option<String>,
}

impl Employee {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            designation: String::new(),
            manager_id: None,
        }
    }
}
