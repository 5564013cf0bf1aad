use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classifier::ActivityKind;
use crate::error::{Result, WorklogError};
use crate::time_utils::is_admissible_date_key;

/// One decoded input row of the activity log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Calendar-day key, kept as written in the export.
    pub date: String,
    /// Employee name; may be empty.
    pub employee: String,
    pub role: String,
    pub program: String,
    /// Free-text activity label, classified by [`ActivityKind::classify`].
    pub activity_type: String,
    /// Project name; may be empty.
    pub project: String,
    pub hours: f64,
    pub sessions: f64,
}

impl RawRecord {
    /// Whether this record carries a usable date key.
    pub fn is_admitted(&self) -> bool {
        is_admissible_date_key(&self.date)
    }

    /// Activity bucket of this record.
    pub fn kind(&self) -> ActivityKind {
        ActivityKind::classify(&self.activity_type)
    }
}

/// Hours per activity bucket for one date, optionally scoped to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: String,
    pub work: f64,
    pub comm: f64,
    pub other: f64,
    /// Running sum of the three buckets.
    pub total: f64,
    /// Distinct employees active in this project/date, in first-seen order.
    /// Only set on project-scoped buckets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<Vec<String>>,
    /// Number of distinct employees active on this date.
    /// Only set on the global daily series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_users: Option<usize>,
}

impl DailyStats {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            work: 0.0,
            comm: 0.0,
            other: 0.0,
            total: 0.0,
            employees: None,
            unique_users: None,
        }
    }

    /// Add `hours` to the bucket for `kind` and to the running total.
    pub fn add(&mut self, kind: ActivityKind, hours: f64) {
        match kind {
            ActivityKind::Work => self.work += hours,
            ActivityKind::Communication => self.comm += hours,
            ActivityKind::Other => self.other += hours,
        }
        self.total += hours;
    }

    /// Share of work hours in percent, `0` for an empty bucket.
    pub fn work_percent(&self) -> f64 {
        percent_of(self.work, self.total)
    }
}

/// Per-employee hour totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStats {
    pub name: String,
    /// Role from the first record seen for this employee.
    pub role: String,
    pub work_hours: f64,
    pub comm_hours: f64,
    pub other_hours: f64,
    pub total_hours: f64,
    /// `work_hours / total_hours * 100`, or `0` without hours.
    pub efficiency: f64,
}

impl EmployeeStats {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            work_hours: 0.0,
            comm_hours: 0.0,
            other_hours: 0.0,
            total_hours: 0.0,
            efficiency: 0.0,
        }
    }

    /// Accumulate hours. Never touches `role`.
    pub fn add(&mut self, kind: ActivityKind, hours: f64) {
        match kind {
            ActivityKind::Work => self.work_hours += hours,
            ActivityKind::Communication => self.comm_hours += hours,
            ActivityKind::Other => self.other_hours += hours,
        }
        self.total_hours += hours;
    }

    /// Compute the derived `efficiency` field.
    pub fn finalize(&mut self) {
        self.efficiency = percent_of(self.work_hours, self.total_hours);
    }
}

/// Summary metrics for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub project_name: String,
    /// Sum of the project's daily totals.
    pub total_hours: f64,
    /// Unweighted mean of each contributor's own work share in the project.
    pub average_efficiency: f64,
}

/// Complete output of one aggregation run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedData {
    /// Global daily series, chronologically sorted.
    pub daily_percents: Vec<DailyStats>,
    /// Project name to its chronologically sorted daily series.
    pub project_trends: BTreeMap<String, Vec<DailyStats>>,
    pub project_meta: BTreeMap<String, ProjectMeta>,
    /// Unordered; consumers sort as they need.
    pub employee_stats: Vec<EmployeeStats>,
    /// Alphabetically sorted project names.
    pub project_list: Vec<String>,
}

impl AggregatedData {
    /// `true` when no record survived decoding and filtering.
    pub fn is_empty(&self) -> bool {
        self.daily_percents.is_empty()
            && self.project_trends.is_empty()
            && self.project_meta.is_empty()
            && self.employee_stats.is_empty()
            && self.project_list.is_empty()
    }

    /// Look up an employee by name.
    pub fn employee(&self, name: &str) -> Option<&EmployeeStats> {
        self.employee_stats.iter().find(|e| e.name == name)
    }
}

/// Anomaly-day thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Dates with fewer total hours are excluded (inclusive lower bound).
    pub min_daily_hours: f64,
    /// Dates whose work share reaches this percentage are excluded.
    pub max_work_percent: f64,
}

impl Default for FilterOptions {
    /// Thresholds that exclude nothing.
    fn default() -> Self {
        Self {
            min_daily_hours: 0.0,
            max_work_percent: 101.0,
        }
    }
}

impl FilterOptions {
    pub fn new(min_daily_hours: f64, max_work_percent: f64) -> Self {
        Self {
            min_daily_hours,
            max_work_percent,
        }
    }

    /// Reject thresholds that are negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.min_daily_hours.is_finite() || self.min_daily_hours < 0.0 {
            return Err(WorklogError::InvalidFilter(format!(
                "min_daily_hours must be a finite number >= 0, got {}",
                self.min_daily_hours
            )));
        }
        if !self.max_work_percent.is_finite() || self.max_work_percent < 0.0 {
            return Err(WorklogError::InvalidFilter(format!(
                "max_work_percent must be a finite number >= 0, got {}",
                self.max_work_percent
            )));
        }
        Ok(())
    }

    /// Whether a date with these totals is an anomaly day.
    pub fn excludes(&self, total: f64, work: f64) -> bool {
        total < self.min_daily_hours
            || (total > 0.0 && percent_of(work, total) >= self.max_work_percent)
    }
}

/// `part / whole * 100`, or `0` when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
