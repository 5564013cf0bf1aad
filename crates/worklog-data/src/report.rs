//! Consumer-side views re-derived from an [`AggregatedData`].
//!
//! None of this feeds back into aggregation; it is what a display layer
//! computes from the returned employee and project structures.

use std::cmp::Ordering;

use serde::Serialize;
use worklog_core::models::{AggregatedData, EmployeeStats, ProjectMeta};

/// Projects with at most this many hours are treated as noise in rankings.
pub const MIN_RANKED_PROJECT_HOURS: f64 = 1.0;

// ── Summary ───────────────────────────────────────────────────────────────────

/// Headline numbers for a whole aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub employee_count: usize,
    pub project_count: usize,
    /// Sum of every employee's total hours.
    pub total_hours: f64,
    /// Unweighted mean of employee efficiencies.
    pub mean_efficiency: f64,
}

impl From<&AggregatedData> for Summary {
    fn from(data: &AggregatedData) -> Self {
        let employees = &data.employee_stats;
        let total_hours = employees.iter().map(|e| e.total_hours).sum();
        let mean_efficiency = if employees.is_empty() {
            0.0
        } else {
            employees.iter().map(|e| e.efficiency).sum::<f64>() / employees.len() as f64
        };

        Self {
            employee_count: employees.len(),
            project_count: data.project_list.len(),
            total_hours,
            mean_efficiency,
        }
    }
}

// ── Employee table ────────────────────────────────────────────────────────────

/// Column an employee table is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmployeeSortField {
    Name,
    Role,
    WorkHours,
    TotalHours,
    #[default]
    Efficiency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Partition employees into `(active, insufficient)` by work hours.
///
/// Active employees have at least `threshold` work hours.
pub fn split_by_work_hours(
    employees: &[EmployeeStats],
    threshold: f64,
) -> (Vec<EmployeeStats>, Vec<EmployeeStats>) {
    employees
        .iter()
        .cloned()
        .partition(|e| e.work_hours >= threshold)
}

/// Stable sort of `employees` by `field` in `direction`.
pub fn sort_employees(
    employees: &mut [EmployeeStats],
    field: EmployeeSortField,
    direction: SortDirection,
) {
    employees.sort_by(|a, b| {
        let ord = match field {
            EmployeeSortField::Name => a.name.cmp(&b.name),
            EmployeeSortField::Role => a.role.cmp(&b.role),
            EmployeeSortField::WorkHours => cmp_f64(a.work_hours, b.work_hours),
            EmployeeSortField::TotalHours => cmp_f64(a.total_hours, b.total_hours),
            EmployeeSortField::Efficiency => cmp_f64(a.efficiency, b.efficiency),
        };
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

// ── Efficiency bands ──────────────────────────────────────────────────────────

/// Coarse efficiency grade used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyBand {
    High,
    Medium,
    Low,
}

impl EfficiencyBand {
    /// Band for an employee efficiency (75 / 60 cut-offs).
    pub fn for_employee(efficiency: f64) -> Self {
        Self::with_cutoffs(efficiency, 75.0, 60.0)
    }

    /// Band for a project average efficiency (70 / 50 cut-offs).
    pub fn for_project(efficiency: f64) -> Self {
        Self::with_cutoffs(efficiency, 70.0, 50.0)
    }

    fn with_cutoffs(efficiency: f64, high: f64, medium: f64) -> Self {
        if efficiency >= high {
            EfficiencyBand::High
        } else if efficiency >= medium {
            EfficiencyBand::Medium
        } else {
            EfficiencyBand::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EfficiencyBand::High => "high",
            EfficiencyBand::Medium => "medium",
            EfficiencyBand::Low => "low",
        }
    }
}

// ── Project ranking ───────────────────────────────────────────────────────────

/// Projects with more than [`MIN_RANKED_PROJECT_HOURS`], largest first.
pub fn project_ranking(data: &AggregatedData) -> Vec<&ProjectMeta> {
    let mut ranked: Vec<&ProjectMeta> = data
        .project_meta
        .values()
        .filter(|p| p.total_hours > MIN_RANKED_PROJECT_HOURS)
        .collect();
    ranked.sort_by(|a, b| cmp_f64(b.total_hours, a.total_hours));
    ranked
}

// ── Tests ─────────────────────────────────────────────────────────────────────
