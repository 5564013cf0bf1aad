//! Plain-text rendering of an analysis result.

use std::fmt::Write as _;

use worklog_core::formatting::{format_hours, format_percent};
use worklog_core::models::{AggregatedData, EmployeeStats};
use worklog_data::analysis::AnalysisResult;
use worklog_data::report::{
    project_ranking, sort_employees, split_by_work_hours, EfficiencyBand, EmployeeSortField,
    SortDirection, Summary,
};

const NO_DATA_NOTICE: &str = "No usable data: every row lacked a date or fell on an excluded day.";

/// Render the full text report.
pub fn render_text(result: &AnalysisResult, low_data_hours: f64) -> String {
    let mut out = String::new();
    let meta = &result.metadata;

    let _ = writeln!(
        out,
        "Encoding: {}{}  |  Delimiter: {:?}  |  Header: {}",
        meta.encoding,
        if meta.fell_back { " (fallback)" } else { "" },
        meta.layout.delimiter,
        if meta.layout.has_header { "yes" } else { "no" },
    );
    let _ = writeln!(
        out,
        "Records: {} decoded, {} with a date, {} dates excluded",
        meta.records_decoded, meta.records_admitted, meta.dates_excluded
    );
    out.push('\n');

    if result.data.is_empty() {
        out.push_str(NO_DATA_NOTICE);
        out.push('\n');
        return out;
    }

    render_summary(&mut out, &result.data);
    render_daily(&mut out, &result.data);
    render_projects(&mut out, &result.data);
    render_employees(&mut out, &result.data, low_data_hours);
    out
}

fn render_summary(out: &mut String, data: &AggregatedData) {
    let summary = Summary::from(data);
    let _ = writeln!(out, "== Summary ==");
    let _ = writeln!(out, "Employees:        {}", summary.employee_count);
    let _ = writeln!(out, "Projects:         {}", summary.project_count);
    let _ = writeln!(out, "Total hours:      {}", format_hours(summary.total_hours));
    let _ = writeln!(
        out,
        "Mean efficiency:  {}",
        format_percent(summary.mean_efficiency)
    );
    out.push('\n');
}

fn render_daily(out: &mut String, data: &AggregatedData) {
    let _ = writeln!(out, "== Daily activity ==");
    let _ = writeln!(
        out,
        "{:<12} {:>9} {:>9} {:>9} {:>9} {:>7} {:>6}",
        "Date", "Work", "Comm", "Other", "Total", "Work%", "Users"
    );
    for day in &data.daily_percents {
        let _ = writeln!(
            out,
            "{:<12} {:>9} {:>9} {:>9} {:>9} {:>7} {:>6}",
            day.date,
            format_hours(day.work),
            format_hours(day.comm),
            format_hours(day.other),
            format_hours(day.total),
            format_percent(day.work_percent()),
            day.unique_users.unwrap_or(0),
        );
    }
    out.push('\n');
}

fn render_projects(out: &mut String, data: &AggregatedData) {
    let ranked = project_ranking(data);
    if ranked.is_empty() {
        return;
    }
    let _ = writeln!(out, "== Projects ==");
    let _ = writeln!(
        out,
        "{:<28} {:>10} {:>10} {:>6} {:>7}",
        "Project", "Hours", "Avg eff.", "Days", "Band"
    );
    for project in ranked {
        let days = data
            .project_trends
            .get(&project.project_name)
            .map_or(0, Vec::len);
        let _ = writeln!(
            out,
            "{:<28} {:>10} {:>10} {:>6} {:>7}",
            truncate(&project.project_name, 28),
            format_hours(project.total_hours),
            format_percent(project.average_efficiency),
            days,
            EfficiencyBand::for_project(project.average_efficiency).label(),
        );
    }
    out.push('\n');
}

fn render_employees(out: &mut String, data: &AggregatedData, low_data_hours: f64) {
    let (mut active, mut insufficient) = split_by_work_hours(&data.employee_stats, low_data_hours);
    sort_employees(&mut active, EmployeeSortField::default(), SortDirection::default());
    sort_employees(
        &mut insufficient,
        EmployeeSortField::default(),
        SortDirection::default(),
    );

    let _ = writeln!(out, "== Employees ==");
    if active.is_empty() {
        let _ = writeln!(
            out,
            "No employee has at least {} of work.",
            format_hours(low_data_hours)
        );
    } else {
        employee_table(out, &active);
    }

    if !insufficient.is_empty() {
        out.push('\n');
        let _ = writeln!(
            out,
            "== Insufficient data (< {} work, {}) ==",
            format_hours(low_data_hours),
            insufficient.len()
        );
        employee_table(out, &insufficient);
    }
}

fn employee_table(out: &mut String, employees: &[EmployeeStats]) {
    let _ = writeln!(
        out,
        "{:<24} {:<16} {:>9} {:>9} {:>9} {:>7}",
        "Name", "Role", "Work", "Total", "Eff.", "Band"
    );
    for e in employees {
        let _ = writeln!(
            out,
            "{:<24} {:<16} {:>9} {:>9} {:>9} {:>7}",
            truncate(&e.name, 24),
            truncate(&e.role, 16),
            format_hours(e.work_hours),
            format_hours(e.total_hours),
            format_percent(e.efficiency),
            EfficiencyBand::for_employee(e.efficiency).label(),
        );
    }
}

/// Cut `s` to at most `max` characters, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
