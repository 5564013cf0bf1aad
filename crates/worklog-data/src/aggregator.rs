//! Folding decoded records into the daily, project and employee views.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::debug;
use worklog_core::classifier::ActivityKind;
use worklog_core::models::{
    percent_of, AggregatedData, DailyStats, EmployeeStats, ProjectMeta, RawRecord,
};
use worklog_core::time_utils::sort_by_date_key;

// ── WorkTally ─────────────────────────────────────────────────────────────────

/// Work and total hours of one employee within one project.
#[derive(Debug, Clone, Copy, Default)]
struct WorkTally {
    work: f64,
    total: f64,
}

// ── ProjectAccumulator ────────────────────────────────────────────────────────

/// Everything collected for one project while folding.
#[derive(Debug, Default)]
struct ProjectAccumulator {
    days: BTreeMap<String, DailyStats>,
    /// Distinct employees per date, in first-seen order.
    day_employees: HashMap<String, Vec<String>>,
    /// Employee name to work/total hours within this project.
    tally: BTreeMap<String, WorkTally>,
}

impl ProjectAccumulator {
    fn add(&mut self, record: &RawRecord, kind: ActivityKind) {
        self.days
            .entry(record.date.clone())
            .or_insert_with(|| DailyStats::new(record.date.clone()))
            .add(kind, record.hours);

        if record.employee.is_empty() {
            return;
        }

        let names = self.day_employees.entry(record.date.clone()).or_default();
        if !names.contains(&record.employee) {
            names.push(record.employee.clone());
        }

        let tally = self.tally.entry(record.employee.clone()).or_default();
        if kind == ActivityKind::Work {
            tally.work += record.hours;
        }
        tally.total += record.hours;
    }

    /// Chronological daily series with per-day employee lists attached.
    fn trend(&mut self) -> Vec<DailyStats> {
        let mut series: Vec<DailyStats> = std::mem::take(&mut self.days)
            .into_values()
            .map(|mut day| {
                day.employees = self.day_employees.remove(&day.date);
                day
            })
            .collect();
        sort_by_date_key(&mut series, |d| d.date.as_str());
        series
    }

    /// Unweighted mean of each contributor's work share in this project.
    ///
    /// Contributors without positive hours in the project are left out.
    fn average_efficiency(&self) -> f64 {
        let shares: Vec<f64> = self
            .tally
            .values()
            .filter(|t| t.total > 0.0)
            .map(|t| percent_of(t.work, t.total))
            .collect();

        if shares.is_empty() {
            0.0
        } else {
            shares.iter().sum::<f64>() / shares.len() as f64
        }
    }
}

// ── ActivityAggregator ────────────────────────────────────────────────────────

/// Stateless helper building every aggregate view in a single pass.
pub struct ActivityAggregator;

impl ActivityAggregator {
    /// Aggregate admitted records whose date is not in `excluded_dates`.
    ///
    /// Records without a usable date are ignored. Employee stats keep the
    /// order in which employees first appear.
    pub fn aggregate(records: &[RawRecord], excluded_dates: &HashSet<String>) -> AggregatedData {
        let mut daily: BTreeMap<String, DailyStats> = BTreeMap::new();
        let mut daily_users: HashMap<String, HashSet<String>> = HashMap::new();
        let mut projects: BTreeMap<String, ProjectAccumulator> = BTreeMap::new();
        let mut employees: Vec<EmployeeStats> = Vec::new();
        let mut employee_index: HashMap<String, usize> = HashMap::new();
        let mut project_set: BTreeSet<String> = BTreeSet::new();
        let mut folded = 0usize;

        for record in records {
            if !record.is_admitted() || excluded_dates.contains(&record.date) {
                continue;
            }
            folded += 1;
            let kind = record.kind();

            daily
                .entry(record.date.clone())
                .or_insert_with(|| DailyStats::new(record.date.clone()))
                .add(kind, record.hours);

            if !record.project.is_empty() {
                project_set.insert(record.project.clone());
                projects
                    .entry(record.project.clone())
                    .or_default()
                    .add(record, kind);
            }

            if !record.employee.is_empty() {
                daily_users
                    .entry(record.date.clone())
                    .or_default()
                    .insert(record.employee.clone());

                // The first record for an employee fixes the role.
                let idx = *employee_index
                    .entry(record.employee.clone())
                    .or_insert_with(|| {
                        employees.push(EmployeeStats::new(&record.employee, &record.role));
                        employees.len() - 1
                    });
                employees[idx].add(kind, record.hours);
            }
        }

        debug!(
            "Folded {} of {} records into {} dates, {} projects, {} employees",
            folded,
            records.len(),
            daily.len(),
            projects.len(),
            employees.len()
        );

        Self::finalize(daily, daily_users, projects, employees, project_set)
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn finalize(
        daily: BTreeMap<String, DailyStats>,
        mut daily_users: HashMap<String, HashSet<String>>,
        projects: BTreeMap<String, ProjectAccumulator>,
        mut employees: Vec<EmployeeStats>,
        project_set: BTreeSet<String>,
    ) -> AggregatedData {
        for employee in &mut employees {
            employee.finalize();
        }

        let mut daily_percents: Vec<DailyStats> = daily
            .into_values()
            .map(|mut day| {
                let users = daily_users.remove(&day.date).map_or(0, |set| set.len());
                day.unique_users = Some(users);
                day
            })
            .collect();
        sort_by_date_key(&mut daily_percents, |d| d.date.as_str());

        let mut project_trends = BTreeMap::new();
        let mut project_meta = BTreeMap::new();
        for (name, mut acc) in projects {
            let trend = acc.trend();
            let total_hours: f64 = trend.iter().map(|d| d.total).sum();
            project_meta.insert(
                name.clone(),
                ProjectMeta {
                    project_name: name.clone(),
                    total_hours,
                    average_efficiency: acc.average_efficiency(),
                },
            );
            project_trends.insert(name, trend);
        }

        AggregatedData {
            daily_percents,
            project_trends,
            project_meta,
            employee_stats: employees,
            project_list: project_set.into_iter().collect(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(
        date: &str,
        project: &str,
        activity: &str,
        employee: &str,
        role: &str,
        hours: f64,
    ) -> RawRecord {
        RawRecord {
            date: date.to_string(),
            project: project.to_string(),
            activity_type: activity.to_string(),
            employee: employee.to_string(),
            role: role.to_string(),
            program: String::new(),
            hours,
            sessions: 1.0,
        }
    }

    fn aggregate(records: &[RawRecord]) -> AggregatedData {
        ActivityAggregator::aggregate(records, &HashSet::new())
    }

    // ── global daily series ───────────────────────────────────────────────────

    #[test]
    fn test_daily_series_buckets_and_unique_users() {
        let data = aggregate(&[
            rec("2024-01-01", "ProjA", "Работа", "Alice", "Dev", 5.0),
            rec("2024-01-01", "ProjA", "Почта", "Bob", "PM", 1.0),
            rec("2024-01-01", "", "Обед", "Alice", "Dev", 0.5),
        ]);

        assert_eq!(data.daily_percents.len(), 1);
        let day = &data.daily_percents[0];
        assert_eq!(day.date, "2024-01-01");
        assert_eq!(day.work, 5.0);
        assert_eq!(day.comm, 1.0);
        assert_eq!(day.other, 0.5);
        assert_eq!(day.total, 6.5);
        assert_eq!(day.unique_users, Some(2));
        assert_eq!(day.employees, None);
    }

    #[test]
    fn test_daily_series_sorted_chronologically() {
        let data = aggregate(&[
            rec("2024-1-10", "", "Работа", "A", "", 1.0),
            rec("2024-1-9", "", "Работа", "A", "", 1.0),
            rec("2023-12-31", "", "Работа", "A", "", 1.0),
        ]);
        let dates: Vec<&str> = data.daily_percents.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2023-12-31", "2024-1-9", "2024-1-10"]);
    }

    #[test]
    fn test_unique_users_zero_without_names() {
        let data = aggregate(&[rec("2024-01-01", "", "Работа", "", "", 2.0)]);
        assert_eq!(data.daily_percents[0].unique_users, Some(0));
        assert!(data.employee_stats.is_empty());
    }

    #[test]
    fn test_records_without_date_are_dropped() {
        let data = aggregate(&[
            rec("", "ProjA", "Работа", "Alice", "Dev", 5.0),
            rec("1/1", "ProjA", "Работа", "Alice", "Dev", 5.0),
        ]);
        assert!(data.is_empty());
    }

    // ── employees ─────────────────────────────────────────────────────────────

    #[test]
    fn test_employee_role_first_record_wins() {
        let data = aggregate(&[
            rec("2024-01-01", "", "Работа", "Alice", "Junior", 1.0),
            rec("2024-01-02", "", "Работа", "Alice", "Senior", 1.0),
        ]);
        let alice = data.employee("Alice").unwrap();
        assert_eq!(alice.role, "Junior");
        assert_eq!(alice.total_hours, 2.0);
    }

    #[test]
    fn test_employee_first_role_kept_even_when_empty() {
        let data = aggregate(&[
            rec("2024-01-01", "", "Работа", "Alice", "", 1.0),
            rec("2024-01-02", "", "Работа", "Alice", "Lead", 1.0),
        ]);
        assert_eq!(data.employee("Alice").unwrap().role, "");
    }

    #[test]
    fn test_employee_efficiency_bounds() {
        let data = aggregate(&[
            rec("2024-01-01", "", "Работа", "Alice", "", 3.0),
            rec("2024-01-01", "", "Meeting", "Alice", "", 1.0),
            rec("2024-01-01", "", "Работа", "Zero", "", 0.0),
        ]);
        assert_eq!(data.employee("Alice").unwrap().efficiency, 75.0);
        assert_eq!(data.employee("Zero").unwrap().efficiency, 0.0);
    }

    #[test]
    fn test_employee_order_is_first_appearance() {
        let data = aggregate(&[
            rec("2024-01-01", "", "Работа", "Zed", "", 1.0),
            rec("2024-01-01", "", "Работа", "Amy", "", 1.0),
            rec("2024-01-02", "", "Работа", "Zed", "", 1.0),
        ]);
        let names: Vec<&str> = data.employee_stats.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "Amy"]);
    }

    // ── projects ──────────────────────────────────────────────────────────────

    #[test]
    fn test_project_trend_employees_in_first_seen_order() {
        let data = aggregate(&[
            rec("2024-01-02", "P", "Работа", "Zoe", "", 1.0),
            rec("2024-01-02", "P", "Работа", "Adam", "", 1.0),
            rec("2024-01-02", "P", "Почта", "Zoe", "", 1.0),
            rec("2024-01-01", "P", "Работа", "Adam", "", 2.0),
        ]);
        let trend = &data.project_trends["P"];
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, "2024-01-01");
        assert_eq!(trend[0].employees, Some(vec!["Adam".to_string()]));
        assert_eq!(
            trend[1].employees,
            Some(vec!["Zoe".to_string(), "Adam".to_string()])
        );
        assert_eq!(trend[1].total, 3.0);
        assert_eq!(trend[1].unique_users, None);
    }

    #[test]
    fn test_project_record_without_employee() {
        let data = aggregate(&[
            rec("2024-01-01", "P", "Работа", "", "", 4.0),
            rec("2024-01-01", "P", "Почта", "Bob", "", 1.0),
        ]);
        let trend = &data.project_trends["P"];
        assert_eq!(trend[0].total, 5.0);
        assert_eq!(trend[0].employees, Some(vec!["Bob".to_string()]));

        // Only Bob is in the efficiency tally.
        let meta = &data.project_meta["P"];
        assert_eq!(meta.total_hours, 5.0);
        assert_eq!(meta.average_efficiency, 0.0);
    }

    #[test]
    fn test_project_day_without_any_employee_has_no_list() {
        let data = aggregate(&[rec("2024-01-01", "P", "Работа", "", "", 4.0)]);
        assert_eq!(data.project_trends["P"][0].employees, None);
        assert_eq!(data.project_meta["P"].average_efficiency, 0.0);
    }

    #[test]
    fn test_empty_project_only_feeds_global_and_employee() {
        let data = aggregate(&[rec("2024-01-01", "", "Работа", "Ann", "", 3.0)]);
        assert!(data.project_trends.is_empty());
        assert!(data.project_meta.is_empty());
        assert!(data.project_list.is_empty());
        assert_eq!(data.daily_percents[0].total, 3.0);
        assert_eq!(data.employee("Ann").unwrap().total_hours, 3.0);
    }

    #[test]
    fn test_average_efficiency_is_unweighted() {
        let data = aggregate(&[
            rec("2024-01-01", "P", "Работа", "Short", "", 1.0),
            rec("2024-01-01", "P", "Работа", "Long", "", 50.0),
            rec("2024-01-02", "P", "Прочее", "Long", "", 450.0),
        ]);
        let meta = &data.project_meta["P"];
        assert_eq!(meta.total_hours, 501.0);
        assert!((meta.average_efficiency - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_efficiency_skips_zero_hour_contributors() {
        let data = aggregate(&[
            rec("2024-01-01", "P", "Работа", "Busy", "", 2.0),
            rec("2024-01-01", "P", "Прочее", "Idle", "", 0.0),
        ]);
        assert_eq!(data.project_meta["P"].average_efficiency, 100.0);
    }

    #[test]
    fn test_average_efficiency_is_per_project() {
        let data = aggregate(&[
            rec("2024-01-01", "P", "Работа", "Ann", "", 1.0),
            rec("2024-01-01", "Q", "Прочее", "Ann", "", 1.0),
        ]);
        assert_eq!(data.project_meta["P"].average_efficiency, 100.0);
        assert_eq!(data.project_meta["Q"].average_efficiency, 0.0);
    }

    #[test]
    fn test_project_list_sorted() {
        let data = aggregate(&[
            rec("2024-01-01", "Zeta", "Работа", "A", "", 1.0),
            rec("2024-01-01", "Alpha", "Работа", "A", "", 1.0),
            rec("2024-01-01", "Mid", "Работа", "A", "", 1.0),
        ]);
        assert_eq!(data.project_list, vec!["Alpha", "Mid", "Zeta"]);
        assert_eq!(data.project_meta["Mid"].project_name, "Mid");
    }

    // ── exclusion ─────────────────────────────────────────────────────────────

    #[test]
    fn test_excluded_dates_dropped_everywhere() {
        let records = vec![
            rec("2024-01-01", "P", "Работа", "Ann", "Dev", 3.0),
            rec("2024-01-02", "P", "Работа", "Ann", "Dev", 8.0),
            rec("2024-01-02", "P", "Почта", "Ann", "Dev", 2.0),
        ];
        let excluded = HashSet::from(["2024-01-01".to_string()]);
        let data = ActivityAggregator::aggregate(&records, &excluded);

        assert!(data.daily_percents.iter().all(|d| d.date != "2024-01-01"));
        assert!(data.project_trends["P"].iter().all(|d| d.date != "2024-01-01"));
        assert_eq!(data.employee("Ann").unwrap().total_hours, 10.0);
        assert_eq!(data.project_meta["P"].total_hours, 10.0);
    }

    #[test]
    fn test_all_excluded_yields_empty_result() {
        let records = vec![rec("2024-01-01", "P", "Работа", "Ann", "Dev", 3.0)];
        let excluded = HashSet::from(["2024-01-01".to_string()]);
        assert!(ActivityAggregator::aggregate(&records, &excluded).is_empty());
    }

    // ── invariants ────────────────────────────────────────────────────────────

    #[test]
    fn test_totals_equal_bucket_sums() {
        let data = aggregate(&[
            rec("2024-01-01", "P", "Работа", "A", "", 0.1),
            rec("2024-01-01", "P", "Chat", "B", "", 0.2),
            rec("2024-01-01", "Q", "Прочее", "A", "", 0.3),
            rec("2024-01-02", "Q", "Dev", "B", "", 1.7),
        ]);
        for day in data
            .daily_percents
            .iter()
            .chain(data.project_trends.values().flatten())
        {
            assert_eq!(day.total, day.work + day.comm + day.other, "{}", day.date);
        }
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let records = vec![
            rec("2024-01-01", "P", "Работа", "A", "", 0.1),
            rec("2024-01-01", "P", "Chat", "B", "", 0.7),
            rec("2024-01-02", "Q", "Работа", "C", "", 0.3),
            rec("2024-01-02", "P", "Работа", "B", "", 0.9),
        ];
        assert_eq!(aggregate(&records), aggregate(&records));
    }
}
