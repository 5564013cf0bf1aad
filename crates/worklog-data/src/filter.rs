//! Anomaly-day detection.
//!
//! A date is an anomaly day when its total hours fall below a minimum or its
//! work share reaches a maximum. Anomaly days are dropped from every
//! aggregate view.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use worklog_core::classifier::ActivityKind;
use worklog_core::models::{FilterOptions, RawRecord};

/// Total and work hours of one date across all records.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayTotals {
    pub total: f64,
    pub work: f64,
}

/// Per-date totals over every admitted record.
///
/// These do not depend on the thresholds, so one instance serves any number
/// of [`DailyTotals::excluded_dates`] calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyTotals {
    by_date: HashMap<String, DayTotals>,
}

impl DailyTotals {
    pub fn from_records(records: &[RawRecord]) -> Self {
        let mut by_date: HashMap<String, DayTotals> = HashMap::new();
        for record in records.iter().filter(|r| r.is_admitted()) {
            let day = by_date.entry(record.date.clone()).or_default();
            day.total += record.hours;
            if record.kind() == ActivityKind::Work {
                day.work += record.hours;
            }
        }
        Self { by_date }
    }

    /// Totals for `date`, if any admitted record carries it.
    pub fn get(&self, date: &str) -> Option<DayTotals> {
        self.by_date.get(date).copied()
    }

    /// Number of distinct admitted dates.
    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Dates `options` classifies as anomaly days.
    pub fn excluded_dates(&self, options: &FilterOptions) -> HashSet<String> {
        let excluded: HashSet<String> = self
            .by_date
            .iter()
            .filter(|(_, day)| options.excludes(day.total, day.work))
            .map(|(date, _)| date.clone())
            .collect();

        debug!(
            "Excluding {} of {} dates (min_daily_hours={}, max_work_percent={})",
            excluded.len(),
            self.by_date.len(),
            options.min_daily_hours,
            options.max_work_percent
        );
        excluded
    }
}

/// One-shot form of [`DailyTotals::excluded_dates`].
pub fn compute_excluded_dates(records: &[RawRecord], options: &FilterOptions) -> HashSet<String> {
    DailyTotals::from_records(records).excluded_dates(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, activity: &str, hours: f64) -> RawRecord {
        RawRecord {
            date: date.to_string(),
            activity_type: activity.to_string(),
            employee: "Ann".to_string(),
            hours,
            ..Default::default()
        }
    }

    fn sample() -> Vec<RawRecord> {
        vec![
            record("2024-01-01", "Работа", 6.0),
            record("2024-01-01", "Коммуникации", 2.0),
            record("2024-01-02", "Работа", 3.0),
            record("2024-01-03", "Работа", 9.0),
            record("2024-01-03", "Прочее", 1.0),
        ]
    }

    // ── DailyTotals ───────────────────────────────────────────────────────────

    #[test]
    fn test_totals_per_date() {
        let totals = DailyTotals::from_records(&sample());
        assert_eq!(totals.len(), 3);
        assert_eq!(
            totals.get("2024-01-01"),
            Some(DayTotals {
                total: 8.0,
                work: 6.0
            })
        );
        assert_eq!(totals.get("2024-01-04"), None);
    }

    #[test]
    fn test_totals_skip_records_without_date() {
        let records = vec![record("", "Работа", 5.0), record("1.1", "Работа", 5.0)];
        assert!(DailyTotals::from_records(&records).is_empty());
    }

    // ── excluded_dates ────────────────────────────────────────────────────────

    #[test]
    fn test_default_options_exclude_nothing() {
        let excluded = compute_excluded_dates(&sample(), &FilterOptions::default());
        assert!(excluded.is_empty());
    }

    #[test]
    fn test_min_daily_hours() {
        let excluded = compute_excluded_dates(&sample(), &FilterOptions::new(5.0, 101.0));
        assert_eq!(excluded, HashSet::from(["2024-01-02".to_string()]));
    }

    #[test]
    fn test_max_work_percent_is_inclusive() {
        // 2024-01-02 is 100% work, 2024-01-03 is 90%, 2024-01-01 is 75%.
        let excluded = compute_excluded_dates(&sample(), &FilterOptions::new(0.0, 90.0));
        assert_eq!(
            excluded,
            HashSet::from(["2024-01-02".to_string(), "2024-01-03".to_string()])
        );
    }

    #[test]
    fn test_zero_hour_date_not_excluded_by_percent() {
        let records = vec![record("2024-02-01", "Работа", 0.0)];
        let excluded = compute_excluded_dates(&records, &FilterOptions::new(0.0, 0.0));
        assert!(excluded.is_empty());
    }

    #[test]
    fn test_raising_min_hours_only_grows_exclusions() {
        let totals = DailyTotals::from_records(&sample());
        let mut previous = HashSet::new();
        for min in [0.0, 4.0, 8.0, 9.5, 10.0, 20.0] {
            let excluded = totals.excluded_dates(&FilterOptions::new(min, 101.0));
            assert!(previous.is_subset(&excluded), "min={min}");
            previous = excluded;
        }
        assert_eq!(previous.len(), 3);
    }
}
