//! Top-level analysis pipeline.
//!
//! Decodes the export, computes anomaly days and aggregates, returning an
//! [`AnalysisResult`] ready for rendering.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use worklog_core::error::Result;
use worklog_core::models::{AggregatedData, FilterOptions, RawRecord};

use crate::aggregator::ActivityAggregator;
use crate::encoding::{read_csv_file, EncodingChoice, TextEncoding};
use crate::filter::DailyTotals;
use crate::reader::{decode, CsvLayout};

// ── Analysis ──────────────────────────────────────────────────────────────────

/// Decoded records with their memoised per-date totals.
///
/// Threshold changes only need [`Analysis::aggregate`] again; the text is
/// never re-decoded.
#[derive(Debug, Clone)]
pub struct Analysis {
    records: Vec<RawRecord>,
    layout: CsvLayout,
    totals: DailyTotals,
}

impl Analysis {
    /// Decode `text` and compute the per-date totals.
    pub fn from_text(text: &str) -> Self {
        let outcome = decode(text);
        Self::from_parts(outcome.records, outcome.layout)
    }

    /// Wrap already decoded records.
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        Self::from_parts(records, CsvLayout::default())
    }

    fn from_parts(records: Vec<RawRecord>, layout: CsvLayout) -> Self {
        let totals = DailyTotals::from_records(&records);
        Self {
            records,
            layout,
            totals,
        }
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn layout(&self) -> &CsvLayout {
        &self.layout
    }

    pub fn daily_totals(&self) -> &DailyTotals {
        &self.totals
    }

    /// Number of records with a usable date.
    pub fn admitted_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_admitted()).count()
    }

    /// Aggregate with the given thresholds.
    pub fn aggregate(&self, options: &FilterOptions) -> AggregatedData {
        self.aggregate_counted(options).0
    }

    /// Aggregate and also report how many dates were excluded.
    fn aggregate_counted(&self, options: &FilterOptions) -> (AggregatedData, usize) {
        let excluded = self.totals.excluded_dates(options);
        let data = ActivityAggregator::aggregate(&self.records, &excluded);
        (data, excluded.len())
    }
}

/// Decode `text` and aggregate it with `options` in one call.
pub fn parse_csv(text: &str, options: &FilterOptions) -> AggregatedData {
    Analysis::from_text(text).aggregate(options)
}

// ── AnalysisResult ────────────────────────────────────────────────────────────

/// Metadata produced alongside the aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    pub encoding: TextEncoding,
    /// Whether UTF-8 was rejected in favour of Windows-1251.
    pub fell_back: bool,
    pub layout: CsvLayout,
    pub filter: FilterOptions,
    pub records_decoded: usize,
    /// Records with a usable date, before anomaly filtering.
    pub records_admitted: usize,
    pub dates_excluded: usize,
    pub decode_time_seconds: f64,
    pub aggregate_time_seconds: f64,
}

/// The complete output of [`analyze_file`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub metadata: AnalysisMetadata,
    pub data: AggregatedData,
}

impl AnalysisResult {
    /// Pretty-printed JSON of metadata and aggregates.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run the full pipeline on the file at `path`.
///
/// 1. Read and decode the bytes (see [`crate::encoding`]).
/// 2. Decode records and compute per-date totals.
/// 3. Determine anomaly days for `options`.
/// 4. Aggregate the remaining records.
pub fn analyze_file(
    path: &Path,
    encoding: EncodingChoice,
    options: &FilterOptions,
) -> Result<AnalysisResult> {
    options.validate()?;

    let decode_start = std::time::Instant::now();
    let decoded = read_csv_file(path, encoding)?;
    let analysis = Analysis::from_text(&decoded.text);
    let decode_time = decode_start.elapsed().as_secs_f64();

    let aggregate_start = std::time::Instant::now();
    let (data, dates_excluded) = analysis.aggregate_counted(options);
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        encoding: decoded.encoding,
        fell_back: decoded.fell_back,
        layout: *analysis.layout(),
        filter: *options,
        records_decoded: analysis.records().len(),
        records_admitted: analysis.admitted_count(),
        dates_excluded,
        decode_time_seconds: decode_time,
        aggregate_time_seconds: aggregate_time,
    };

    info!(
        "Analysed {}: {} records decoded, {} admitted, {} dates excluded",
        path.display(),
        metadata.records_decoded,
        metadata.records_admitted,
        metadata.dates_excluded
    );

    Ok(AnalysisResult { metadata, data })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use worklog_core::error::WorklogError;

    const SAMPLE: &str = "День;Проект;Тип активности;Сотрудник;Должность;Программа;Часов;Сессий\n\
        2024-01-01;ProjA;Работа;Alice;Dev;IDE;5;2\n\
        2024-01-01;ProjA;Коммуникации;Bob;PM;Outlook;1;1\n\
        2024-01-02;ProjB;Работа;Alice;Dev;IDE;2;1\n";

    #[test]
    fn test_parse_csv_default_options() {
        let data = parse_csv(SAMPLE, &FilterOptions::default());
        assert_eq!(data.daily_percents.len(), 2);
        assert_eq!(data.project_list, vec!["ProjA", "ProjB"]);
        assert_eq!(data.employee("Alice").unwrap().total_hours, 7.0);
    }

    #[test]
    fn test_parse_csv_empty_input() {
        assert!(parse_csv("", &FilterOptions::default()).is_empty());
        assert!(parse_csv("\u{FEFF}", &FilterOptions::default()).is_empty());
    }

    #[test]
    fn test_reaggregate_with_new_thresholds() {
        let analysis = Analysis::from_text(SAMPLE);
        assert_eq!(analysis.daily_totals().len(), 2);

        let all = analysis.aggregate(&FilterOptions::default());
        let filtered = analysis.aggregate(&FilterOptions::new(3.0, 101.0));

        assert_eq!(all.daily_percents.len(), 2);
        assert_eq!(filtered.daily_percents.len(), 1);
        assert_eq!(filtered.daily_percents[0].date, "2024-01-01");
        assert!(!filtered.project_trends.contains_key("ProjB"));
        // Unchanged input, unchanged output.
        assert_eq!(all, analysis.aggregate(&FilterOptions::default()));
    }

    #[test]
    fn test_from_records() {
        let analysis = Analysis::from_records(vec![RawRecord {
            date: "2024-03-01".to_string(),
            employee: "Ann".to_string(),
            activity_type: "dev".to_string(),
            hours: 4.0,
            ..Default::default()
        }]);
        let data = analysis.aggregate(&FilterOptions::default());
        assert_eq!(data.employee("Ann").unwrap().efficiency, 100.0);
    }

    #[test]
    fn test_analyze_file() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(SAMPLE.as_bytes()).expect("write");

        let result = analyze_file(
            file.path(),
            EncodingChoice::Auto,
            &FilterOptions::new(3.0, 101.0),
        )
        .expect("analyze");

        assert_eq!(result.metadata.encoding, TextEncoding::Utf8);
        assert!(!result.metadata.fell_back);
        assert!(result.metadata.layout.has_header);
        assert_eq!(result.metadata.layout.delimiter, ';');
        assert_eq!(result.metadata.records_decoded, 3);
        assert_eq!(result.metadata.records_admitted, 3);
        assert_eq!(result.metadata.dates_excluded, 1);
        assert_eq!(result.data.daily_percents.len(), 1);
    }

    #[test]
    fn test_analyze_file_rejects_invalid_filter() {
        let file = NamedTempFile::new().expect("tempfile");
        let err = analyze_file(
            file.path(),
            EncodingChoice::Auto,
            &FilterOptions::new(-1.0, 101.0),
        )
        .expect_err("invalid filter");
        assert!(matches!(err, WorklogError::InvalidFilter(_)));
    }

    #[test]
    fn test_result_json_shape() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(SAMPLE.as_bytes()).expect("write");
        let result =
            analyze_file(file.path(), EncodingChoice::Auto, &FilterOptions::default()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&result.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["metadata"]["encoding"], "utf-8");
        assert_eq!(json["metadata"]["recordsDecoded"], 3);
        assert_eq!(json["data"]["dailyPercents"][0]["uniqueUsers"], 2);
        assert_eq!(json["data"]["projectMeta"]["ProjA"]["averageEfficiency"], 50.0);
    }
}
