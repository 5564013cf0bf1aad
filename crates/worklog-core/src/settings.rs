use std::path::PathBuf;

use clap::Parser;

use crate::error::{Result, WorklogError};
use crate::models::FilterOptions;

/// Default work-hour threshold below which an employee is reported under
/// "insufficient data".
pub const DEFAULT_LOW_DATA_HOURS: f64 = 10.0;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Activity statistics for exported per-employee time logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "worklog",
    about = "Activity statistics for exported per-employee time logs",
    version
)]
pub struct Settings {
    /// CSV export to analyse
    pub file: PathBuf,

    /// Exclude dates with fewer total hours than this
    #[arg(long, default_value = "0")]
    pub min_daily_hours: f64,

    /// Exclude dates whose work share reaches this percentage
    #[arg(long, default_value = "101")]
    pub max_work_percent: f64,

    /// Text encoding of the file
    #[arg(long, default_value = "auto", value_parser = ["auto", "utf-8", "windows-1251"])]
    pub encoding: String,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Employees with fewer work hours are listed as insufficient data
    #[arg(long, default_value_t = DEFAULT_LOW_DATA_HOURS)]
    pub low_data_hours: f64,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] for an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Anomaly-day thresholds requested on the command line, validated.
    pub fn filter_options(&self) -> Result<FilterOptions> {
        let options = FilterOptions::new(self.min_daily_hours, self.max_work_percent);
        options.validate()?;
        Ok(options)
    }

    /// Validated low-data threshold.
    pub fn low_data_threshold(&self) -> Result<f64> {
        if !self.low_data_hours.is_finite() || self.low_data_hours < 0.0 {
            return Err(WorklogError::Config(format!(
                "low_data_hours must be a finite number >= 0, got {}",
                self.low_data_hours
            )));
        }
        Ok(self.low_data_hours)
    }

    pub fn wants_json(&self) -> bool {
        self.format == "json"
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
