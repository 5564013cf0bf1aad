mod bootstrap;
mod render;

use anyhow::{Context, Result};
use worklog_core::settings::Settings;
use worklog_data::analysis::analyze_file;
use worklog_data::encoding::EncodingChoice;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("worklog v{} starting", env!("CARGO_PKG_VERSION"));

    let options = settings.filter_options()?;
    let low_data_hours = settings.low_data_threshold()?;
    let encoding: EncodingChoice = settings.encoding.parse()?;

    tracing::debug!(
        "File: {}, encoding: {:?}, filter: {:?}",
        settings.file.display(),
        encoding,
        options
    );

    let result = analyze_file(&settings.file, encoding, &options)
        .with_context(|| format!("analysing {}", settings.file.display()))?;

    if result.data.is_empty() {
        tracing::warn!("No usable data in {}", settings.file.display());
    }

    if settings.wants_json() {
        println!("{}", result.to_json_pretty()?);
    } else {
        print!("{}", render::render_text(&result, low_data_hours));
    }

    Ok(())
}
