//! `collect`: one terminal aggregation run, exported as CSV or JSON.
//!
//! Ctrl-C cancels the run; whatever was merged before the interrupt is
//! still exported.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use venuescout_aggregator::{
    Aggregator, Constraints, RunOutcome, RunToken, SearchArea, Termination,
};
use venuescout_core::{
    export_filename, write_csv, AppConfig, Category, Disclosure, Venue, VenueSource,
};
use venuescout_places::PlacesClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    /// CSV to the given path, or to the dated default filename.
    Csv(Option<PathBuf>),
    /// Pretty JSON array on stdout.
    Json,
}

/// Runs `category` to completion against the places API and writes the
/// result.
///
/// # Errors
///
/// Returns an error if no API key is configured, the source fails before
/// any venue was collected, or the output cannot be written.
pub(crate) async fn run_collect(
    config: &AppConfig,
    category: &Category,
    load_everything: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let client = PlacesClient::from_app_config(config).context("cannot build places client")?;
    let source: Arc<dyn VenueSource> = Arc::new(client);
    let aggregator = Aggregator::new(
        source,
        constraints(config, load_everything),
        SearchArea::from_app_config(config),
    );

    let run = RunToken::detached();
    let interrupt = tokio::spawn(cancel_on_ctrl_c(run.clone()));
    let outcome = aggregator.run_to_completion(category, &run, None).await;
    interrupt.abort();

    let venues = finish(outcome)?;
    match format {
        OutputFormat::Json => write_json(&venues, std::io::stdout().lock())?,
        OutputFormat::Csv(path) => {
            let path = path.unwrap_or_else(|| {
                PathBuf::from(export_filename(chrono::Local::now().date_naive()))
            });
            let file = std::fs::File::create(&path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            let written = write_csv(&venues, None, std::io::BufWriter::new(file))?;
            println!("wrote {written} venues to {}", path.display());
        }
    }
    Ok(())
}

/// Terminal disclosure always; `load_everything` lifts the page ceiling.
pub(crate) fn constraints(config: &AppConfig, load_everything: bool) -> Constraints {
    let constraints =
        Constraints::from_app_config(config).with_disclosure(Disclosure::Terminal);
    if load_everything {
        constraints.load_everything()
    } else {
        constraints
    }
}

/// The venues to export, sorted by name.
///
/// # Errors
///
/// Fails when the source failed before any venue was collected. A failure
/// after some pages were merged only logs a warning.
pub(crate) fn finish(outcome: RunOutcome) -> anyhow::Result<Vec<Venue>> {
    if let Some(err) = outcome.failure() {
        return Err(err).with_context(|| format!("collecting {} failed", outcome.category));
    }
    if let Some(err) = &outcome.error {
        tracing::warn!(
            error = %err,
            kept = outcome.venues.len(),
            "run ended early; exporting partial results"
        );
    }
    tracing::info!(
        category = %outcome.category,
        termination = %outcome.termination,
        pages = outcome.pages_fetched,
        venues = outcome.venues.len(),
        "collection finished"
    );
    if outcome.termination == Termination::PageCeiling && outcome.next_page.is_some() {
        tracing::info!("more results available; rerun with --all to keep paging");
    }

    let mut venues = outcome.venues;
    venues.sort_by_cached_key(|v| v.name.to_lowercase());
    Ok(venues)
}

pub(crate) fn write_json<W: Write>(venues: &[Venue], mut writer: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, venues)?;
    writeln!(writer)?;
    Ok(())
}

async fn cancel_on_ctrl_c(run: RunToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupted; exporting the venues collected so far");
        run.cancel();
    }
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
