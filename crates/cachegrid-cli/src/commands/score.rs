use std::path::Path;

use anyhow::Context;
use cachegrid_core::{Solution, load_catalog};
use cachegrid_placement::ScoreReport;

use super::Format;

pub fn score(input: &Path, solution: &Path, format: Format) -> anyhow::Result<()> {
    let report = score_files(input, solution)?;

    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => {
            println!("{}", format_report(&report));
        }
    }

    Ok(())
}

fn score_files(input: &Path, solution: &Path) -> anyhow::Result<ScoreReport> {
    let catalog = load_catalog(input).with_context(|| format!("loading {}", input.display()))?;
    let solution = Solution::load_file(solution)
        .with_context(|| format!("reading solution {}", solution.display()))?;

    cachegrid_placement::validate(&catalog, &solution).context("solution does not fit input")?;
    Ok(cachegrid_placement::score(&catalog, &solution))
}

fn format_report(report: &ScoreReport) -> String {
    format!(
        "Score: {}\n  Caches used: {}\n  Placements: {}\n  Requests served from cache: {}/{}",
        report.score,
        report.servers_used,
        report.placements,
        report.cached_requests,
        report.total_requests
    )
}
