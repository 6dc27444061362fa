use std::path::{Path, PathBuf};

use anyhow::Context;
use cachegrid_core::{CacheGridConfig, load_catalog};
use cachegrid_placement::{CancelToken, OptimizerOptions, optimize_with, score};
use serde::Serialize;
use tracing::{info, warn};

use super::Format;

/// Result of solving one input file.
#[derive(Debug, Clone, Serialize)]
pub struct SolveSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub servers_used: usize,
    pub placements: usize,
    pub score: u64,
    pub servers_processed: usize,
    pub servers_total: usize,
    pub cancelled: bool,
}

/// Exit status after a forced stop, as for a shell killed by SIGINT.
const FORCED_EXIT_CODE: i32 = 130;

pub async fn solve(
    config: &CacheGridConfig,
    inputs: Vec<PathBuf>,
    format: Format,
) -> anyhow::Result<()> {
    let inputs = if inputs.is_empty() {
        config.run.inputs.clone()
    } else {
        inputs
    };
    if inputs.is_empty() {
        anyhow::bail!(
            "no input files: pass them as arguments or set [run].inputs in cachegrid.toml"
        );
    }

    if let Some(dir) = &config.run.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    let cancel = CancelToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if watch_interrupts(tokio::signal::ctrl_c, cancel).await {
                warn!("second interrupt received, exiting without finishing");
                std::process::exit(FORCED_EXIT_CODE);
            }
        }
    });

    let mut summaries = Vec::with_capacity(inputs.len());
    for (done, input) in inputs.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(skipped = inputs.len() - done, "remaining inputs skipped");
            break;
        }
        let summary = solve_file(config, input, &cancel).await?;
        if format == Format::Text {
            println!("{}", format_summary(&summary));
        }
        summaries.push(summary);
    }
    interrupt.abort();

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }
    Ok(())
}

/// Cancel `cancel` on the first interrupt from `next_interrupt`, then wait
/// for another. Returns true if a second interrupt arrived, false if
/// interrupts stopped being deliverable.
async fn watch_interrupts<F, Fut>(mut next_interrupt: F, cancel: CancelToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = next_interrupt().await {
        warn!(error = %err, "cannot listen for interrupts");
        return false;
    }
    info!("interrupt received, stopping after the current server; interrupt again to exit");
    cancel.cancel();
    next_interrupt().await.is_ok()
}

/// Load, optimize, write and score one input file.
pub async fn solve_file(
    config: &CacheGridConfig,
    input: &Path,
    cancel: &CancelToken,
) -> anyhow::Result<SolveSummary> {
    let loaded = load_catalog(input).with_context(|| format!("loading {}", input.display()))?;
    info!(input = %input.display(), %loaded, "solving");

    let options = OptimizerOptions {
        progress_steps: config.progress_steps(),
    };
    let cancel = cancel.clone();
    let (loaded, outcome) = tokio::task::spawn_blocking(move || {
        let mut working = loaded.clone();
        let outcome = optimize_with(&mut working, &options, &cancel);
        (loaded, outcome)
    })
    .await
    .context("optimizer task failed")?;

    let output = config.output_path_for(input);
    outcome
        .solution
        .write_file(&output)
        .with_context(|| format!("writing {}", output.display()))?;

    let report = score(&loaded, &outcome.solution);
    info!(
        input = %input.display(),
        output = %output.display(),
        score = report.score,
        cancelled = outcome.cancelled,
        "solution written"
    );

    Ok(SolveSummary {
        input: input.to_path_buf(),
        output,
        servers_used: outcome.solution.len(),
        placements: outcome.solution.placement_count(),
        score: report.score,
        servers_processed: outcome.servers_processed,
        servers_total: outcome.servers_total,
        cancelled: outcome.cancelled,
    })
}

fn format_summary(summary: &SolveSummary) -> String {
    if summary.cancelled {
        return format!(
            "⚠ {} → {} partial: {}/{} caches processed (score {})",
            summary.input.display(),
            summary.output.display(),
            summary.servers_processed,
            summary.servers_total,
            summary.score
        );
    }
    format!(
        "✓ {} → {} (score {}, {} caches, {} placements)",
        summary.input.display(),
        summary.output.display(),
        summary.score,
        summary.servers_used,
        summary.placements
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
5 2 4 3 100
50 50 80 30 110
1000 3
0 100
2 200
1 300
500 0
3 0 1500
0 1 1000
4 0 500
1 0 1000
";

    #[tokio::test]
    async fn solve_file_writes_output_beside_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sample.in");
        std::fs::write(&input, SAMPLE).unwrap();

        let summary = solve_file(&CacheGridConfig::default(), &input, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.output, dir.path().join("sample.in.out"));
        assert_eq!(std::fs::read_to_string(&summary.output).unwrap(), "1\n0 3 1\n");
        assert_eq!(summary.score, 562_500);
        assert!(!summary.cancelled);
        assert_eq!(summary.servers_processed, 3);
    }

    #[tokio::test]
    async fn cancelled_solve_still_writes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sample.in");
        std::fs::write(&input, SAMPLE).unwrap();

        let mut config = CacheGridConfig::default();
        config.run.output_dir = Some(dir.path().join("out"));
        config.run.output_suffix = Some(".sol".to_string());
        std::fs::create_dir_all(dir.path().join("out")).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let summary = solve_file(&config, &input, &cancel).await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.output, dir.path().join("out/sample.in.sol"));
        assert_eq!(std::fs::read_to_string(&summary.output).unwrap(), "0\n");
        assert!(format_summary(&summary).starts_with("⚠"));
    }

    #[tokio::test]
    async fn missing_input_reports_path() {
        let err = solve_file(
            &CacheGridConfig::default(),
            Path::new("/nonexistent/x.in"),
            &CancelToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("/nonexistent/x.in"));
    }

    /// Interrupt source that delivers `count` interrupts, then fails.
    fn interrupts(count: usize) -> impl FnMut() -> std::future::Ready<std::io::Result<()>> {
        let mut delivered = 0;
        move || {
            delivered += 1;
            std::future::ready(if delivered <= count {
                Ok(())
            } else {
                Err(std::io::Error::other("signal stream closed"))
            })
        }
    }

    #[tokio::test]
    async fn second_interrupt_forces_exit() {
        let cancel = CancelToken::new();
        assert!(watch_interrupts(interrupts(2), cancel.clone()).await);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn single_interrupt_only_cancels() {
        let cancel = CancelToken::new();
        assert!(!watch_interrupts(interrupts(1), cancel.clone()).await);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn unavailable_interrupts_leave_run_alone() {
        let cancel = CancelToken::new();
        assert!(!watch_interrupts(interrupts(0), cancel.clone()).await);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn solve_without_inputs_fails() {
        let err = solve(&CacheGridConfig::default(), Vec::new(), Format::Text)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no input files"));
    }
}
