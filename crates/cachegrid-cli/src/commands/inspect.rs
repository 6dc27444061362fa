use std::path::Path;

use anyhow::Context;
use cachegrid_core::{CatalogSummary, load_catalog};

use super::Format;

pub fn inspect(input: &Path, format: Format) -> anyhow::Result<()> {
    let catalog = load_catalog(input).with_context(|| format!("loading {}", input.display()))?;
    let summary = catalog.summary();

    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Format::Text => {
            println!("{catalog}");
            println!("{}", format_summary(&summary));
        }
    }

    Ok(())
}

fn format_summary(summary: &CatalogSummary) -> String {
    let mut out = format!(
        "  Request records: {}\n  Total requests: {}\n",
        summary.request_records, summary.total_requests
    );
    out.push_str(&format!(
        "  Total cache capacity: {} MB\n  Total video size: {} MB",
        summary.total_capacity, summary.total_video_size
    ));
    if !summary.unreachable_servers.is_empty() {
        let ids: Vec<String> = summary
            .unreachable_servers
            .iter()
            .map(|id| id.to_string())
            .collect();
        out.push_str(&format!("\n  Caches with no endpoints: {}", ids.join(", ")));
    }
    out
}
