//! Report driver: runs every collector once, in order, and streams each
//! section to the output as soon as it is ready.
//!
//! One failed section never stops the run. The driver records the failure,
//! prints a warning in the section's place, and moves on; the summary and
//! the exit code carry the tally.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use tracing::{info, warn};

use crate::collectors::SectionKind;
use crate::probe::SystemProbe;
use crate::render;

pub struct RunSummary {
    pub collected: usize,
    pub failed: Vec<&'static str>,
}

impl RunSummary {
    /// 0 when everything collected, 1 for a partial report, 2 when nothing
    /// could be collected at all.
    pub fn exit_code(&self) -> i32 {
        if self.failed.is_empty() {
            0
        } else if self.collected == 0 {
            2
        } else {
            1
        }
    }
}

pub async fn run(probe: &dyn SystemProbe, out: &mut dyn Write) -> Result<RunSummary> {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".into());

    writeln!(out, "{} {}", "═══ Host Inventory ═══".cyan().bold(), host.bold())?;

    let mut collected = 0usize;
    let mut failed: Vec<&'static str> = Vec::new();

    for kind in SectionKind::ORDER {
        writeln!(out)?;
        writeln!(out, "{}", format!("── {} ──", kind.title()).cyan())?;
        match kind.collect(probe).await {
            Ok(data) => {
                collected += 1;
                out.write_all(render::render_section(kind, &data).as_bytes())?;
            }
            Err(err) => {
                warn!(section = kind.title(), error = %err, "section failed");
                failed.push(kind.title());
                writeln!(
                    out,
                    "  {} could not collect this section: {}",
                    "warning:".yellow().bold(),
                    err
                )?;
            }
        }
        // Sections already rendered stay visible even if a later one hangs
        // the process.
        out.flush()?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "── Summary ──".cyan())?;
    let total = SectionKind::ORDER.len();
    if failed.is_empty() {
        writeln!(out, "  {}", format!("all {total} sections collected").green())?;
    } else {
        writeln!(out, "  {collected} of {total} sections collected")?;
        writeln!(out, "  {} {}", "failed:".red().bold(), failed.join(", "))?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("Report generated at {}", Utc::now().to_rfc3339()).dimmed()
    )?;
    out.flush()?;

    info!(collected, failed = failed.len(), "report complete");
    Ok(RunSummary { collected, failed })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(collected: usize, failed: Vec<&'static str>) -> RunSummary {
        RunSummary { collected, failed }
    }

    #[test]
    fn exit_code_reflects_partial_and_total_failure() {
        assert_eq!(summary(10, vec![]).exit_code(), 0);
        assert_eq!(summary(9, vec!["Security Posture"]).exit_code(), 1);
        assert_eq!(
            summary(0, SectionKind::ORDER.iter().map(|k| k.title()).collect()).exit_code(),
            2
        );
    }
}
