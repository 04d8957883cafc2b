//! Output for the zonewalk CLI.
//!
//! Discovered names go to stdout, one per line, as soon as they are found.
//! Everything meant for a human goes to stderr so stdout stays pipeable.

use console::style;
use std::io::{self, Write};
use std::time::Duration;
use zonewalk_lib::{DispatchSummary, IngestSummary, NameSink, WalkStatsSnapshot};

/// Writes every discovered name to stdout.
///
/// Each name is written under the stdout lock, so lines from concurrent
/// chains never interleave. In verbose mode names are labelled so they stand
/// out among the diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink {
    pub verbose: bool,
}

impl NameSink for StdoutSink {
    fn emit(&self, name: &str) {
        let mut out = io::stdout().lock();
        // A closed pipe only means the reader is gone; the walk still ends normally.
        let _ = if self.verbose {
            writeln!(out, "Next Domain: {}", name)
        } else {
            writeln!(out, "{}", name)
        };
    }
}

/// Print the one-line banner shown in verbose mode.
pub fn print_header(resolvers: usize, concurrency: usize, retries: u32, timeout: Duration, online: bool) {
    eprintln!(
        "{} {} {}",
        style("zonewalk").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(header_details(resolvers, concurrency, retries, timeout, online)).dim(),
    );
}

fn header_details(resolvers: usize, concurrency: usize, retries: u32, timeout: Duration, online: bool) -> String {
    format!(
        "| {} resolver{} ({}) | {} workers | {} retries | {}ms timeout",
        resolvers,
        if resolvers == 1 { "" } else { "s" },
        if online { "online feed" } else { "static" },
        concurrency,
        retries,
        timeout.as_millis()
    )
}

/// Print the end-of-run summary.
pub fn print_summary(
    stats: &WalkStatsSnapshot,
    ingest: Option<&IngestSummary>,
    dispatch: &DispatchSummary,
    elapsed: Duration,
) {
    eprintln!();
    eprintln!(
        "{} {} discovered in {} chain{} ({:.1}s)",
        style("Done:").bold(),
        style(stats.discovered).green().bold(),
        dispatch.chains,
        if dispatch.chains == 1 { "" } else { "s" },
        elapsed.as_secs_f64()
    );

    eprintln!(
        "  {} queries, {} failed, {} abandoned, {} loops",
        stats.queries,
        if stats.failures > 0 {
            style(stats.failures).yellow()
        } else {
            style(stats.failures).dim()
        },
        if stats.abandoned > 0 {
            style(stats.abandoned).red()
        } else {
            style(stats.abandoned).dim()
        },
        stats.loops_detected
    );

    if let Some(ingest) = ingest {
        if ingest.duplicates > 0 || ingest.invalid > 0 {
            eprintln!(
                "  {} seed{} read, {} duplicate, {} invalid",
                ingest.submitted,
                if ingest.submitted == 1 { "" } else { "s" },
                ingest.duplicates,
                ingest.invalid
            );
        }
    }
}
