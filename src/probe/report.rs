use std::io::{self, Write};

use super::runner::ProbeSummary;

pub const DEFAULT_PERCENTILES: [f64; 3] = [50.0, 90.0, 99.0];

const HISTOGRAM_TITLE: &str = "response time (in ms)";

/// Share of failed attempts in percent, `0.0` when nothing was attempted.
pub fn error_percent(errors: u64, successes: u64) -> f64 {
    let total = errors + successes;
    if total == 0 {
        return 0.0;
    }
    100.0 * errors as f64 / total as f64
}

/// Totals, error rate and latency distribution of a finished run.
pub fn render_report(summary: &ProbeSummary, percentiles: &[f64], out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{} errors ({:.2}%), {} success.",
        summary.errors,
        error_percent(summary.errors, summary.successes),
        summary.successes
    )?;

    let run_time = summary.finished_at - summary.started_at;
    writeln!(
        out,
        "# {} attempts in {:.3}s{}",
        summary.attempts(),
        run_time.num_milliseconds() as f64 / 1000.0,
        if summary.cancelled { " (interrupted)" } else { "" }
    )?;

    let mut data = summary.histogram.export();
    data.calc_percentiles(percentiles);
    data.print(out, HISTOGRAM_TITLE)
}
