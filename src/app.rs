use std::io::Write;

use anyhow::Context;

use crate::config::{AppConfig, resolve_server};
use crate::dns_probe::prelude::*;
use crate::probe::{CancelSignal, ProbeLoop, ProbeSettings, ProbeSummary, render_report};
use crate::stats::Histogram;

/// One complete run: build the query, query the server until done or cancelled and
/// write the report to `out`.
pub async fn run<E: Exchanger>(
    config: &AppConfig,
    exchanger: &E,
    signal: &mut CancelSignal,
    out: &mut impl Write,
) -> anyhow::Result<ProbeSummary> {
    let record_type = parse_record_type(&config.query_type)?;
    let query = build_query(&config.query_name, record_type)?;
    let histogram = Histogram::new(config.histogram_offset, config.histogram_resolution)
        .context("Invalid histogram settings")?;
    let server = resolve_server(&config.server_host, config.port).await?;

    log::info!(
        "Will query server: {} for {} ({}) record for {}",
        config.server_label(),
        record_type,
        u16::from(record_type),
        config.query_name
    );
    log::debug!("Query is: {:?}", query);

    let settings = ProbeSettings {
        server,
        query,
        count: config.count,
        interval: config.interval,
    };
    let summary = ProbeLoop::new(settings, histogram).run(exchanger, signal).await;

    if summary.cancelled {
        // keep the summary off the ^C line
        writeln!(out).context("Failed to write report")?;
    }
    render_report(&summary, &config.percentiles, out).context("Failed to write report")?;
    Ok(summary)
}

/// Process exit status for a finished run. An interrupted run that printed
/// its summary is a success.
pub fn exit_status<T>(result: &anyhow::Result<T>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use trust_dns_resolver::proto::op::ResponseCode;

    use super::*;
    use crate::config::ProbeConfig;
    use crate::probe::cancel;
    use crate::probe::testing::{Reply, ScriptedExchanger};

    fn config(count: u64, query_type: &str) -> AppConfig {
        let defaults = ProbeConfig::default();
        AppConfig {
            query_name: "example.com.".to_string(),
            server_host: "127.0.0.1".to_string(),
            port: defaults.port,
            interval: Duration::from_millis(100),
            count,
            query_type: query_type.to_string(),
            timeout: defaults.timeout,
            histogram_offset: defaults.histogram_offset,
            histogram_resolution: defaults.histogram_resolution,
            percentiles: defaults.percentiles,
            verbose: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_record_type_fails_with_status_one() {
        let exchanger = ScriptedExchanger::new(vec![]);
        let (_handle, mut signal) = cancel::channel();
        let mut out = Vec::new();

        let result = run(&config(1, "BOGUS"), &exchanger, &mut signal, &mut out).await;

        assert!(result.is_err());
        assert_eq!(exit_status(&result), 1);
        assert!(exchanger.call_times().is_empty());
        assert!(out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_run_prints_summary_and_exits_zero() {
        let (handle, mut signal) = cancel::channel();
        let exchanger = ScriptedExchanger::new(vec![]).cancelling_after(2, handle);
        let mut out = Vec::new();

        let result = run(&config(0, "A"), &exchanger, &mut signal, &mut out).await;

        assert_eq!(exit_status(&result), 0);
        let summary = result.unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.attempts(), 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with('\n'));
        assert!(text.contains("0 errors (0.00%), 2 success."));
        assert!(text.contains("(interrupted)"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_attempts_still_exit_zero() {
        let exchanger = ScriptedExchanger::new(vec![
            (Duration::from_millis(5), Reply::Transport),
            (Duration::from_millis(5), Reply::Code(ResponseCode::ServFail)),
        ]);
        let (_handle, mut signal) = cancel::channel();
        let mut out = Vec::new();

        let result = run(&config(2, "AAAA"), &exchanger, &mut signal, &mut out).await;

        assert_eq!(exit_status(&result), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("2 errors (100.00%), 0 success."));
        assert!(!text.contains("(interrupted)"));
    }
}
