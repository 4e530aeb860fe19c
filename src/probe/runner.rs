use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{Instant, sleep};
use trust_dns_resolver::proto::op::{Message, ResponseCode};
use trust_dns_resolver::proto::rr::Record;

use super::cancel::CancelSignal;
use crate::dns_probe::prelude::*;
use crate::stats::Histogram;

/// What a run is asked to do.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub server: SocketAddr,
    pub query: Message,
    /// Number of attempts; `0` keeps going until cancelled.
    pub count: u64,
    pub interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Running,
    Waiting,
    Cancelled,
    Done,
}

/// Final, read-only state of a run.
#[derive(Debug, Clone)]
pub struct ProbeSummary {
    pub successes: u64,
    pub errors: u64,
    pub cancelled: bool,
    pub histogram: Histogram,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProbeSummary {
    pub fn attempts(&self) -> u64 {
        self.successes + self.errors
    }
}

/// Sequential probe loop: one exchange per tick, never more than one in flight.
///
/// Cancellation is only observed while waiting for the next tick, so an
/// exchange that has started always completes and is counted.
pub struct ProbeLoop {
    settings: ProbeSettings,
    histogram: Histogram,
    successes: u64,
    errors: u64,
    state: ProbeState,
}

impl ProbeLoop {
    pub fn new(settings: ProbeSettings, histogram: Histogram) -> Self {
        Self {
            settings,
            histogram,
            successes: 0,
            errors: 0,
            state: ProbeState::Running,
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    pub async fn run<E: Exchanger>(mut self, exchanger: &E, signal: &mut CancelSignal) -> ProbeSummary {
        let started_at = Utc::now();
        let mut index: u64 = 1;

        while !self.exhausted(index) {
            if index > 1 && !self.wait(signal).await {
                break;
            }
            let outcome = self.attempt(exchanger, index).await;
            self.tally(&outcome);
            index += 1;
        }

        let cancelled = self.state == ProbeState::Cancelled;
        if cancelled {
            log::info!("Interrupted after {} attempts", self.successes + self.errors);
        }
        self.transition(ProbeState::Done);

        ProbeSummary {
            successes: self.successes,
            errors: self.errors,
            cancelled,
            histogram: self.histogram,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn exhausted(&self, index: u64) -> bool {
        self.settings.count > 0 && index > self.settings.count
    }

    /// Sleeps out the interval. Returns `false` when cancellation won the race.
    async fn wait(&mut self, signal: &mut CancelSignal) -> bool {
        self.transition(ProbeState::Waiting);
        tokio::select! {
            // Checked first so an interrupt that landed during the previous
            // exchange stops the run even with a zero interval.
            biased;
            _ = signal.cancelled() => {
                self.transition(ProbeState::Cancelled);
                false
            }
            _ = sleep(self.settings.interval) => {
                self.transition(ProbeState::Running);
                true
            }
        }
    }

    async fn attempt<E: Exchanger>(&self, exchanger: &E, index: u64) -> AttemptOutcome {
        let start = Instant::now();
        let result = exchanger.exchange(&self.settings.query, self.settings.server).await;
        let elapsed_ms = 1000.0 * start.elapsed().as_secs_f64();

        let kind = match result {
            Err(e) => {
                log::error!("{elapsed_ms:6.1} ms {index:3}: failed call: {e}");
                OutcomeKind::TransportError
            }
            Ok(None) => {
                log::error!("bug? dns exchange returned neither a response nor an error");
                OutcomeKind::TransportError
            }
            Ok(Some(response)) => {
                log::debug!("response is {response:?}");
                let answers = format_answers(response.answers());
                match response.response_code() {
                    ResponseCode::NoError => {
                        log::info!("{elapsed_ms:6.1} ms {index:3}: {answers}");
                        OutcomeKind::Success
                    }
                    code => {
                        log::error!("{elapsed_ms:6.1} ms {index:3}: server error: {code} {answers}");
                        OutcomeKind::ProtocolError
                    }
                }
            }
        };

        AttemptOutcome {
            index,
            elapsed_ms,
            kind,
        }
    }

    // Failed attempts are timed too, so failure latency shows up in the histogram.
    fn tally(&mut self, outcome: &AttemptOutcome) {
        self.histogram.record(outcome.elapsed_ms);
        log::trace!("attempt {} recorded as {:?}", outcome.index, outcome.kind);
        if outcome.is_success() {
            self.successes += 1;
        } else {
            self.errors += 1;
        }
    }

    fn transition(&mut self, next: ProbeState) {
        log::trace!("probe state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn format_answers(answers: &[Record]) -> String {
    let joined = answers
        .iter()
        .map(|record| record.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}
