/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    /// The exchange itself failed (unreachable, timeout, garbled reply) or
    /// produced no response at all.
    TransportError,
    /// A response came back with a non-success response code.
    ProtocolError,
}

/// Result of one iteration of the probe loop, consumed right away by the
/// counters and the histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub index: u64,
    pub elapsed_ms: f64,
    pub kind: OutcomeKind,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }
}
