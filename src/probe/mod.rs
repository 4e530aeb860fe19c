pub mod cancel;
pub mod report;
pub mod runner;
#[cfg(test)]
pub(crate) mod testing;

pub use cancel::{CancelHandle, CancelSignal, install_interrupt_handler};
pub use report::{DEFAULT_PERCENTILES, render_report};
pub use runner::{ProbeLoop, ProbeSettings, ProbeSummary};
