pub mod exchange;
pub mod query;
pub mod result;

pub mod prelude {
    pub use super::exchange::{ExchangeError, Exchanger, UdpExchanger};
    pub use super::query::{QueryError, build_query, parse_record_type};
    pub use super::result::{AttemptOutcome, OutcomeKind};
}
