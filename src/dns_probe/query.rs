use std::str::FromStr;

use thiserror::Error;
use trust_dns_resolver::proto::error::ProtoError;
use trust_dns_resolver::proto::op::{Message, MessageType, OpCode, Query};
use trust_dns_resolver::proto::rr::{Name, RecordType};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid type name {0:?}")]
    UnknownRecordType(String),
    #[error("Invalid query name {name:?}: {source}")]
    InvalidName {
        name: String,
        #[source]
        source: ProtoError,
    },
}

/// Resolve a record type token such as `A`, `AAAA` or `SOA`.
///
/// Matching is case sensitive, the way record types are spelled in zone files.
pub fn parse_record_type(token: &str) -> Result<RecordType, QueryError> {
    match RecordType::from_str(token) {
        Ok(RecordType::Unknown(_)) | Err(_) => Err(QueryError::UnknownRecordType(token.to_string())),
        Ok(record_type) => Ok(record_type),
    }
}

/// Build the recursive query sent on every attempt. The name is made fully
/// qualified when it is not already.
pub fn build_query(name: &str, record_type: RecordType) -> Result<Message, QueryError> {
    let fqdn = if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    };
    let name = Name::from_ascii(&fqdn).map_err(|source| QueryError::InvalidName {
        name: name.to_string(),
        source,
    })?;

    let mut message = Message::new();
    message
        .set_id(rand::random::<u16>())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(name, record_type));
    Ok(message)
}
