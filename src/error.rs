/// Errors raised while constructing a [`crate::predicate::Predicate`] from a
/// declarative [`crate::predicate::PredicateDescription`].
///
/// These are always surfaced synchronously to the caller: a subscriber that
/// sends a malformed filter is closed, and a query request that supplies one
/// gets an HTTP 500 naming the problem. Evaluation itself never produces an
/// error — see [`crate::predicate::Predicate::matches`].
#[derive(thiserror::Error, Debug)]
pub enum PredicateError {
    #[error("unknown predicate type: {0}")]
    UnknownType(String),

    #[error("missing required field '{field}' for predicate type '{ty}'")]
    MissingField { ty: &'static str, field: &'static str },

    #[error("invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid ISO-8601 timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Errors raised by the retention store.
///
/// `initialize` failures are fatal to startup; `store_event` failures are
/// logged and drop the event from retention only, never from the fan-out
/// path.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("event has no derivable ingestion timestamp (neither message.timestamp nor header.gatewayTimestamp present)")]
    MissingTimestamp,

    #[error("backend error: {0}")]
    Backend(#[from] mongodb::error::Error),

    #[error("failed to encode event as a BSON document: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("failed to decode a stored document back to JSON: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("invalid predicate: {0}")]
    Predicate(#[from] PredicateError),
}
