use thiserror::Error;

/// Misuse of caller-supplied query parameters. These are rejected before any aggregation runs;
/// problems inside individual records never surface as errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid date '{0}', expected YYYYMMDD")]
    InvalidDate(String),

    #[error("start date {start} is later than end date {end}")]
    InvertedRange { start: String, end: String },

    #[error("missing {0} date, a date range needs both bounds")]
    MissingBound(&'static str),

    #[error("invalid ranking field '{0}'")]
    InvalidRankingField(String),

    #[error("invalid ranking metric '{0}', expected count, duration or avg_duration")]
    InvalidMetric(String),

    #[error("invalid trend kind '{0}'")]
    InvalidTrendKind(String),

    #[error("unsupported locale '{0}'")]
    InvalidLocale(String),
}
