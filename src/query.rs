use crate::date::{filter_by_range, DateRange};
use crate::error::QueryError;
use crate::locale::Labels;
use crate::rank::{rank, GroupBy, Limit, Metric, RankedEntry};
use crate::record::PlayEvent;
use crate::trend::{analyze_trend, top_n_limit, TrendKind, TrendPoint, DEFAULT_TOP_N};
use log::debug;
use std::borrow::Borrow;

/// Query parameters as the user typed them.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<'a> {
    /// `YYYYMMDD`
    pub start: Option<&'a str>,
    /// `YYYYMMDD`
    pub end: Option<&'a str>,
    pub group_by: &'a str,
    /// `"all"` or a positive number.
    pub limit: &'a str,
    pub metric: &'a str,
    /// `"none"` or a trend kind.
    pub trend: &'a str,
    /// Entries per month of a top songs/artists trend.
    pub top_n: &'a str,
}

/// A validated analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub range: Option<DateRange>,
    pub group_by: GroupBy,
    pub limit: Limit,
    pub metric: Metric,
    pub trend: Option<TrendKind>,
    pub top_n: Limit,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            range: None,
            group_by: GroupBy::TrackArtist,
            limit: Limit::All,
            metric: Metric::Count,
            trend: None,
            top_n: Limit::Top(DEFAULT_TOP_N),
        }
    }
}

/// Result of running a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    Ranking(Vec<RankedEntry>),
    Trend(Vec<TrendPoint>),
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Ranking(entries) => entries.is_empty(),
            Self::Trend(points) => points.is_empty(),
        }
    }
}

impl Query {
    /// Validates user input. Dates and selectors must be well formed; an unusable limit only
    /// falls back to "all". Empty strings select the defaults.
    pub fn parse(params: &QueryParams) -> Result<Self, QueryError> {
        let range = DateRange::parse(params.start, params.end)?;
        let group_by = match params.group_by.trim() {
            "" => GroupBy::TrackArtist,
            s => s.parse()?,
        };
        let metric = match params.metric.trim() {
            "" => Metric::Count,
            s => s.parse()?,
        };
        let limit = match params.limit.trim() {
            "" => Limit::All,
            s => Limit::parse(s),
        };
        let trend = TrendKind::parse_selector(params.trend)?;
        let top_n = top_n_limit(params.top_n);
        Ok(Self { range, group_by, limit, metric, trend, top_n })
    }

    /// Filters by the date range, then either analyzes the trend or ranks.
    pub fn run<R: Borrow<PlayEvent>>(&self, records: &[R], labels: &Labels) -> Analysis {
        let filtered = filter_by_range(records, self.range.as_ref());
        debug!("{} of {} records within the date range", filtered.len(), records.len());
        match self.trend {
            Some(kind) => Analysis::Trend(analyze_trend(&filtered, kind, self.top_n, labels)),
            None => Analysis::Ranking(rank(&filtered, self.group_by, self.limit, self.metric, labels)),
        }
    }
}
