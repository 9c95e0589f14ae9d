use crate::error::QueryError;
use crate::record::PlayEvent;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use log::debug;
use regex::Regex;
use std::borrow::Borrow;
use std::sync::OnceLock;

/// Formats tried, in order, when a timestamp is not RFC 3339.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a query date given as `YYYYMMDD`. Anything other than exactly 8 ASCII digits, or a
/// date that does not exist in the calendar, is rejected.
pub fn parse_query_date(s: &str) -> Result<NaiveDate, QueryError> {
    fn re_query_date() -> &'static Regex {
        static RE_QUERY_DATE: OnceLock<Regex> = OnceLock::new();
        RE_QUERY_DATE.get_or_init(|| {
            Regex::new(r"^(\d{4})(\d{2})(\d{2})$").expect("Failed to compile RE_QUERY_DATE regex")
        })
    }
    let captures = match re_query_date().captures(s) {
        Some(v) => v,
        None => return Err(QueryError::InvalidDate(s.to_string())),
    };
    // The regex guarantees plain digits, so these parses cannot overflow
    let year = captures[1].parse::<i32>().map_err(|_| QueryError::InvalidDate(s.to_string()))?;
    let month = captures[2].parse::<u32>().map_err(|_| QueryError::InvalidDate(s.to_string()))?;
    let day = captures[3].parse::<u32>().map_err(|_| QueryError::InvalidDate(s.to_string()))?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| QueryError::InvalidDate(s.to_string()))
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, QueryError> {
        if start > end {
            return Err(QueryError::InvertedRange {
                start: start.format("%Y%m%d").to_string(),
                end: end.format("%Y%m%d").to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Builds a range from two optional `YYYYMMDD` strings. Empty strings count as absent.
    /// No bounds means no range; a single bound is an error.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>, QueryError> {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());
        let start = start.map(parse_query_date).transpose()?;
        let end = end.map(parse_query_date).transpose()?;
        match (start, end) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(QueryError::MissingBound("end")),
            (None, Some(_)) => Err(QueryError::MissingBound("start")),
            (Some(start), Some(end)) => Self::new(start, end).map(Some),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `YYYYMMDD-YYYYMMDD`, as used in export file names.
    pub fn label(&self) -> String {
        format!("{}-{}", self.start.format("%Y%m%d"), self.end.format("%Y%m%d"))
    }
}

/// The calendar date formed by the first 10 characters of a timestamp.
pub fn record_date(timestamp: &str) -> Option<NaiveDate> {
    let head = match timestamp.char_indices().nth(10) {
        Some((i, _)) => &timestamp[..i],
        None => timestamp,
    };
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Parses a whole timestamp. Offsets are kept as written: the result holds the wall-clock time
/// of the timestamp itself, not a conversion to UTC or the local zone.
pub fn parse_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    let ts = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.naive_local());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// The `YYYY-MM` key of a timestamp's own year and month.
pub fn month_key(timestamp: &str) -> Option<String> {
    parse_timestamp(timestamp).map(|dt| format!("{:04}-{:02}", dt.year(), dt.month()))
}

/// Keeps the records whose calendar date lies within `[start, end]`, preserving order. If either
/// bound is absent every record is kept, including ones with broken timestamps.
pub fn filter_by_date<R: Borrow<PlayEvent>>(
    records: &[R],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<&PlayEvent> {
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        _ => return records.iter().map(Borrow::borrow).collect(),
    };
    records.iter()
        .map(Borrow::borrow)
        .filter(|record| match record.date() {
            Some(date) => start <= date && date <= end,
            None => {
                debug!("Skipping record with invalid timestamp '{}' in date filter", record.timestamp);
                false
            },
        })
        .collect()
}

/// `filter_by_date` for an optional, already validated range.
pub fn filter_by_range<'a, R: Borrow<PlayEvent>>(records: &'a [R], range: Option<&DateRange>) -> Vec<&'a PlayEvent> {
    filter_by_date(records, range.map(DateRange::start), range.map(DateRange::end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use crate::record::normalize;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn events(timestamps: &[&str]) -> Vec<PlayEvent> {
        timestamps.iter()
            .map(|ts| normalize(&json!({ "ts": ts }), Locale::ZhTw.labels()))
            .collect()
    }

    #[test]
    fn parses_valid_query_dates() {
        assert_eq!(parse_query_date("20230102"), Ok(ymd(2023, 1, 2)));
        assert_eq!(parse_query_date("20240229"), Ok(ymd(2024, 2, 29)));
    }

    #[test]
    fn rejects_malformed_query_dates() {
        for bad in ["2023012", "2023-01-02", "2023010a", "202301021", "", "20230229", "20231301", "20230100"] {
            assert_eq!(parse_query_date(bad), Err(QueryError::InvalidDate(bad.to_string())), "{bad}");
        }
    }

    #[test]
    fn range_requires_both_bounds_in_order() {
        assert_eq!(DateRange::parse(None, Some("")), Ok(None));
        assert_eq!(DateRange::parse(Some("20230101"), None), Err(QueryError::MissingBound("end")));
        assert_eq!(DateRange::parse(None, Some("20230101")), Err(QueryError::MissingBound("start")));
        assert!(matches!(
            DateRange::parse(Some("20230105"), Some("20230101")),
            Err(QueryError::InvertedRange { .. })
        ));
        let range = DateRange::parse(Some("20230101"), Some("20230131")).unwrap().unwrap();
        assert_eq!(range.label(), "20230101-20230131");
    }

    #[test]
    fn record_date_uses_first_ten_characters() {
        assert_eq!(record_date("2023-01-02T23:59:59Z"), Some(ymd(2023, 1, 2)));
        assert_eq!(record_date("2023-01-02"), Some(ymd(2023, 1, 2)));
        assert_eq!(record_date("garbage"), None);
        assert_eq!(record_date(""), None);
    }

    #[test]
    fn month_key_keeps_timestamp_offset() {
        assert_eq!(month_key("2023-01-31T23:30:00-05:00").as_deref(), Some("2023-01"));
        assert_eq!(month_key("2023-02-01T00:10:00Z").as_deref(), Some("2023-02"));
        assert_eq!(month_key("2023-03-04 05:06:07").as_deref(), Some("2023-03"));
        assert_eq!(month_key("2023-04-05").as_deref(), Some("2023-04"));
        assert_eq!(month_key("not a date"), None);
    }

    #[test]
    fn filter_is_inclusive_at_both_bounds() {
        let records = events(&[
            "2023-01-01T23:59:59Z",
            "2023-01-02T00:00:00Z",
            "2023-01-05T12:00:00Z",
            "2023-01-10T23:59:59Z",
            "2023-01-11T00:00:00Z",
        ]);
        let kept = filter_by_date(&records, Some(ymd(2023, 1, 2)), Some(ymd(2023, 1, 10)));
        let kept: Vec<&str> = kept.iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(kept, ["2023-01-02T00:00:00Z", "2023-01-05T12:00:00Z", "2023-01-10T23:59:59Z"]);
    }

    #[test]
    fn equal_bounds_select_a_single_day() {
        let records = events(&["2023-01-01T10:00:00Z", "2023-01-02T10:00:00Z", "2023-01-02T22:00:00Z"]);
        let kept = filter_by_date(&records, Some(ymd(2023, 1, 2)), Some(ymd(2023, 1, 2)));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn missing_bound_passes_everything_through() {
        let records = events(&["2023-01-01T10:00:00Z", "broken"]);
        assert_eq!(filter_by_date(&records, None, Some(ymd(2000, 1, 1))).len(), 2);
        assert_eq!(filter_by_date(&records, Some(ymd(2000, 1, 1)), None).len(), 2);
    }

    #[test]
    fn broken_timestamps_are_dropped_when_filtering() {
        let records = events(&["broken", "", "2023-01-01T10:00:00Z"]);
        let kept = filter_by_date(&records, Some(ymd(2022, 1, 1)), Some(ymd(2024, 1, 1)));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].timestamp, "2023-01-01T10:00:00Z");
    }

    #[test]
    fn filters_borrowed_records_too() {
        let records = events(&["2023-01-01T10:00:00Z", "2023-02-01T10:00:00Z"]);
        let refs: Vec<&PlayEvent> = records.iter().collect();
        let range = DateRange::new(ymd(2023, 2, 1), ymd(2023, 2, 28)).unwrap();
        assert_eq!(filter_by_range(&refs, Some(&range)).len(), 1);
    }
}
