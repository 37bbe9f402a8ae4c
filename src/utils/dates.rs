use chrono::{DateTime as ChronoDateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use mongodb::bson::DateTime;

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp. Timestamps are reduced to
/// their UTC calendar day.
pub fn parse_service_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    ChronoDateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// 00:00 UTC of `day` as a BSON timestamp.
pub fn start_of_day(day: NaiveDate) -> DateTime {
    let midnight = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
    DateTime::from_millis(midnight.timestamp_millis())
}

/// `[start, end)` bounds covering the whole of `day`.
pub fn day_bounds(day: NaiveDate) -> (DateTime, DateTime) {
    let start = start_of_day(day);
    let end = DateTime::from_millis(start.timestamp_millis() + Duration::days(1).num_milliseconds());
    (start, end)
}

pub fn to_chrono(value: DateTime) -> ChronoDateTime<Utc> {
    ChronoDateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_dates_and_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(parse_service_date("2025-03-14"), Some(expected));
        assert_eq!(parse_service_date("2025-03-14T09:30:00Z"), Some(expected));
        assert_eq!(parse_service_date(" 2025-03-14 "), Some(expected));
    }

    #[test]
    fn offsets_are_folded_into_utc_day() {
        // 01:00 at +05:00 is still the previous day in UTC
        let parsed = parse_service_date("2025-03-14T01:00:00+05:00");
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2025, 3, 13));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_service_date("tomorrow"), None);
        assert_eq!(parse_service_date("2025-13-40"), None);
        assert_eq!(parse_service_date(""), None);
    }

    #[test]
    fn day_bounds_span_exactly_one_day() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let (start, end) = day_bounds(day);
        assert_eq!(end.timestamp_millis() - start.timestamp_millis(), 86_400_000);
        assert_eq!(to_chrono(start).date_naive(), day);
        assert_eq!(to_chrono(end).date_naive(), day.succ_opt().unwrap());
    }
}
