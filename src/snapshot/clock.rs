use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};

use super::EpochMillis;

/// `YYYY-MM-DDTHH:mm:ss`, the `date_time` format data.gov.sg expects.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Renders instants as wall-clock time without an offset suffix.
///
/// With no fixed offset the process-local timezone is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalClock {
    offset: Option<FixedOffset>,
}

impl LocalClock {
    pub fn new(offset: Option<FixedOffset>) -> Self {
        Self { offset }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }

    pub fn system() -> Self {
        Self { offset: None }
    }

    /// `None` when `timestamp` is outside chrono's representable range.
    pub fn format_millis(&self, timestamp: EpochMillis) -> Option<String> {
        DateTime::<Utc>::from_timestamp_millis(timestamp).map(|instant| self.format(&instant))
    }

    pub fn format<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> String {
        match self.offset {
            Some(offset) => instant
                .with_timezone(&offset)
                .format(LOCAL_TIME_FORMAT)
                .to_string(),
            None => instant
                .with_timezone(&Local)
                .format(LOCAL_TIME_FORMAT)
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singapore() -> LocalClock {
        LocalClock::fixed(FixedOffset::east_opt(8 * 3600).unwrap())
    }

    #[test]
    fn formats_epoch_millis_in_fixed_offset() {
        // 2024-03-01T00:00:00Z
        let ts = 1_709_251_200_000;
        assert_eq!(
            singapore().format_millis(ts).as_deref(),
            Some("2024-03-01T08:00:00")
        );
        assert_eq!(
            LocalClock::fixed(FixedOffset::east_opt(0).unwrap())
                .format_millis(ts)
                .as_deref(),
            Some("2024-03-01T00:00:00")
        );
    }

    #[test]
    fn sub_second_precision_is_dropped() {
        assert_eq!(
            singapore().format_millis(1_709_251_200_999).as_deref(),
            Some("2024-03-01T08:00:00")
        );
    }

    #[test]
    fn reformats_upstream_timestamps_without_offset_suffix() {
        let captured = DateTime::parse_from_rfc3339("2024-03-01T08:00:45+08:00").unwrap();
        assert_eq!(singapore().format(&captured), "2024-03-01T08:00:45");
    }

    #[test]
    fn out_of_range_timestamp_has_no_rendering() {
        assert_eq!(singapore().format_millis(i64::MAX), None);
    }
}
