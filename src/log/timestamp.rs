use chrono::{DateTime, Local, TimeZone};

/// Layout of the timestamp written into every line header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d :: %H:%M:%S%.3f";

/// Current local time, e.g. `2025-11-02 :: 02:30:45.017`.
#[must_use]
pub fn now_time() -> String {
    format_time(&Local::now())
}

#[must_use]
pub fn format_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use chrono::Utc;

    #[test]
    fn formats_date_time_and_millis() {
        let at = Utc.with_ymd_and_hms(2025, 11, 2, 2, 30, 45).unwrap()
            + chrono::Duration::milliseconds(17);
        assert_eq!(format_time(&at), "2025-11-02 :: 02:30:45.017");
    }

    #[test]
    fn now_has_fixed_width() {
        assert_eq!(now_time().len(), "2025-11-02 :: 02:30:45.017".len());
    }
}
