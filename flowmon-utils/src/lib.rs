//! Shared utility functions for flowmon crates.

/// Timestamp utility functions
pub mod dates {
    use chrono::{NaiveDate, NaiveDateTime};

    /// Full timestamp format used by the monitor exports and the reports: "YYYY-MM-DD HH:MM:SS"
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Date-only format: "YYYY-MM-DD"
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Strings longer than this are parsed with [`TIMESTAMP_FORMAT`].
    const DATE_ONLY_MAX_LEN: usize = 11;

    /// Format a NaiveDateTime as "YYYY-MM-DD HH:MM:SS"
    pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
        timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Parse a monitor timestamp.
    ///
    /// Accepts either "YYYY-MM-DD HH:MM:SS" or a bare "YYYY-MM-DD", which is
    /// taken as midnight of that day. Surrounding whitespace is ignored.
    pub fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
        let s = s.trim();
        if s.len() > DATE_ONLY_MAX_LEN {
            Ok(NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)?)
        } else {
            let date = NaiveDate::parse_from_str(s, DATE_FORMAT)?;
            date.and_hms_opt(0, 0, 0)
                .ok_or_else(|| anyhow::anyhow!("no midnight for {}", date))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::{NaiveDate, Timelike};

        #[test]
        fn test_parse_long_timestamp() {
            let ts = parse_timestamp("2021-03-04 05:06:07").unwrap();
            assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2021, 3, 4).unwrap());
            assert_eq!((ts.hour(), ts.minute(), ts.second()), (5, 6, 7));
        }

        #[test]
        fn test_parse_date_only_is_midnight() {
            let ts = parse_timestamp("2021-03-04").unwrap();
            assert_eq!(
                ts,
                NaiveDate::from_ymd_opt(2021, 3, 4)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            );
        }

        #[test]
        fn test_parse_trims_whitespace() {
            let ts = parse_timestamp("  2021-03-04 00:15:00\r").unwrap();
            assert_eq!(ts.minute(), 15);
        }

        #[test]
        fn test_parse_rejects_garbage() {
            assert!(parse_timestamp("yesterday").is_err());
            assert!(parse_timestamp("2021-13-01 00:00:00").is_err());
            assert!(parse_timestamp("").is_err());
        }

        #[test]
        fn test_format_round_trip() {
            let ts = parse_timestamp("2022-11-12 23:45:00").unwrap();
            assert_eq!(format_timestamp(&ts), "2022-11-12 23:45:00");
        }
    }
}

/// Decimal rounding helpers
pub mod numbers {
    /// Round to `digits` decimals. Exact ties go to the even digit.
    pub fn round_to(value: f64, digits: i32) -> f64 {
        let factor = 10f64.powi(digits);
        (value * factor).round_ties_even() / factor
    }

}
