//! Deterministic date arithmetic
//!
//! The extractor's date sub-agent only recognizes *which* relative phrase
//! the user typed; the actual range is computed here, in code, against the
//! reporting timezone. Absolute dates are normalized to `YYYY-MM-DD`.

use chrono::{Datelike, Duration, NaiveDate};

use report_agent_core::UNSPECIFIED;

/// Fixed vocabulary of relative date expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeRange {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// First and last day of a month
pub fn month_bounds(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    let first = ymd(year, month, 1);
    let next_first = if month == 12 {
        ymd(year + 1, 1, 1)
    } else {
        ymd(year, month + 1, 1)
    };
    (first, next_first - Duration::days(1))
}

impl RelativeRange {
    /// Parse a phrase like "last week" / "lastweek" / "Last Week".
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "today" => Some(Self::Today),
            "yesterday" => Some(Self::Yesterday),
            "thisweek" => Some(Self::ThisWeek),
            "lastweek" => Some(Self::LastWeek),
            "thismonth" => Some(Self::ThisMonth),
            "lastmonth" => Some(Self::LastMonth),
            "thisyear" => Some(Self::ThisYear),
            "lastyear" => Some(Self::LastYear),
            _ => None,
        }
    }

    /// Resolve to a concrete (from, to) range relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Today => (today, today),
            Self::Yesterday => {
                let y = today - Duration::days(1);
                (y, y)
            }
            Self::ThisWeek => {
                let monday =
                    today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (monday, today)
            }
            Self::LastWeek => (today - Duration::days(7), today),
            Self::ThisMonth => month_bounds(today.year(), today.month()),
            Self::LastMonth => {
                let first_of_month = ymd(today.year(), today.month(), 1);
                let last_of_previous = first_of_month - Duration::days(1);
                month_bounds(last_of_previous.year(), last_of_previous.month())
            }
            Self::ThisYear => (ymd(today.year(), 1, 1), ymd(today.year(), 12, 31)),
            Self::LastYear => (ymd(today.year() - 1, 1, 1), ymd(today.year() - 1, 12, 31)),
        }
    }
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Normalize an extracted date to `YYYY-MM-DD`.
///
/// `DD/MM/YYYY` and `DD-MM-YYYY` are rewritten; values already in ISO form
/// and the `N/A` sentinel pass through unchanged, as does anything
/// unrecognizable (validation will not invent a date).
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == UNSPECIFIED {
        return trimmed.to_string();
    }
    let cleaned = trimmed.replace('/', "-");
    let parts: Vec<&str> = cleaned.split('-').collect();
    if parts.len() != 3 {
        return trimmed.to_string();
    }
    if parts[0].len() == 4 {
        return format!("{}-{:0>2}-{:0>2}", parts[0], parts[1], parts[2]);
    }
    if parts[2].len() == 4 {
        return format!("{}-{:0>2}-{:0>2}", parts[2], parts[1], parts[0]);
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_spacing_and_case_variants() {
        assert_eq!(RelativeRange::parse("last week"), Some(RelativeRange::LastWeek));
        assert_eq!(RelativeRange::parse("lastweek"), Some(RelativeRange::LastWeek));
        assert_eq!(RelativeRange::parse("This Month"), Some(RelativeRange::ThisMonth));
        assert_eq!(RelativeRange::parse("01/02/2024 to 15/02/2024"), None);
        assert_eq!(RelativeRange::parse("N/A"), None);
    }

    #[test]
    fn resolves_fixed_vocabulary() {
        // A Wednesday
        let today = day(2024, 3, 6);

        assert_eq!(RelativeRange::Today.resolve(today), (today, today));
        assert_eq!(
            RelativeRange::Yesterday.resolve(today),
            (day(2024, 3, 5), day(2024, 3, 5))
        );
        assert_eq!(
            RelativeRange::ThisWeek.resolve(today),
            (day(2024, 3, 4), today)
        );
        assert_eq!(
            RelativeRange::LastWeek.resolve(today),
            (day(2024, 2, 28), today)
        );
        assert_eq!(
            RelativeRange::ThisMonth.resolve(today),
            (day(2024, 3, 1), day(2024, 3, 31))
        );
        assert_eq!(
            RelativeRange::LastMonth.resolve(today),
            (day(2024, 2, 1), day(2024, 2, 29))
        );
        assert_eq!(
            RelativeRange::ThisYear.resolve(today),
            (day(2024, 1, 1), day(2024, 12, 31))
        );
        assert_eq!(
            RelativeRange::LastYear.resolve(today),
            (day(2023, 1, 1), day(2023, 12, 31))
        );
    }

    #[test]
    fn december_month_bounds() {
        assert_eq!(
            month_bounds(2024, 12),
            (day(2024, 12, 1), day(2024, 12, 31))
        );
    }

    #[test]
    fn normalizes_day_first_dates() {
        assert_eq!(normalize_date("01/02/2024"), "2024-02-01");
        assert_eq!(normalize_date("15-02-2024"), "2024-02-15");
        assert_eq!(normalize_date("1/2/2024"), "2024-02-01");
    }

    #[test]
    fn leaves_iso_and_sentinels_untouched() {
        assert_eq!(normalize_date("2024-02-01"), "2024-02-01");
        assert_eq!(normalize_date("N/A"), "N/A");
        assert_eq!(normalize_date("soonish"), "soonish");
    }
}
