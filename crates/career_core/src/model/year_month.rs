//! Month-granularity calendar arithmetic.
//!
//! # Responsibility
//! - Parse `YYYY-MM` text (and `YYYY-MM-DD`, truncated to the month).
//! - Validate ranges, compute month spans and render them for display.
//!
//! # Invariants
//! - Day-of-month is never tracked.
//! - Ordering is year-major, month-minor; derived `Ord` relies on field order.
//! - Plural suffixes are added only for quantities greater than one.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use time::{Date, OffsetDateTime};

static YEAR_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})(?:-\d{1,2})?$").expect("valid year-month regex")
});

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Label rendered for an open-ended (ongoing) date.
pub const PRESENT_LABEL: &str = "Present";

/// Error returned when year-month text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearMonthParseError {
    /// Text does not look like `YYYY-MM`.
    Malformed(String),
    /// Month component is outside `1..=12`.
    MonthOutOfRange(u32),
}

impl Display for YearMonthParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => write!(f, "invalid year-month `{value}`; expected YYYY-MM"),
            Self::MonthOutOfRange(month) => write!(f, "month {month} is outside 1..=12"),
        }
    }
}

impl Error for YearMonthParseError {}

/// Calendar month without a day component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u8,
}

impl YearMonth {
    /// Builds a year-month, rejecting months outside `1..=12`.
    pub fn new(year: i32, month: u8) -> Result<Self, YearMonthParseError> {
        if !(1..=12).contains(&month) {
            return Err(YearMonthParseError::MonthOutOfRange(u32::from(month)));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u8 {
        self.month
    }

    /// Returns the current calendar month.
    ///
    /// Uses the local offset when the platform can report it, UTC otherwise.
    pub fn current() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::from_date(now.date())
    }

    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    /// Signed number of months from `self` to `end`.
    pub fn months_until(self, end: YearMonth) -> i64 {
        (i64::from(end.year) - i64::from(self.year)) * 12
            + (i64::from(end.month) - i64::from(self.month))
    }

    /// Short English rendering, e.g. `Mar 2024`.
    pub fn short_label(self) -> String {
        let name = MONTH_ABBREVIATIONS[usize::from(self.month - 1)];
        format!("{name} {}", self.year)
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = YearMonthParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let caps = YEAR_MONTH_RE
            .captures(trimmed)
            .ok_or_else(|| YearMonthParseError::Malformed(trimmed.to_string()))?;
        let year = caps[1]
            .parse::<i32>()
            .map_err(|_| YearMonthParseError::Malformed(trimmed.to_string()))?;
        let month = caps[2]
            .parse::<u32>()
            .map_err(|_| YearMonthParseError::Malformed(trimmed.to_string()))?;
        let month = u8::try_from(month).map_err(|_| YearMonthParseError::MonthOutOfRange(month))?;
        Self::new(year, month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Deserializes an optional end date, treating `null` and `""` as ongoing.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<YearMonth>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Start/end pair with the open end already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: YearMonth,
    pub end: YearMonth,
}

impl MonthRange {
    /// Month difference clamped at zero.
    pub fn months(&self) -> u32 {
        clamp_months(self.start.months_until(self.end))
    }
}

/// Parses a range, resolving a missing (or blank) `end` to `today`.
pub fn parse_range(
    start: &str,
    end: Option<&str>,
    today: YearMonth,
) -> Result<MonthRange, YearMonthParseError> {
    let start = start.parse::<YearMonth>()?;
    let end = match non_blank(end) {
        Some(value) => value.parse::<YearMonth>()?,
        None => today,
    };
    Ok(MonthRange { start, end })
}

/// Checks raw form input before any store mutation.
///
/// Returns `false` when `start` is absent or unparseable, when `end` is
/// unparseable, or when `end` precedes `start`.
pub fn is_valid_range(start: Option<&str>, end: Option<&str>) -> bool {
    let Some(start) = non_blank(start) else {
        return false;
    };
    let Ok(start) = start.parse::<YearMonth>() else {
        return false;
    };
    match non_blank(end) {
        None => true,
        Some(end) => end
            .parse::<YearMonth>()
            .map(|end| is_ordered(start, Some(end)))
            .unwrap_or(false),
    }
}

/// Typed form of [`is_valid_range`].
pub fn is_ordered(start: YearMonth, end: Option<YearMonth>) -> bool {
    end.map_or(true, |end| end >= start)
}

/// Months between `start` and `end` (or `today` when ongoing), clamped at 0.
pub fn duration_months(start: YearMonth, end: Option<YearMonth>, today: YearMonth) -> u32 {
    clamp_months(start.months_until(end.unwrap_or(today)))
}

/// Renders a month count: `0 months`, `1 month`, `2 years, 3 months`.
pub fn format_duration(months: u32) -> String {
    if months == 0 {
        return "0 months".to_string();
    }
    if months < 12 {
        return plural(months, "month");
    }

    let years = months / 12;
    let remaining = months % 12;
    let mut rendered = plural(years, "year");
    if remaining > 0 {
        rendered.push_str(", ");
        rendered.push_str(&plural(remaining, "month"));
    }
    rendered
}

/// Renders the span of a dated entity; sub-month spans read `< 1 month`.
pub fn format_span(start: YearMonth, end: Option<YearMonth>, today: YearMonth) -> String {
    match duration_months(start, end, today) {
        0 => "< 1 month".to_string(),
        months => format_duration(months),
    }
}

/// Renders a date for display, `Present` when absent.
pub fn format_date(value: Option<YearMonth>) -> String {
    value.map_or_else(|| PRESENT_LABEL.to_string(), YearMonth::short_label)
}

/// Renders `Jan 2020 - Present` style ranges.
pub fn format_date_range(start: YearMonth, end: Option<YearMonth>) -> String {
    format!("{} - {}", format_date(Some(start)), format_date(end))
}

fn plural(quantity: u32, unit: &str) -> String {
    if quantity > 1 {
        format!("{quantity} {unit}s")
    } else {
        format!("{quantity} {unit}")
    }
}

fn clamp_months(months: i64) -> u32 {
    u32::try_from(months.max(0)).unwrap_or(u32::MAX)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        duration_months, format_date, format_date_range, format_duration, format_span,
        is_valid_range, parse_range, YearMonth, YearMonthParseError,
    };

    fn ym(text: &str) -> YearMonth {
        text.parse().expect("valid year-month literal")
    }

    #[test]
    fn parse_accepts_month_and_full_date_shapes() {
        assert_eq!(ym("2023-01"), YearMonth::new(2023, 1).unwrap());
        assert_eq!(ym("2023-01-15"), YearMonth::new(2023, 1).unwrap());
        assert_eq!(ym(" 2024-7 ").to_string(), "2024-07");
    }

    #[test]
    fn parse_rejects_garbage_and_bad_months() {
        assert!(matches!(
            "Jan 2023".parse::<YearMonth>(),
            Err(YearMonthParseError::Malformed(_))
        ));
        assert_eq!(
            "2023-13".parse::<YearMonth>(),
            Err(YearMonthParseError::MonthOutOfRange(13))
        );
        assert!("2023-00".parse::<YearMonth>().is_err());
    }

    #[test]
    fn ordering_is_year_major() {
        assert!(ym("2022-12") < ym("2023-01"));
        assert!(ym("2023-02") > ym("2023-01"));
    }

    #[test]
    fn valid_range_requires_start_and_ordered_end() {
        assert!(!is_valid_range(None, Some("2023-01")));
        assert!(!is_valid_range(Some(""), None));
        assert!(is_valid_range(Some("2023-01"), None));
        assert!(is_valid_range(Some("2023-01"), Some("")));
        assert!(is_valid_range(Some("2023-01"), Some("2023-01")));
        assert!(is_valid_range(Some("2022-12"), Some("2023-01")));
        assert!(!is_valid_range(Some("2023-02"), Some("2023-01")));
        assert!(!is_valid_range(Some("2024-01"), Some("2023-12")));
        assert!(!is_valid_range(Some("2023-01"), Some("not a date")));
    }

    #[test]
    fn duration_uses_literal_month_difference() {
        let today = ym("2025-06");
        assert_eq!(duration_months(ym("2023-01"), Some(ym("2023-12")), today), 11);
        assert_eq!(duration_months(ym("2023-05"), Some(ym("2023-05")), today), 0);
        assert_eq!(duration_months(ym("2024-06"), None, today), 12);
        assert_eq!(duration_months(ym("2023-05"), Some(ym("2023-01")), today), 0);
    }

    #[test]
    fn ongoing_duration_is_stable_within_a_month() {
        let today = ym("2025-03");
        let first = duration_months(ym("2020-01"), None, today);
        let second = duration_months(ym("2020-01"), None, today);
        assert_eq!(first, second);
    }

    #[test]
    fn parse_range_resolves_open_end_to_today() {
        let range = parse_range("2024-02", None, ym("2024-10")).unwrap();
        assert_eq!(range.end, ym("2024-10"));
        assert_eq!(range.months(), 8);

        let blank_end = parse_range("2024-02", Some(" "), ym("2024-10")).unwrap();
        assert_eq!(blank_end.end, ym("2024-10"));
    }

    #[test]
    fn format_duration_pluralizes_only_above_one() {
        assert_eq!(format_duration(0), "0 months");
        assert_eq!(format_duration(1), "1 month");
        assert_eq!(format_duration(11), "11 months");
        assert_eq!(format_duration(12), "1 year");
        assert_eq!(format_duration(13), "1 year, 1 month");
        assert_eq!(format_duration(24), "2 years");
        assert_eq!(format_duration(25), "2 years, 1 month");
        assert_eq!(format_duration(38), "3 years, 2 months");
    }

    #[test]
    fn format_span_marks_sub_month_spans() {
        let today = ym("2025-01");
        assert_eq!(format_span(ym("2024-03"), Some(ym("2024-03")), today), "< 1 month");
        assert_eq!(format_span(ym("2024-01"), None, today), "1 year");
    }

    #[test]
    fn format_date_renders_present_for_open_end() {
        assert_eq!(format_date(None), "Present");
        assert_eq!(format_date(Some(ym("2023-01"))), "Jan 2023");
        assert_eq!(
            format_date_range(ym("2021-09"), Some(ym("2022-12"))),
            "Sep 2021 - Dec 2022"
        );
    }
}
