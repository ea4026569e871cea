use crate::errors::GridError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// Zero-based calendar position, January = 0.
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Option<Self> {
        MONTHS.get(index as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn short_name(self) -> &'static str {
        &self.name()[..3]
    }

    pub fn parse(name: &str) -> Result<Self, GridError> {
        let name = name.trim();
        MONTHS
            .iter()
            .copied()
            .find(|month| month.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| GridError::Validation(format!("unknown month '{name}'")))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies one calendar month. Ordering is chronological: year first,
/// then calendar position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMonthKey")]
pub struct MonthKey {
    pub month: Month,
    pub year: i32,
}

#[derive(Deserialize)]
struct RawMonthKey {
    month: Month,
    year: i32,
}

impl TryFrom<RawMonthKey> for MonthKey {
    type Error = GridError;

    fn try_from(raw: RawMonthKey) -> Result<Self, Self::Error> {
        MonthKey::new(raw.month, raw.year)
    }
}

impl MonthKey {
    pub fn new(month: Month, year: i32) -> Result<Self, GridError> {
        if !(1000..=9999).contains(&year) {
            return Err(GridError::Validation(format!(
                "year must have four digits, got {year}"
            )));
        }
        Ok(Self { month, year })
    }

    pub fn parse(month: &str, year: &str) -> Result<Self, GridError> {
        let month = Month::parse(month)?;
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| GridError::Validation(format!("invalid year '{year}'")))?;
        Self::new(month, year)
    }

    /// Parses a storage key of the form `January_2024`.
    pub fn parse_storage_key(key: &str) -> Result<Self, GridError> {
        let (month, year) = key
            .split_once('_')
            .ok_or_else(|| GridError::Validation(format!("malformed month key '{key}'")))?;
        Self::parse(month, year)
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            month: MONTHS[date.month0() as usize],
            year: date.year(),
        }
    }

    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.month, self.year)
    }

    /// Chart label such as `Jan24`.
    pub fn short_label(&self) -> String {
        format!("{}{:02}", self.month.short_name(), self.year.rem_euclid(100))
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month.index() + 1, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> usize {
        match self.month {
            Month::April | Month::June | Month::September | Month::November => 30,
            Month::February if is_leap_year(self.year) => 29,
            Month::February => 28,
            _ => 31,
        }
    }

    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self {
                month: Month::December,
                year: self.year - 1,
            },
            month => Self {
                month: MONTHS[month.index() as usize - 1],
                year: self.year,
            },
        }
    }

    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self {
                month: Month::January,
                year: self.year + 1,
            },
            month => Self {
                month: MONTHS[month.index() as usize + 1],
                year: self.year,
            },
        }
    }
}

impl PartialOrd for MonthKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MonthKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.year, self.month.index()).cmp(&(other.year, other.month.index()))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// The `count` most recent months up to and including the one containing
/// `today`, oldest first.
pub fn previous_months(today: NaiveDate, count: usize) -> Vec<MonthKey> {
    let mut months = Vec::with_capacity(count);
    let mut key = MonthKey::containing(today);
    for _ in 0..count {
        months.push(key);
        key = key.previous();
    }
    months.reverse();
    months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(month: Month, year: i32) -> MonthKey {
        MonthKey::new(month, year).unwrap()
    }

    #[test]
    fn day_counts_follow_gregorian_rules() {
        assert_eq!(key(Month::February, 2024).days_in_month(), 29);
        assert_eq!(key(Month::February, 2023).days_in_month(), 28);
        assert_eq!(key(Month::February, 1900).days_in_month(), 28);
        assert_eq!(key(Month::February, 2000).days_in_month(), 29);
        assert_eq!(key(Month::April, 2024).days_in_month(), 30);
        assert_eq!(key(Month::December, 2023).days_in_month(), 31);
    }

    #[test]
    fn day_counts_match_chrono() {
        for year in [2023, 2024] {
            for month in MONTHS {
                let key = key(month, year);
                let last = key.next().first_day().pred_opt().unwrap();
                assert_eq!(key.days_in_month(), last.day() as usize, "{key}");
            }
        }
    }

    #[test]
    fn storage_key_and_label() {
        let key = key(Month::January, 2024);
        assert_eq!(key.storage_key(), "January_2024");
        assert_eq!(key.short_label(), "Jan24");
        assert_eq!(MonthKey::parse_storage_key("January_2024").unwrap(), key);
        assert_eq!(MonthKey::parse("january", " 2024").unwrap(), key);
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(MonthKey::parse_storage_key("January2024").is_err());
        assert!(MonthKey::parse("Smarch", "2024").is_err());
        assert!(MonthKey::parse("May", "24").is_err());
        assert!(MonthKey::parse("May", "twenty").is_err());
    }

    #[test]
    fn ordering_is_chronological() {
        let mut keys = vec![
            key(Month::December, 2023),
            key(Month::January, 2024),
            key(Month::November, 2023),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                key(Month::November, 2023),
                key(Month::December, 2023),
                key(Month::January, 2024),
            ]
        );
    }

    #[test]
    fn navigation_wraps_years() {
        assert_eq!(key(Month::January, 2024).previous(), key(Month::December, 2023));
        assert_eq!(key(Month::December, 2023).next(), key(Month::January, 2024));
    }

    #[test]
    fn previous_months_roll_back_past_january() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let months = previous_months(today, 4);
        assert_eq!(
            months,
            vec![
                key(Month::November, 2023),
                key(Month::December, 2023),
                key(Month::January, 2024),
                key(Month::February, 2024),
            ]
        );
        assert!(previous_months(today, 0).is_empty());
    }

    #[test]
    fn deserializing_checks_the_year() {
        let parsed: MonthKey = serde_json::from_str(r#"{"month":"May","year":2024}"#).unwrap();
        assert_eq!(parsed, key(Month::May, 2024));
        assert!(serde_json::from_str::<MonthKey>(r#"{"month":"May","year":24}"#).is_err());
    }
}
