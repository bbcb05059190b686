use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on day-by-day scans. Validated calendars always find a working
/// day well before this.
const MAX_SCAN_DAYS: i64 = 366 * 28;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("calendar requires at least one working day")]
    NoWorkingDays,
    #[error("holidays cover every day of the year")]
    NoWorkingDates,
    #[error("invalid holiday '{0}' (expected DD/MM)")]
    InvalidHoliday(String),
}

/// A holiday matched on day and month only, in every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HolidayDate {
    month: u32,
    day: u32,
}

impl HolidayDate {
    pub fn new(day: u32, month: u32) -> Result<Self, CalendarError> {
        // 2024 is a leap year, so 29/02 is accepted.
        if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
            return Err(CalendarError::InvalidHoliday(format!("{day:02}/{month:02}")));
        }
        Ok(Self { month, day })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for HolidayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.day, self.month)
    }
}

impl FromStr for HolidayDate {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CalendarError::InvalidHoliday(s.to_string());
        let (day, month) = s.trim().split_once('/').ok_or_else(invalid)?;
        let day = day.parse::<u32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(day, month)
    }
}

impl TryFrom<String> for HolidayDate {
    type Error = CalendarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HolidayDate> for String {
    fn from(value: HolidayDate) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkCalendar {
    holidays: HashSet<HolidayDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    holidays: Vec<HolidayDate>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::italian()
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Italian national holidays as observed by the planning office.
    const ITALIAN_HOLIDAYS: [(u32, u32); 12] = [
        (1, 1),
        (6, 1),
        (31, 3),
        (1, 4),
        (25, 4),
        (1, 5),
        (2, 6),
        (15, 8),
        (1, 11),
        (8, 12),
        (25, 12),
        (26, 12),
    ];

    /// Mon-Fri work week with the fixed Italian holiday set.
    pub fn italian() -> Self {
        let holidays = Self::ITALIAN_HOLIDAYS
            .iter()
            .map(|&(day, month)| HolidayDate { month, day })
            .collect();
        Self {
            holidays,
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }

    pub fn custom<I, J>(working_days: I, holidays: J) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = HolidayDate>,
    {
        let config = WorkCalendarConfig::new(working_days, holidays);
        Self::from_config(&config)
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Result<Self, CalendarError> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        let holidays: HashSet<HolidayDate> = config.holidays.iter().copied().collect();
        // 366 distinct day/month pairs would block every date of every year.
        if holidays.len() >= 366 {
            return Err(CalendarError::NoWorkingDates);
        }
        Ok(Self {
            holidays,
            non_working_days,
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    pub fn add_holiday(&mut self, holiday: HolidayDate) -> Result<(), CalendarError> {
        if !self.holidays.contains(&holiday) && self.holidays.len() + 1 >= 366 {
            return Err(CalendarError::NoWorkingDates);
        }
        self.holidays.insert(holiday);
        Ok(())
    }

    /// Set custom working days (e.g., Mon-Sat for 6-day weeks)
    pub fn set_working_days(&mut self, days: &[Weekday]) -> Result<(), CalendarError> {
        if days.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        self.non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !days.contains(day))
            .collect();
        Ok(())
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&HolidayDate::of(date))
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.non_working_days.contains(&date.weekday()) && !self.is_holiday(date)
    }

    /// Returns `date` itself when it is a working day, otherwise the first
    /// working day after it. `None` when no working day is reachable before
    /// the end of the representable date range.
    pub fn next_working_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut current = date;
        for _ in 0..MAX_SCAN_DAYS {
            if self.is_working_day(current) {
                return Some(current);
            }
            current = current.succ_opt()?;
        }
        tracing::error!(%date, "no working day found within scan limit");
        None
    }

    /// Walks forward from `start` (inclusive) and returns the date on which the
    /// `n`th working day is reached. `n == 0` returns `start`; `None` when the
    /// walk runs past the end of the representable date range.
    pub fn add_working_days(&self, start: NaiveDate, n: u32) -> Option<NaiveDate> {
        let mut current = start;
        let mut count = 0;
        while count < n {
            if self.is_working_day(current) {
                count += 1;
                if count == n {
                    break;
                }
            }
            current = current.succ_opt()?;
        }
        Some(current)
    }

    /// Get all working days in a date range (inclusive)
    pub fn working_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_working_day(*day))
            .collect()
    }

    pub fn non_working_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| !self.is_working_day(*day))
            .collect()
    }

    pub fn count_working_days(&self, start: NaiveDate, end: NaiveDate) -> usize {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_working_day(*day))
            .count()
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = HolidayDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup();

        let mut holidays: Vec<HolidayDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Self {
            working_days: working,
            holidays,
        }
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[HolidayDate] {
        &self.holidays
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day));
        WorkCalendarConfig::new(working, calendar.holidays.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn holiday_date_parses_day_first() {
        let epiphany: HolidayDate = "06/01".parse().unwrap();
        assert_eq!(epiphany.day(), 6);
        assert_eq!(epiphany.month(), 1);
        assert_eq!(epiphany.to_string(), "06/01");
        assert!("31/02".parse::<HolidayDate>().is_err());
        assert!("0601".parse::<HolidayDate>().is_err());
    }

    #[test]
    fn holidays_match_in_any_year() {
        let cal = WorkCalendar::default();
        // Christmas 2026 is a Friday
        assert!(!cal.is_working_day(d(2026, 12, 25)));
        assert!(cal.is_working_day(d(2026, 12, 24)));
    }

    #[test]
    fn add_working_days_zero_returns_start() {
        let cal = WorkCalendar::default();
        assert_eq!(cal.add_working_days(d(2025, 1, 4), 0), Some(d(2025, 1, 4)));
    }

    #[test]
    fn walking_past_last_date_yields_none() {
        let cal = WorkCalendar::default();
        let near_end = NaiveDate::MAX.pred_opt().unwrap();
        assert_eq!(cal.add_working_days(near_end, 10), None);
        let mut last_working = NaiveDate::MAX;
        while !cal.is_working_day(last_working) {
            last_working = last_working.pred_opt().unwrap();
        }
        assert_eq!(cal.next_working_day(last_working), Some(last_working));
        if let Some(after) = last_working.succ_opt() {
            assert_eq!(cal.next_working_day(after), None);
        }
    }

    #[test]
    fn config_rejects_empty_work_week() {
        let config = WorkCalendarConfig::new(Vec::new(), Vec::new());
        assert_eq!(
            WorkCalendar::from_config(&config),
            Err(CalendarError::NoWorkingDays)
        );
    }

    #[test]
    fn config_serializes_holidays_as_day_month_strings() {
        let config = WorkCalendar::default().to_config();
        let json = serde_json::to_value(&config).unwrap();
        let holidays = json["holidays"].as_array().unwrap();
        assert_eq!(holidays.len(), 12);
        assert_eq!(holidays[0], "01/01");
        assert!(holidays.iter().any(|h| h == "26/12"));
    }
}
