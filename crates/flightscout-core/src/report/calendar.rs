use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, e.g. December 2026
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
}

/// One row of a month grid; `None` cells fall outside the month
pub type Week = [Option<NaiveDate>; 7];

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Every day of the month, ascending
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first_day()
            .iter_days()
            .take_while(move |d| self.contains(*d))
    }

    /// The month laid out as weeks starting on `week_start`
    pub fn weeks(&self, week_start: Weekday) -> Vec<Week> {
        let mut weeks = Vec::new();
        let mut week: Week = [None; 7];

        for date in self.days() {
            let col = column(date.weekday(), week_start);
            if col == 0 && week.iter().any(Option::is_some) {
                weeks.push(week);
                week = [None; 7];
            }
            week[col] = Some(date);
        }
        if week.iter().any(Option::is_some) {
            weeks.push(week);
        }

        weeks
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = u8::try_from(self.month)
            .ok()
            .and_then(|m| chrono::Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("?");
        write!(f, "{} {}", name, self.year)
    }
}

impl FromStr for CalendarMonth {
    type Err = String;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
        let year = year
            .parse()
            .map_err(|_| format!("invalid year in '{}'", s))?;
        let month = month
            .parse()
            .map_err(|_| format!("invalid month in '{}'", s))?;
        CalendarMonth::new(year, month).ok_or_else(|| format!("no such month '{}'", s))
    }
}

/// Weekdays in display order for a week starting on `start`
pub fn weekday_order(start: Weekday) -> [Weekday; 7] {
    let mut day = start;
    std::array::from_fn(|_| {
        let current = day;
        day = day.succ();
        current
    })
}

fn column(day: Weekday, week_start: Weekday) -> usize {
    ((day.num_days_from_monday() + 7 - week_start.num_days_from_monday()) % 7) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_december_2026_starting_sunday() {
        // December 1st 2026 is a Tuesday
        let month = CalendarMonth::new(2026, 12).unwrap();
        let weeks = month.weeks(Weekday::Sun);

        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0][0], None);
        assert_eq!(weeks[0][2], NaiveDate::from_ymd_opt(2026, 12, 1));
        assert_eq!(weeks[4][4], NaiveDate::from_ymd_opt(2026, 12, 31));
        assert_eq!(weeks[4][5], None);
    }

    #[test]
    fn test_week_start_shifts_columns() {
        let month = CalendarMonth::new(2026, 12).unwrap();
        let weeks = month.weeks(Weekday::Tue);

        assert_eq!(weeks[0][0], NaiveDate::from_ymd_opt(2026, 12, 1));
        assert_eq!(
            weekday_order(Weekday::Tue)[6],
            Weekday::Mon,
            "week wraps around to Monday"
        );
    }

    #[test]
    fn test_month_parse_and_display() {
        let month: CalendarMonth = "2026-02".parse().unwrap();
        assert_eq!(month.to_string(), "February 2026");
        assert_eq!(month.days().count(), 28);
        assert!("2026-13".parse::<CalendarMonth>().is_err());
        assert!("december".parse::<CalendarMonth>().is_err());
    }
}
