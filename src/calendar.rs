use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Dates excluded from working status, normalized to day granularity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolidaySet(BTreeSet<NaiveDate>);

impl HolidaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate) -> bool {
        self.0.insert(date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains(&date)
    }

    pub fn extend(&mut self, other: HolidaySet) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Saturday, Sunday and any date in `holidays` are non-working.
pub fn is_working_day(date: NaiveDate, holidays: &HolidaySet) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(date)
}

/// Counts working days strictly after `start` through `end` inclusive.
pub fn count_working_days(start: NaiveDate, end: NaiveDate, holidays: &HolidaySet) -> i64 {
    count_days_in(start, end, |date| is_working_day(date, holidays))
}

/// Days in `(start, end]` accepted by `is_working`; zero when `end <= start`.
fn count_days_in(
    start: NaiveDate,
    end: NaiveDate,
    is_working: impl Fn(NaiveDate) -> bool,
) -> i64 {
    if end <= start {
        return 0;
    }
    start
        .iter_days()
        .skip(1)
        .take_while(|date| *date <= end)
        .filter(|date| is_working(*date))
        .count() as i64
}

/// US federal holidays observed in `year`.
///
/// Fixed-date holidays falling on a Saturday are observed the preceding Friday and
/// those falling on a Sunday the following Monday. New Year's Day can spill across
/// the year boundary in both directions: an observed Dec 31 of the previous year is
/// included, as is Dec 31 of `year` when Jan 1 of the next year is a Saturday.
pub fn federal_holidays(year: i32) -> HolidaySet {
    let mut holidays = HolidaySet::new();

    for (month, day) in [(1, 1), (6, 19), (7, 4), (11, 11), (12, 25)] {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            holidays.insert(observed(date));
        }
    }
    if let Some(next_new_year) = year
        .checked_add(1)
        .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1))
    {
        if next_new_year.weekday() == Weekday::Sat {
            holidays.insert(observed(next_new_year));
        }
    }

    let movable = [
        // Martin Luther King Jr. Day (3rd Monday in January)
        nth_weekday(year, 1, Weekday::Mon, 3),
        // Presidents' Day (3rd Monday in February)
        nth_weekday(year, 2, Weekday::Mon, 3),
        // Memorial Day (last Monday in May)
        last_weekday(year, 5, Weekday::Mon),
        // Labor Day (1st Monday in September)
        nth_weekday(year, 9, Weekday::Mon, 1),
        // Columbus Day (2nd Monday in October)
        nth_weekday(year, 10, Weekday::Mon, 2),
        // Thanksgiving (4th Thursday in November)
        nth_weekday(year, 11, Weekday::Thu, 4),
    ];
    for date in movable.into_iter().flatten() {
        holidays.insert(date);
    }

    holidays
}

fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Find the nth occurrence of a weekday in a month
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

/// Find the last occurrence of a weekday in a month
fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut date = first_of_next.pred_opt()?;
    while date.weekday() != weekday {
        date = date.pred_opt()?;
    }
    Some(date)
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HolidaySet,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    holidays: Vec<NaiveDate>,
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

    /// Mon-Fri calendar carrying federal holidays for every year in the range.
    pub fn with_year_range(start_year: i32, end_year: i32) -> Self {
        let (start, end) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };

        let mut holidays = HolidaySet::new();
        for year in start..=end {
            holidays.extend(federal_holidays(year));
        }

        Self {
            holidays,
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }

    pub fn custom<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let config = WorkCalendarConfig::new(working_days, holidays);
        Self::from_config(&config)
    }

    /// An empty working-day list in the config falls back to Mon-Fri.
    pub fn from_config(config: &WorkCalendarConfig) -> Self {
        let working_set: HashSet<Weekday> = if config.working_days.is_empty() {
            Self::ALL_WEEKDAYS[..5].iter().copied().collect()
        } else {
            config.working_days.iter().copied().collect()
        };
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        }
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    pub fn holidays(&self) -> &HolidaySet {
        &self.holidays
    }

    /// Add a single holiday
    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        for date in dates {
            self.holidays.insert(*date);
        }
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(date) && !self.non_working_days.contains(&date.weekday())
    }

    /// First working day strictly after `from`.
    pub fn next_working_day(&self, from: NaiveDate) -> NaiveDate {
        let mut current = from + Duration::days(1);
        while !self.is_working_day(current) {
            current = current + Duration::days(1);
        }
        current
    }

    pub fn working_day_on_or_after(&self, from: NaiveDate) -> NaiveDate {
        if self.is_working_day(from) {
            from
        } else {
            self.next_working_day(from)
        }
    }

    /// Working days in `(start, end]`; zero when `end <= start`.
    pub fn count_working_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        count_days_in(start, end, |date| self.is_working_day(date))
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
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

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day))
            .collect();

        Self {
            working_days: working,
            holidays: calendar.holidays.iter().collect(),
        }
    }
}
