use std::fmt;
use std::str::FromStr;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

pub const DAY_KEY_FORMAT: &str =
  "%Y-%m-%d";

/// A date at day granularity. The
/// textual key is `YYYY-MM-DD`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
  #[must_use]
  pub fn date(self) -> NaiveDate {
    self.0
  }

  pub fn year(self) -> i32 {
    self.0.year()
  }

  pub fn month(self) -> u32 {
    self.0.month()
  }

  pub fn day(self) -> u32 {
    self.0.day()
  }

  pub fn weekday(self) -> Weekday {
    self.0.weekday()
  }

  pub fn next(self) -> Option<Self> {
    self.0.succ_opt().map(Self)
  }

  #[must_use]
  pub fn key(self) -> String {
    self.to_string()
  }
}

impl From<NaiveDate> for CalendarDay {
  fn from(date: NaiveDate) -> Self {
    Self(date)
  }
}

impl fmt::Display for CalendarDay {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{}",
      self.0.format(DAY_KEY_FORMAT)
    )
  }
}

impl FromStr for CalendarDay {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    NaiveDate::parse_from_str(
      s.trim(),
      DAY_KEY_FORMAT
    )
    .map(Self)
    .with_context(|| {
      format!(
        "invalid day, expected \
         YYYY-MM-DD: {s}"
      )
    })
  }
}

impl Serialize for CalendarDay {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de>
  for CalendarDay
{
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    raw
      .parse()
      .map_err(serde::de::Error::custom)
  }
}

/// Inclusive, ordered day range.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct DateRange {
  pub start: CalendarDay,
  pub end:   CalendarDay
}

impl DateRange {
  pub fn new(
    start: CalendarDay,
    end: CalendarDay
  ) -> Option<Self> {
    (start <= end).then_some(Self {
      start,
      end
    })
  }

  pub fn contains(
    &self,
    day: CalendarDay
  ) -> bool {
    self.start <= day && day <= self.end
  }
}

impl fmt::Display for DateRange {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{} ~ {}",
      self.start, self.end
    )
  }
}

#[derive(Debug, Clone)]
pub struct DaySpan {
  next: Option<CalendarDay>,
  end:  CalendarDay
}

impl Iterator for DaySpan {
  type Item = CalendarDay;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.next?;
    if current > self.end {
      self.next = None;
      return None;
    }
    self.next = current.next();
    Some(current)
  }
}

/// Iterates `start..=end`. Yields
/// nothing when `start > end`.
pub fn day_span(
  start: CalendarDay,
  end: CalendarDay
) -> DaySpan {
  DaySpan {
    next: Some(start),
    end
  }
}

pub fn days_inclusive(
  start: CalendarDay,
  end: CalendarDay
) -> Vec<CalendarDay> {
  day_span(start, end).collect()
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum WeekStart {
  #[default]
  Sunday,
  Monday
}

impl WeekStart {
  pub fn parse(
    raw: &str
  ) -> anyhow::Result<Self> {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "sunday" | "sun" | "일" => {
        Ok(Self::Sunday)
      }
      | "monday" | "mon" | "월" => {
        Ok(Self::Monday)
      }
      | other => {
        Err(anyhow!(
          "invalid week start: {other}"
        ))
      }
    }
  }

  pub fn offset_of(
    self,
    weekday: Weekday
  ) -> u32 {
    match self {
      | Self::Sunday => {
        weekday.num_days_from_sunday()
      }
      | Self::Monday => {
        weekday.num_days_from_monday()
      }
    }
  }

  pub fn labels(
    self
  ) -> [&'static str; 7] {
    match self {
      | Self::Sunday => {
        [
          "일", "월", "화", "수", "목",
          "금", "토"
        ]
      }
      | Self::Monday => {
        [
          "월", "화", "수", "목", "금",
          "토", "일"
        ]
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
  pub year:           i32,
  pub month:          u32,
  /// Empty cells before day 1.
  pub leading_blanks: u32,
  pub days:           Vec<CalendarDay>
}

impl MonthGrid {
  /// Seven-column rows, padded with
  /// `None` on both ends.
  pub fn weeks(
    &self
  ) -> Vec<[Option<CalendarDay>; 7]> {
    let mut cells: Vec<
      Option<CalendarDay>
    > = std::iter::repeat_n(
      None,
      self.leading_blanks as usize
    )
    .chain(
      self.days.iter().copied().map(Some)
    )
    .collect();

    while cells.len() % 7 != 0 {
      cells.push(None);
    }

    cells
      .chunks(7)
      .map(|chunk| {
        let mut row = [None; 7];
        row.copy_from_slice(chunk);
        row
      })
      .collect()
  }
}

pub fn month_grid(
  year: i32,
  month: u32,
  week_start: WeekStart
) -> anyhow::Result<MonthGrid> {
  let first =
    NaiveDate::from_ymd_opt(
      year, month, 1
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid month: \
         {year}-{month:02}"
      )
    })?;
  let (next_year, next_month) =
    shift_month(year, month, 1);
  let last = NaiveDate::from_ymd_opt(
    next_year, next_month, 1
  )
  .and_then(|d| d.pred_opt())
  .ok_or_else(|| {
    anyhow!(
      "month out of range: \
       {year}-{month:02}"
    )
  })?;

  Ok(MonthGrid {
    year,
    month,
    leading_blanks: week_start
      .offset_of(first.weekday()),
    days: days_inclusive(
      first.into(),
      last.into()
    )
  })
}

/// Moves `delta` months, wrapping the
/// year. Saturates at the ends of the
/// `i32` year range.
pub fn shift_month(
  year: i32,
  month: u32,
  delta: i32
) -> (i32, u32) {
  let index = i64::from(year) * 12
    + (i64::from(month) - 1)
    + i64::from(delta);
  let year = i32::try_from(
    index.div_euclid(12)
  )
  .unwrap_or(if index < 0 {
    i32::MIN
  } else {
    i32::MAX
  });
  (year, index.rem_euclid(12) as u32 + 1)
}

/// Parses `YYYY-MM`.
pub fn parse_month_key(
  raw: &str
) -> anyhow::Result<(i32, u32)> {
  let (y, m) = raw
    .trim()
    .split_once('-')
    .ok_or_else(|| {
      anyhow!(
        "expected YYYY-MM, got: {raw}"
      )
    })?;
  let year: i32 = y
    .parse()
    .with_context(|| {
      format!("invalid year in {raw}")
    })?;
  let month: u32 = m
    .parse()
    .with_context(|| {
      format!("invalid month in {raw}")
    })?;
  if !(1..=12).contains(&month) {
    return Err(anyhow!(
      "month out of range: {month}"
    ));
  }
  if NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .is_none()
  {
    return Err(anyhow!(
      "year out of range: {year}"
    ));
  }
  Ok((year, month))
}
