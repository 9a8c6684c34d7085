use std::collections::BTreeSet;

use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  warn
};

use crate::calendar::{
  CalendarDay,
  DateRange,
  day_span
};
use crate::datetime::Timestamp;
use crate::forms::FormError;

/// A span already committed to a
/// renter. Both ends block their whole
/// calendar day.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct ReservedInterval {
  pub start: Timestamp,
  pub end:   Timestamp
}

impl ReservedInterval {
  pub fn new(
    start: Timestamp,
    end: Timestamp
  ) -> Self {
    Self {
      start,
      end
    }
  }

  pub fn day_bounds(
    &self,
    tz: &Tz
  ) -> (CalendarDay, CalendarDay) {
    (
      self.start.calendar_day(tz),
      self.end.calendar_day(tz)
    )
  }
}

impl From<DateRange> for ReservedInterval {
  fn from(range: DateRange) -> Self {
    Self {
      start: range.start.into(),
      end:   range.end.into()
    }
  }
}

#[derive(Debug, Deserialize)]
struct RawPeriod {
  start: CalendarDay,
  end:   CalendarDay
}

/// Owner-declared window in which the
/// item may be requested.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(try_from = "RawPeriod")]
pub struct AvailablePeriod {
  start: CalendarDay,
  end:   CalendarDay
}

impl AvailablePeriod {
  pub fn new(
    start: CalendarDay,
    end: CalendarDay
  ) -> Result<Self, FormError> {
    if end < start {
      return Err(
        FormError::PeriodEndBeforeStart
      );
    }
    Ok(Self {
      start,
      end
    })
  }

  pub fn start(&self) -> CalendarDay {
    self.start
  }

  pub fn end(&self) -> CalendarDay {
    self.end
  }

  pub fn contains(
    &self,
    day: CalendarDay
  ) -> bool {
    self.start <= day && day <= self.end
  }
}

impl TryFrom<RawPeriod>
  for AvailablePeriod
{
  type Error = FormError;

  fn try_from(
    raw: RawPeriod
  ) -> Result<Self, Self::Error> {
    Self::new(raw.start, raw.end)
  }
}

/// What to do with an item that has no
/// declared periods.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum PeriodPolicy {
  #[default]
  OpenWhenUndeclared,
  ClosedWhenUndeclared
}

impl PeriodPolicy {
  pub fn parse(
    raw: &str
  ) -> anyhow::Result<Self> {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "open" => {
        Ok(Self::OpenWhenUndeclared)
      }
      | "closed" => {
        Ok(Self::ClosedWhenUndeclared)
      }
      | other => {
        Err(anyhow::anyhow!(
          "invalid period policy: \
           {other} (expected open or \
           closed)"
        ))
      }
    }
  }
}

/// True when no period is declared or
/// `day` lies inside one of them.
pub fn within_available_periods(
  day: CalendarDay,
  periods: &[AvailablePeriod]
) -> bool {
  periods.is_empty()
    || periods
      .iter()
      .any(|p| p.contains(day))
}

#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct BlockedDays {
  days: BTreeSet<CalendarDay>
}

impl BlockedDays {
  pub fn contains(
    &self,
    day: CalendarDay
  ) -> bool {
    self.days.contains(&day)
  }

  pub fn len(&self) -> usize {
    self.days.len()
  }

  pub fn is_empty(&self) -> bool {
    self.days.is_empty()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = CalendarDay> + '_
  {
    self.days.iter().copied()
  }
}

/// Union of the inclusive day
/// expansions of `intervals`.
#[tracing::instrument(skip(
  intervals, tz
))]
pub fn resolve_blocked_days(
  intervals: &[ReservedInterval],
  tz: &Tz
) -> BlockedDays {
  let mut days = BTreeSet::new();
  for interval in intervals {
    let (start, end) =
      interval.day_bounds(tz);
    if end < start {
      warn!(
        start = %interval.start,
        end = %interval.end,
        "reserved interval ends before it starts; ignoring"
      );
      continue;
    }
    days.extend(day_span(start, end));
  }

  debug!(
    intervals = intervals.len(),
    blocked = days.len(),
    "resolved blocked days"
  );
  BlockedDays {
    days
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
  Open,
  Reserved,
  OutsidePeriods
}

impl DayStatus {
  pub fn label(self) -> &'static str {
    match self {
      | Self::Open => "예약 가능",
      | Self::Reserved => "예약된 날짜",
      | Self::OutsidePeriods => {
        "대여 가능 기간이 아닙니다"
      }
    }
  }
}

/// Snapshot of an item's reservations
/// and periods for one picker session.
#[derive(Debug, Clone, Default)]
pub struct Availability {
  blocked: BlockedDays,
  periods: Vec<AvailablePeriod>,
  policy:  PeriodPolicy
}

impl Availability {
  pub fn new(
    reserved: &[ReservedInterval],
    periods: &[AvailablePeriod],
    policy: PeriodPolicy,
    tz: &Tz
  ) -> Self {
    Self {
      blocked: resolve_blocked_days(
        reserved, tz
      ),
      periods: periods.to_vec(),
      policy
    }
  }

  pub fn blocked_days(
    &self
  ) -> &BlockedDays {
    &self.blocked
  }

  pub fn periods(
    &self
  ) -> &[AvailablePeriod] {
    &self.periods
  }

  pub fn is_reserved(
    &self,
    day: CalendarDay
  ) -> bool {
    self.blocked.contains(day)
  }

  pub fn is_within_periods(
    &self,
    day: CalendarDay
  ) -> bool {
    if self.periods.is_empty() {
      return self.policy
        == PeriodPolicy::OpenWhenUndeclared;
    }
    within_available_periods(
      day,
      &self.periods
    )
  }

  pub fn status(
    &self,
    day: CalendarDay
  ) -> DayStatus {
    if self.is_reserved(day) {
      DayStatus::Reserved
    } else if !self.is_within_periods(day)
    {
      DayStatus::OutsidePeriods
    } else {
      DayStatus::Open
    }
  }

  pub fn is_blocked(
    &self,
    day: CalendarDay
  ) -> bool {
    self.status(day) != DayStatus::Open
  }

  /// First blocked day of
  /// `start..=end`, walking forward.
  pub fn first_blocked_in(
    &self,
    start: CalendarDay,
    end: CalendarDay
  ) -> Option<CalendarDay> {
    day_span(start, end)
      .find(|day| self.is_blocked(*day))
  }
}

/// Working copy of an item's periods
/// while the owner edits them.
#[derive(Debug, Clone, Default)]
pub struct PeriodEditor {
  periods: Vec<AvailablePeriod>
}

impl PeriodEditor {
  pub fn new(
    existing: &[AvailablePeriod]
  ) -> Self {
    Self {
      periods: existing.to_vec()
    }
  }

  pub fn add(
    &mut self,
    start: Option<CalendarDay>,
    end: Option<CalendarDay>
  ) -> Result<AvailablePeriod, FormError>
  {
    let (Some(start), Some(end)) =
      (start, end)
    else {
      return Err(
        FormError::PeriodIncomplete
      );
    };
    let period =
      AvailablePeriod::new(start, end)?;
    self.periods.push(period);
    Ok(period)
  }

  pub fn remove(
    &mut self,
    index: usize
  ) -> Option<AvailablePeriod> {
    (index < self.periods.len())
      .then(|| self.periods.remove(index))
  }

  pub fn periods(
    &self
  ) -> &[AvailablePeriod] {
    &self.periods
  }

  pub fn finish(
    self
  ) -> Vec<AvailablePeriod> {
    self.periods
  }
}

#[cfg(test)]
mod tests {
  use chrono_tz::Asia::Seoul;

  use super::*;

  fn day(raw: &str) -> CalendarDay {
    raw.parse().expect("valid day")
  }

  fn interval(
    start: &str,
    end: &str
  ) -> ReservedInterval {
    ReservedInterval::new(
      start.parse().expect("start"),
      end.parse().expect("end")
    )
  }

  #[test]
  fn every_day_of_each_interval_is_blocked()
  {
    let intervals = vec![
      interval(
        "2024-06-22T10:00",
        "2024-06-22T14:00"
      ),
      interval(
        "2024-06-28T18:00",
        "2024-07-01T09:00"
      ),
    ];
    let blocked =
      resolve_blocked_days(&intervals, &Seoul);

    for key in [
      "2024-06-22",
      "2024-06-28",
      "2024-06-29",
      "2024-06-30",
      "2024-07-01"
    ] {
      assert!(
        blocked.contains(day(key)),
        "{key} should be blocked"
      );
    }
    for key in [
      "2024-06-21",
      "2024-06-23",
      "2024-06-27",
      "2024-07-02"
    ] {
      assert!(
        !blocked.contains(day(key)),
        "{key} should be free"
      );
    }
    assert_eq!(blocked.len(), 5);
  }

  #[test]
  fn overlapping_intervals_collapse() {
    let intervals = vec![
      interval("2024-06-22", "2024-06-24"),
      interval("2024-06-23", "2024-06-25"),
      interval(
        "2024-06-23T09:00",
        "2024-06-23T12:00"
      ),
    ];
    let blocked =
      resolve_blocked_days(&intervals, &Seoul);
    let keys: Vec<String> = blocked
      .iter()
      .map(|d| d.key())
      .collect();
    assert_eq!(
      keys,
      vec![
        "2024-06-22",
        "2024-06-23",
        "2024-06-24",
        "2024-06-25"
      ]
    );
  }

  #[test]
  fn reversed_interval_blocks_nothing() {
    let blocked = resolve_blocked_days(
      &[interval(
        "2024-06-25",
        "2024-06-22"
      )],
      &Seoul
    );
    assert!(blocked.is_empty());
  }

  #[test]
  fn no_periods_means_every_day_is_open()
  {
    for key in [
      "2024-01-01",
      "2024-07-05",
      "2031-12-31"
    ] {
      assert!(within_available_periods(
        day(key),
        &[]
      ));
    }
  }

  #[test]
  fn declared_period_filters_days() {
    let periods = vec![
      AvailablePeriod::new(
        day("2024-07-04"),
        day("2024-07-06")
      )
      .expect("period"),
    ];
    assert!(within_available_periods(
      day("2024-07-05"),
      &periods
    ));
    assert!(within_available_periods(
      day("2024-07-04"),
      &periods
    ));
    assert!(within_available_periods(
      day("2024-07-06"),
      &periods
    ));
    assert!(!within_available_periods(
      day("2024-07-10"),
      &periods
    ));
  }

  #[test]
  fn closed_policy_blocks_undeclared_items()
  {
    let open = Availability::new(
      &[],
      &[],
      PeriodPolicy::OpenWhenUndeclared,
      &Seoul
    );
    let closed = Availability::new(
      &[],
      &[],
      PeriodPolicy::ClosedWhenUndeclared,
      &Seoul
    );
    assert!(
      !open.is_blocked(day("2024-07-05"))
    );
    assert_eq!(
      closed.status(day("2024-07-05")),
      DayStatus::OutsidePeriods
    );
  }

  #[test]
  fn reservation_wins_over_period() {
    let availability = Availability::new(
      &[interval(
        "2024-07-05T10:00",
        "2024-07-05T12:00"
      )],
      &[AvailablePeriod::new(
        day("2024-07-04"),
        day("2024-07-06")
      )
      .expect("period")],
      PeriodPolicy::default(),
      &Seoul
    );
    assert_eq!(
      availability
        .status(day("2024-07-05")),
      DayStatus::Reserved
    );
    assert_eq!(
      availability
        .status(day("2024-07-07")),
      DayStatus::OutsidePeriods
    );
    assert_eq!(
      availability.first_blocked_in(
        day("2024-07-04"),
        day("2024-07-06")
      ),
      Some(day("2024-07-05"))
    );
    assert_eq!(
      availability.first_blocked_in(
        day("2024-07-06"),
        day("2024-07-06")
      ),
      None
    );
  }

  #[test]
  fn period_rejects_reversed_bounds_on_deserialize()
  {
    let parsed: Result<
      AvailablePeriod,
      _
    > = serde_json::from_str(
      r#"{"start":"2024-07-06","end":"2024-07-04"}"#
    );
    assert!(parsed.is_err());

    let ok: AvailablePeriod =
      serde_json::from_str(
        r#"{"start":"2024-07-04","end":"2024-07-06"}"#
      )
      .expect("valid period");
    assert_eq!(ok.start(), day("2024-07-04"));
  }

  #[test]
  fn editor_validates_before_adding() {
    let mut editor =
      PeriodEditor::default();
    assert_eq!(
      editor.add(
        Some(day("2024-07-04")),
        None
      ),
      Err(FormError::PeriodIncomplete)
    );
    assert_eq!(
      editor.add(
        Some(day("2024-07-06")),
        Some(day("2024-07-04"))
      ),
      Err(
        FormError::PeriodEndBeforeStart
      )
    );
    assert!(editor.periods().is_empty());

    editor
      .add(
        Some(day("2024-07-04")),
        Some(day("2024-07-06"))
      )
      .expect("valid period");
    editor
      .add(
        Some(day("2024-08-01")),
        Some(day("2024-08-01"))
      )
      .expect("single day period");
    assert!(editor.remove(5).is_none());
    let removed =
      editor.remove(0).expect("removed");
    assert_eq!(
      removed.end(),
      day("2024-07-06")
    );
    assert_eq!(editor.finish().len(), 1);
  }
}
