use chrono_tz::Tz;
use tracing::{
  debug,
  instrument,
  warn
};

use crate::availability::{
  Availability,
  DayStatus,
  PeriodPolicy
};
use crate::calendar::{
  CalendarDay,
  DateRange,
  WeekStart,
  month_grid,
  shift_month
};
use crate::model::RentalItem;
use crate::selection::{
  ClickOutcome,
  Selection,
  SelectionError
};

/// Receives a validated rental request.
/// The picker never books anything
/// itself.
pub trait BookingHandler {
  fn on_request(
    &mut self,
    item_id: &str,
    start: CalendarDay,
    end: CalendarDay
  ) -> anyhow::Result<()>;
}

impl<F> BookingHandler for F
where
  F: FnMut(
    &str,
    CalendarDay,
    CalendarDay
  ) -> anyhow::Result<()>
{
  fn on_request(
    &mut self,
    item_id: &str,
    start: CalendarDay,
    end: CalendarDay
  ) -> anyhow::Result<()> {
    self(item_id, start, end)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
  Requested(DateRange),
  Rejected(SelectionError)
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub struct PickerOptions {
  pub policy:     PeriodPolicy,
  pub week_start: WeekStart
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMark {
  Blocked(DayStatus),
  InRange,
  Endpoint,
  Open
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
  pub day:  CalendarDay,
  pub mark: CellMark
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
  pub year:           i32,
  pub month:          u32,
  pub labels:         [&'static str; 7],
  pub leading_blanks: u32,
  pub cells:          Vec<DayCell>,
  /// Seven-column rows; `None` pads
  /// the first and last week.
  pub weeks:          Vec<[Option<DayCell>; 7]>
}

/// One rental-request calendar session.
/// Dropping or cancelling it discards
/// the selection.
#[derive(Debug, Clone)]
pub struct RentalPicker {
  item_id:      String,
  availability: Availability,
  selection:    Selection,
  week_start:   WeekStart,
  year:         i32,
  month:        u32,
  error:        Option<SelectionError>
}

impl RentalPicker {
  #[instrument(skip(item, options, tz), fields(item_id = %item.id))]
  pub fn open(
    item: &RentalItem,
    options: PickerOptions,
    tz: &Tz,
    today: CalendarDay
  ) -> Self {
    let availability = Availability::new(
      &item.reserved_times,
      &item.available_periods,
      options.policy,
      tz
    );
    debug!(
      blocked = availability.blocked_days().len(),
      periods = availability.periods().len(),
      "opened rental picker"
    );
    Self::with_availability(
      item.id.clone(),
      availability,
      options.week_start,
      today
    )
  }

  pub fn with_availability(
    item_id: impl Into<String>,
    availability: Availability,
    week_start: WeekStart,
    today: CalendarDay
  ) -> Self {
    Self {
      item_id: item_id.into(),
      availability,
      selection: Selection::Empty,
      week_start,
      year: today.year(),
      month: today.month(),
      error: None
    }
  }

  pub fn item_id(&self) -> &str {
    &self.item_id
  }

  pub fn selection(&self) -> Selection {
    self.selection
  }

  pub fn availability(
    &self
  ) -> &Availability {
    &self.availability
  }

  /// Message from the last rejected
  /// submit.
  pub fn error(
    &self
  ) -> Option<SelectionError> {
    self.error
  }

  pub fn month(&self) -> (i32, u32) {
    (self.year, self.month)
  }

  pub fn click(
    &mut self,
    day: CalendarDay
  ) -> ClickOutcome {
    let outcome = self
      .selection
      .click(day, &self.availability);
    debug!(%day, ?outcome, "picker click");
    outcome
  }

  /// Typed start/end entry. Reversed
  /// bounds leave the selection as it
  /// was.
  pub fn enter_range(
    &mut self,
    start: CalendarDay,
    end: CalendarDay
  ) -> Result<(), SelectionError> {
    match Selection::from_bounds(
      start, end
    ) {
      | Ok(selection) => {
        self.selection = selection;
        self.year = start.year();
        self.month = start.month();
        Ok(())
      }
      | Err(err) => {
        self.error = Some(err);
        Err(err)
      }
    }
  }

  pub fn show_month(
    &mut self,
    year: i32,
    month: u32
  ) {
    let (year, month) =
      shift_month(year, month, 0);
    self.year = year;
    self.month = month;
  }

  pub fn prev_month(&mut self) {
    (self.year, self.month) =
      shift_month(self.year, self.month, -1);
  }

  pub fn next_month(&mut self) {
    (self.year, self.month) =
      shift_month(self.year, self.month, 1);
  }

  pub fn month_view(
    &self
  ) -> anyhow::Result<MonthView> {
    let grid = month_grid(
      self.year,
      self.month,
      self.week_start
    )?;
    let cell = |day: CalendarDay| {
      DayCell {
        day,
        mark: self.mark_for(day)
      }
    };
    let cells = grid
      .days
      .iter()
      .map(|&day| cell(day))
      .collect();
    let weeks = grid
      .weeks()
      .into_iter()
      .map(|row| row.map(|slot| slot.map(cell)))
      .collect();

    Ok(MonthView {
      year: grid.year,
      month: grid.month,
      labels: self.week_start.labels(),
      leading_blanks: grid.leading_blanks,
      cells,
      weeks
    })
  }

  fn mark_for(
    &self,
    day: CalendarDay
  ) -> CellMark {
    let status =
      self.availability.status(day);
    if status != DayStatus::Open {
      CellMark::Blocked(status)
    } else if self.selection.start()
      == Some(day)
      || self.selection.end() == Some(day)
    {
      CellMark::Endpoint
    } else if self.selection.covers(day) {
      CellMark::InRange
    } else {
      CellMark::Open
    }
  }

  /// Validates the selection and hands
  /// it to `handler`. A rejected
  /// selection stays in place for
  /// correction and the handler is not
  /// called.
  #[instrument(skip(self, handler), fields(item_id = %self.item_id))]
  pub fn submit<H>(
    &mut self,
    handler: &mut H
  ) -> anyhow::Result<SubmitOutcome>
  where
    H: BookingHandler + ?Sized
  {
    self.error = None;
    match self
      .selection
      .validate(&self.availability)
    {
      | Err(err) => {
        warn!(error = ?err, "rental request rejected");
        self.error = Some(err);
        Ok(SubmitOutcome::Rejected(err))
      }
      | Ok(range) => {
        handler.on_request(
          &self.item_id,
          range.start,
          range.end
        )?;
        debug!(%range, "range handed to booking handler");
        Ok(SubmitOutcome::Requested(range))
      }
    }
  }

  pub fn cancel(self) {
    debug!(
      item_id = %self.item_id,
      selection = ?self.selection,
      "picker cancelled"
    );
  }
}
