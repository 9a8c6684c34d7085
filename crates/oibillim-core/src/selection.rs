use thiserror::Error;
use tracing::trace;

use crate::availability::{
  Availability,
  DayStatus
};
use crate::calendar::{
  CalendarDay,
  DateRange
};

/// Two-click start/end pick. `end` is
/// never before `start`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum Selection {
  #[default]
  Empty,
  StartOnly {
    start: CalendarDay
  },
  Complete {
    start: CalendarDay,
    end:   CalendarDay
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
  Ignored {
    day:    CalendarDay,
    status: DayStatus
  },
  Started {
    start: CalendarDay
  },
  Completed {
    start: CalendarDay,
    end:   CalendarDay
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Error,
)]
pub enum SelectionError {
  #[error(
    "시작일과 종료일을 모두 선택하세요."
  )]
  Incomplete,

  #[error(
    "종료일이 시작일보다 빠를 수 없습니다."
  )]
  EndBeforeStart {
    start: CalendarDay,
    end:   CalendarDay
  },

  #[error(
    "선택한 기간에 이미 예약된 날짜가 \
     포함되어 있습니다."
  )]
  RangeConflict {
    day: CalendarDay
  }
}

impl Selection {
  pub fn start(&self) -> Option<CalendarDay> {
    match *self {
      | Self::Empty => None,
      | Self::StartOnly {
        start
      }
      | Self::Complete {
        start, ..
      } => Some(start)
    }
  }

  pub fn end(&self) -> Option<CalendarDay> {
    match *self {
      | Self::Complete {
        end, ..
      } => Some(end),
      | _ => None
    }
  }

  pub fn is_complete(&self) -> bool {
    matches!(self, Self::Complete { .. })
  }

  /// Whether `day` is inside a complete
  /// selection.
  pub fn covers(
    &self,
    day: CalendarDay
  ) -> bool {
    match *self {
      | Self::Complete {
        start,
        end
      } => {
        DateRange::new(start, end)
          .is_some_and(|range| {
            range.contains(day)
          })
      }
      | _ => false
    }
  }

  /// Orders the bounds before storing
  /// them, so the invariant holds for
  /// typed input too.
  pub fn from_bounds(
    start: CalendarDay,
    end: CalendarDay
  ) -> Result<Self, SelectionError> {
    if end < start {
      return Err(
        SelectionError::EndBeforeStart {
          start,
          end
        }
      );
    }
    Ok(Self::Complete {
      start,
      end
    })
  }

  pub fn click(
    &mut self,
    day: CalendarDay,
    availability: &Availability
  ) -> ClickOutcome {
    let status = availability.status(day);
    if status != DayStatus::Open {
      trace!(%day, ?status, "click on blocked day ignored");
      return ClickOutcome::Ignored {
        day,
        status
      };
    }

    match *self {
      | Self::StartOnly {
        start
      } if day >= start => {
        *self = Self::Complete {
          start,
          end: day
        };
        ClickOutcome::Completed {
          start,
          end: day
        }
      }
      | _ => {
        *self = Self::StartOnly {
          start: day
        };
        ClickOutcome::Started {
          start: day
        }
      }
    }
  }

  /// Re-checks the whole span against
  /// `availability`.
  pub fn validate(
    &self,
    availability: &Availability
  ) -> Result<DateRange, SelectionError> {
    let Self::Complete {
      start,
      end
    } = *self
    else {
      return Err(
        SelectionError::Incomplete
      );
    };
    validate_range(
      start,
      end,
      availability
    )
  }
}

pub fn validate_range(
  start: CalendarDay,
  end: CalendarDay,
  availability: &Availability
) -> Result<DateRange, SelectionError> {
  let range = DateRange::new(start, end)
    .ok_or(
      SelectionError::EndBeforeStart {
        start,
        end
      }
    )?;

  if let Some(day) = availability
    .first_blocked_in(start, end)
  {
    return Err(
      SelectionError::RangeConflict {
        day
      }
    );
  }

  Ok(range)
}
