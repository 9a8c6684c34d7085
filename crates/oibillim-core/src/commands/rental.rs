use std::io::Write;

use anyhow::anyhow;
use tracing::{info, instrument, warn};

use super::{App, parse_day, required};
use crate::availability::PeriodEditor;
use crate::calendar::CalendarDay;
use crate::picker::SubmitOutcome;
use crate::store::{Action, Notice, StoreBooking};

/// `request <id>` asks for the item as is. `request <id> <start> <end>`
/// goes through the calendar picker first.
#[instrument(skip(app, out, args))]
pub(super) fn cmd_request<W: Write>(
    app: &mut App,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    let item_id = required(args, 0, "item id")?;
    info!(item_id, "command request");

    let notice = match (args.get(1), args.get(2)) {
        (None, _) => app.store.dispatch(
            Action::RequestRental {
                item_id: item_id.to_string(),
                range: None,
            },
            app.now,
        )?,
        (Some(_), None) => return Err(anyhow!("missing argument: end date")),
        (Some(start), Some(end)) => {
            let (start, end) = (parse_day(start)?, parse_day(end)?);
            let mut picker = app.store.open_picker(item_id, app.week_start, app.today)?;
            if let Err(err) = picker.enter_range(start, end) {
                warn!(%err, "typed range rejected");
                return app.renderer.print_notice(out, &Notice::Conflict(err));
            }

            let mut booking = StoreBooking::new(&mut app.store, app.now);
            match picker.submit(&mut booking)? {
                SubmitOutcome::Rejected(_) => {
                    app.renderer.print_picker(out, &picker)?;
                    return Ok(());
                }
                SubmitOutcome::Requested(range) => {
                    info!(%range, "range handed to store");
                    booking
                        .into_notice()
                        .ok_or_else(|| anyhow!("booking produced no result"))?
                }
            }
        }
    };

    app.renderer.print_notice(out, &notice)
}

#[instrument(skip(app, out, args))]
pub(super) fn cmd_return<W: Write>(
    app: &mut App,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    let item_id = required(args, 0, "item id")?;
    info!(item_id, "command return");

    let notice = app.store.dispatch(
        Action::ReturnItem {
            item_id: item_id.to_string(),
        },
        app.now,
    )?;
    app.renderer.print_notice(out, &notice)
}

pub(super) fn cmd_borrowed<W: Write>(app: &mut App, out: &mut W) -> anyhow::Result<()> {
    info!("command borrowed");
    app.renderer.print_borrowed(out, &app.store)
}

/// Without edits, lists the item's periods. Edits apply in order:
/// `START..END` adds a period, `-N` removes the N-th, `clear` drops all.
#[instrument(skip(app, out, args))]
pub(super) fn cmd_period<W: Write>(
    app: &mut App,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    let item_id = required(args, 0, "item id")?;
    info!(item_id, "command period");

    let item = app.store.require_item(item_id)?;
    let ranges = &args[1..];
    if ranges.is_empty() {
        return app.renderer.print_periods(out, &item.available_periods);
    }

    let mut editor = PeriodEditor::new(&item.available_periods);
    for raw in ranges {
        if raw == "clear" {
            editor = PeriodEditor::default();
            continue;
        }
        if let Some(index) = raw.strip_prefix('-') {
            let index: usize = index
                .parse()
                .map_err(|_| anyhow!("invalid period number: {raw}"))?;
            index
                .checked_sub(1)
                .and_then(|idx| editor.remove(idx))
                .ok_or_else(|| anyhow!("no period number {index}"))?;
            continue;
        }

        let (start, end) = split_period(raw)?;
        if let Err(err) = editor.add(start, end) {
            warn!(range = %raw, %err, "period rejected");
            return app.renderer.print_notice(out, &Notice::Invalid(err));
        }
    }

    let periods = editor.finish();
    let notice = app.store.dispatch(
        Action::SavePeriods {
            item_id: item_id.to_string(),
            periods,
        },
        app.now,
    )?;
    app.renderer.print_notice(out, &notice)?;

    if !notice.is_rejection() {
        let item = app.store.require_item(item_id)?;
        app.renderer.print_periods(out, &item.available_periods)?;
    }
    Ok(())
}

/// `start..end`, either side may be left blank.
fn split_period(raw: &str) -> anyhow::Result<(Option<CalendarDay>, Option<CalendarDay>)> {
    let Some((start, end)) = raw.split_once("..") else {
        return Err(anyhow!("expected START..END, got: {raw}"));
    };
    let side = |text: &str| -> anyhow::Result<Option<CalendarDay>> {
        let text = text.trim();
        if text.is_empty() {
            Ok(None)
        } else {
            parse_day(text).map(Some)
        }
    };
    Ok((side(start)?, side(end)?))
}
