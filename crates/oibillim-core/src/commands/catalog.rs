use std::io::Write;

use tracing::{info, instrument};

use super::{App, required};
use crate::calendar::parse_month_key;

#[instrument(skip(app, out, args))]
pub(super) fn cmd_search<W: Write>(
    app: &mut App,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    let query = args.join(" ");
    info!(query = %query, "command search");

    let found = app.store.search(&query);
    app.renderer.print_item_table(out, &app.store, &found)
}

#[instrument(skip(app, out, args))]
pub(super) fn cmd_show<W: Write>(app: &mut App, out: &mut W, args: &[String]) -> anyhow::Result<()> {
    let item_id = required(args, 0, "item id")?;
    info!(item_id, "command show");

    let item = app.store.require_item(item_id)?;
    app.renderer.print_item_detail(out, &app.store, item)
}

/// Read-only month view of an item's availability.
#[instrument(skip(app, out, args))]
pub(super) fn cmd_calendar<W: Write>(
    app: &mut App,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    let item_id = required(args, 0, "item id")?;
    info!(item_id, "command calendar");

    let mut picker = app.store.open_picker(item_id, app.week_start, app.today)?;
    if let Some(raw) = args.get(1) {
        let (year, month) = parse_month_key(raw)?;
        picker.show_month(year, month);
    }
    app.renderer.print_picker(out, &picker)
}
