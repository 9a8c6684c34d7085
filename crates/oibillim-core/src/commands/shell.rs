use std::io::{BufRead, Write};

use anyhow::anyhow;
use tracing::{debug, info, instrument, warn};

use super::{App, execute, expand_command_abbrev, known_command_names, parse_day, required};
use crate::picker::{RentalPicker, SubmitOutcome};
use crate::selection::ClickOutcome;
use crate::store::{Notice, StoreBooking};

const PROMPT: &str = "oibillim> ";

const PICKER_COMMANDS: [&str; 9] = [
    "open", "click", "range", "prev", "next", "submit", "cancel", "quit", "exit",
];

/// Interactive session over one store. Lines are commands; the picker
/// commands drive a calendar session that lives until submit or cancel.
#[instrument(skip_all)]
pub(super) fn cmd_shell<R: BufRead, W: Write>(
    app: &mut App,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command shell");

    let mut line = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let Some((head, args)) = tokens.split_first() else {
            continue;
        };
        if head == "quit" || head == "exit" {
            break;
        }

        if let Err(err) = run_line(app, out, head, args) {
            warn!(error = %err, line = %line.trim(), "shell command failed");
            writeln!(out, "error: {err:#}")?;
        }
    }

    if let Some(picker) = app.picker.take() {
        picker.cancel();
    }
    debug!("shell closed");
    Ok(())
}

fn run_line<W: Write>(
    app: &mut App,
    out: &mut W,
    head: &str,
    args: &[String],
) -> anyhow::Result<()> {
    if PICKER_COMMANDS.contains(&head) {
        return run_picker_command(app, out, head, args);
    }

    let known = known_command_names();
    let command = expand_command_abbrev(head, &known)
        .ok_or_else(|| anyhow!("unknown command: {head}"))?;
    execute(app, out, command, args)
}

fn run_picker_command<W: Write>(
    app: &mut App,
    out: &mut W,
    head: &str,
    args: &[String],
) -> anyhow::Result<()> {
    if head == "open" {
        let item_id = required(args, 0, "item id")?;
        if let Some(previous) = app.picker.take() {
            previous.cancel();
        }
        let picker = app.store.open_picker(item_id, app.week_start, app.today)?;
        app.renderer.print_picker(out, &picker)?;
        app.picker = Some(picker);
        return Ok(());
    }

    if head == "cancel" {
        let picker = active(app.picker.take())?;
        picker.cancel();
        writeln!(out, "선택이 취소되었습니다.")?;
        return Ok(());
    }

    let Some(picker) = app.picker.as_mut() else {
        return Err(anyhow!("no calendar open; use `open <id>` first"));
    };

    match head {
        "click" => {
            let day = parse_day(required(args, 0, "day")?)?;
            if let ClickOutcome::Ignored { day, status } = picker.click(day) {
                writeln!(out, "{day}: {}", status.label())?;
            }
        }
        "range" => {
            let start = parse_day(required(args, 0, "start date")?)?;
            let end = parse_day(required(args, 1, "end date")?)?;
            if let Err(err) = picker.enter_range(start, end) {
                app.renderer.print_notice(out, &Notice::Conflict(err))?;
            }
        }
        "prev" => picker.prev_month(),
        "next" => picker.next_month(),
        "submit" => {
            let mut booking = StoreBooking::new(&mut app.store, app.now);
            if let SubmitOutcome::Requested(range) = picker.submit(&mut booking)? {
                let notice = booking
                    .into_notice()
                    .ok_or_else(|| anyhow!("booking produced no result"))?;
                app.renderer.print_notice(out, &notice)?;
                if notice.is_rejection() {
                    warn!(%range, %notice, "store refused rental; calendar stays open");
                    return Ok(());
                }
                info!(%range, "shell rental submitted");
                app.picker = None;
                return Ok(());
            }
        }
        other => return Err(anyhow!("unknown calendar command: {other}")),
    }

    app.renderer.print_picker(out, picker)
}

fn active(picker: Option<RentalPicker>) -> anyhow::Result<RentalPicker> {
    picker.ok_or_else(|| anyhow!("no calendar open"))
}
