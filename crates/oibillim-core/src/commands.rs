use std::io::{self, Write};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::calendar::{CalendarDay, WeekStart};
use crate::cli::Invocation;
use crate::picker::RentalPicker;
use crate::render::Renderer;
use crate::store::AppStore;

mod catalog;
mod profile;
mod rental;
mod shell;
mod social;

/// Everything a command needs: the store, output settings and the clock.
pub struct App {
    pub store: AppStore,
    renderer: Renderer,
    week_start: WeekStart,
    now: DateTime<Utc>,
    today: CalendarDay,
    picker: Option<RentalPicker>,
}

impl App {
    pub fn new(
        store: AppStore,
        renderer: Renderer,
        week_start: WeekStart,
        now: DateTime<Utc>,
        today: CalendarDay,
    ) -> Self {
        Self {
            store,
            renderer,
            week_start,
            now,
            today,
            picker: None,
        }
    }

    pub fn picker(&self) -> Option<&RentalPicker> {
        self.picker.as_ref()
    }
}

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "search",
        "show",
        "calendar",
        "request",
        "return",
        "borrowed",
        "review",
        "favorite",
        "favorites",
        "profile",
        "owner",
        "points",
        "chats",
        "chat",
        "period",
        "register",
        "shell",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(app, inv))]
pub fn dispatch(app: &mut App, inv: Invocation) -> anyhow::Result<()> {
    if inv.command == "shell" {
        let stdin = io::stdin();
        let stdout = io::stdout();
        return shell::cmd_shell(app, &mut stdin.lock(), &mut stdout.lock());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(app, &mut out, &inv.command, &inv.args)
}

/// Runs one non-interactive command against `app`, writing to `out`.
#[instrument(skip(app, out, args))]
pub fn execute<W: Write>(
    app: &mut App,
    out: &mut W,
    command: &str,
    args: &[String],
) -> anyhow::Result<()> {
    debug!(command, ?args, "dispatching command");

    match command {
        "search" => catalog::cmd_search(app, out, args),
        "show" => catalog::cmd_show(app, out, args),
        "calendar" => catalog::cmd_calendar(app, out, args),
        "request" => rental::cmd_request(app, out, args),
        "return" => rental::cmd_return(app, out, args),
        "borrowed" => rental::cmd_borrowed(app, out),
        "period" => rental::cmd_period(app, out, args),
        "review" => social::cmd_review(app, out, args),
        "favorite" => social::cmd_favorite(app, out, args),
        "favorites" => social::cmd_favorites(app, out),
        "chats" => social::cmd_chats(app, out),
        "chat" => social::cmd_chat(app, out, args),
        "profile" => profile::cmd_profile(app, out),
        "owner" => profile::cmd_owner(app, out, args),
        "points" => profile::cmd_points(app, out),
        "register" => profile::cmd_register(app, out, args),
        "help" => cmd_help(out),
        "version" => {
            writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }
        "shell" => Err(anyhow!("shell cannot be nested")),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

fn cmd_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "oibillim [options] <command> [args]")?;
    writeln!(out)?;
    writeln!(out, "  search [query]                  물품 검색")?;
    writeln!(out, "  show <id>                       물품 상세")?;
    writeln!(out, "  calendar <id> [YYYY-MM]         예약 달력")?;
    writeln!(out, "  request <id> [<start> <end>]    대여 요청")?;
    writeln!(out, "  return <id>                     반납")?;
    writeln!(out, "  borrowed                        대여한 물품")?;
    writeln!(out, "  review <id> <1-5> <text> [--owner]")?;
    writeln!(out, "  favorite <id> / favorites       관심 품목")?;
    writeln!(out, "  profile / owner <ownerId>       프로필")?;
    writeln!(out, "  points                          포인트 내역")?;
    writeln!(out, "  chats / chat <partner> [text]   채팅")?;
    writeln!(out, "  period <id> [start..end ...]    대여 가능 기간 설정")?;
    writeln!(out, "  register key=value ...          물품 등록")?;
    writeln!(out, "  shell                           대화형 모드")?;
    Ok(())
}

fn required<'a>(args: &'a [String], idx: usize, what: &str) -> anyhow::Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument: {what}"))
}

fn parse_day(raw: &str) -> anyhow::Result<CalendarDay> {
    raw.parse::<CalendarDay>()
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {raw}"))
}
