pub mod availability;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod forms;
pub mod model;
pub mod picker;
pub mod render;
pub mod seed;
pub mod selection;
pub mod store;

use std::ffi::OsString;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  NaiveTime,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::calendar::CalendarDay;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting oibillim CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rcfile.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let tz = *datetime::project_timezone();
  let (now, today) = match cli.today {
    | Some(day) => {
      (noon_of(day, &tz)?, day)
    }
    | None => {
      let now = Utc::now();
      (now, datetime::today_in(now, &tz))
    }
  };
  debug!(%now, %today, timezone = %tz, "resolved clock");

  let seed_path =
    cli.seed.or_else(|| cfg.seed_path());
  let seed =
    seed::load(seed_path.as_deref())
      .context(
        "failed to load seed dataset"
      )?;
  let store =
    store::AppStore::from_seed(seed, tz)
      .with_period_policy(
        cfg.period_policy()?
      );

  let renderer =
    render::Renderer::new(&cfg, tz)?;
  let mut app = commands::App::new(
    store,
    renderer,
    cfg.week_start()?,
    now,
    today
  );

  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;
  commands::dispatch(&mut app, inv)?;

  info!("done");
  Ok(())
}

/// Midday of `day` in `tz`, as the clock
/// for a pinned `--today`.
fn noon_of(
  day: CalendarDay,
  tz: &Tz
) -> anyhow::Result<DateTime<Utc>> {
  let noon = NaiveTime::from_hms_opt(
    12, 0, 0
  )
  .ok_or_else(|| {
    anyhow!("invalid time of day")
  })?;
  tz.from_local_datetime(
    &day.date().and_time(noon)
  )
  .single()
  .map(|local| {
    local.with_timezone(&Utc)
  })
  .ok_or_else(|| {
    anyhow!(
      "{day} has no unambiguous noon in \
       {tz}"
    )
  })
}
