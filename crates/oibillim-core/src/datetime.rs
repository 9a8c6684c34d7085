use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::anyhow;
use chrono::{
  DateTime,
  FixedOffset,
  NaiveDate,
  NaiveDateTime,
  Utc
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

use crate::calendar::{
  CalendarDay,
  DAY_KEY_FORMAT
};

const TIMEZONE_CONFIG_FILE: &str =
  "oibillim-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "OIBILLIM_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "OIBILLIM_TIME_CONFIG";
const DEFAULT_PROJECT_TIMEZONE: &str =
  "Asia/Seoul";

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d %H:%M"
];

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

pub fn project_timezone() -> &'static Tz
{
  static PROJECT_TZ: OnceLock<Tz> =
    OnceLock::new();
  PROJECT_TZ.get_or_init(
    resolve_project_timezone
  )
}

#[must_use]
pub fn today_in(
  now: DateTime<Utc>,
  tz: &Tz
) -> CalendarDay {
  now.with_timezone(tz).date_naive().into()
}

/// `2024년 6월 18일 19:00` in `tz`.
#[must_use]
pub fn format_timestamp_label(
  dt: DateTime<Utc>,
  tz: &Tz
) -> String {
  dt.with_timezone(tz)
    .format("%Y년 %-m월 %-d일 %H:%M")
    .to_string()
}

#[must_use]
pub fn format_clock_label(
  dt: DateTime<Utc>,
  tz: &Tz
) -> String {
  dt.with_timezone(tz)
    .format("%H:%M")
    .to_string()
}

fn resolve_project_timezone() -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_PROJECT_TIMEZONE,
    "DEFAULT_PROJECT_TIMEZONE"
  )
  .unwrap_or_else(|| {
    tracing::error!(
      "failed to parse fallback \
       timezone; using UTC"
    );
    chrono_tz::UTC
  })
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured project timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// A boundary timestamp as it arrives
/// from reservation data: a bare date,
/// a wall-clock time without offset, or
/// an RFC 3339 instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
  Date(NaiveDate),
  Local(NaiveDateTime),
  Zoned(DateTime<FixedOffset>)
}

impl Timestamp {
  pub fn parse(
    raw: &str
  ) -> anyhow::Result<Self> {
    let token = raw.trim();

    if let Ok(dt) =
      DateTime::parse_from_rfc3339(token)
    {
      return Ok(Self::Zoned(dt));
    }

    for format in NAIVE_DATETIME_FORMATS {
      if let Ok(ndt) =
        NaiveDateTime::parse_from_str(
          token, format
        )
      {
        return Ok(Self::Local(ndt));
      }
    }

    if let Ok(date) =
      NaiveDate::parse_from_str(
        token,
        DAY_KEY_FORMAT
      )
    {
      return Ok(Self::Date(date));
    }

    Err(anyhow!(
      "unrecognized timestamp: {token}"
    ))
  }

  /// The calendar day this timestamp
  /// falls on. Wall-clock forms keep
  /// their date component; instants are
  /// read in `tz`.
  pub fn calendar_day(
    &self,
    tz: &Tz
  ) -> CalendarDay {
    match self {
      | Self::Date(date) => (*date).into(),
      | Self::Local(ndt) => {
        ndt.date().into()
      }
      | Self::Zoned(dt) => {
        dt.with_timezone(tz)
          .date_naive()
          .into()
      }
    }
  }
}

impl From<CalendarDay> for Timestamp {
  fn from(day: CalendarDay) -> Self {
    Self::Date(day.date())
  }
}

impl fmt::Display for Timestamp {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::Date(date) => {
        write!(
          f,
          "{}",
          date.format(DAY_KEY_FORMAT)
        )
      }
      | Self::Local(ndt) => {
        write!(
          f,
          "{}",
          ndt.format("%Y-%m-%dT%H:%M:%S")
        )
      }
      | Self::Zoned(dt) => {
        write!(f, "{}", dt.to_rfc3339())
      }
    }
  }
}

impl FromStr for Timestamp {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl Serialize for Timestamp {
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

impl<'de> Deserialize<'de> for Timestamp {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    Self::parse(&raw)
      .map_err(serde::de::Error::custom)
  }
}
