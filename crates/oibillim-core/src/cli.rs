use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::calendar::CalendarDay;
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "oibillim",
    version,
    about = "오이빌림: neighbourhood rental marketplace in the terminal",
    disable_help_subcommand = true,
    arg_required_else_help = false
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "rcfile")]
    pub rcfile: Option<PathBuf>,

    /// JSON dataset to start from instead of the built-in one.
    #[arg(long = "seed")]
    pub seed: Option<PathBuf>,

    /// Pretend the current date is this day (YYYY-MM-DD).
    #[arg(long = "today")]
    pub today: Option<CalendarDay>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest.split_once('=').or_else(|| rest.split_once(':'));
            if let Some((k, v)) = parsed {
                let key = format!("rc.{k}");
                debug!(key = %key, value = %v, "captured positional rc override");
                overrides.push((key, v.to_string()));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// The first token names the command when it is a known command or a
    /// unique prefix of one. Anything else goes to the default command.
    #[tracing::instrument(skip(cfg, rest))]
    pub fn parse(cfg: &Config, rest: Vec<OsString>) -> anyhow::Result<Self> {
        let tokens: Vec<String> = rest
            .into_iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();

        let default_command = cfg
            .get("default.command")
            .unwrap_or_else(|| "search".to_string());

        let Some(first) = tokens.first() else {
            debug!(command = %default_command, "no explicit command, using default");
            return Ok(Self {
                command: default_command,
                args: vec![],
            });
        };

        if tokens.len() == 1 && first.parse::<u64>().is_ok() {
            debug!(token = %first, "single numeric token interpreted as item lookup");
            return Ok(Self {
                command: "show".to_string(),
                args: tokens,
            });
        }

        let known = crate::commands::known_command_names();
        if let Some(full) = crate::commands::expand_command_abbrev(first, &known) {
            debug!(token = %first, expanded = %full, "resolved command token");
            return Ok(Self {
                command: full.to_string(),
                args: tokens[1..].to_vec(),
            });
        }

        debug!(
            command = %default_command,
            terms = tokens.len(),
            "no command detected, passing all terms to the default command"
        );
        Ok(Self {
            command: default_command,
            args: tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_captured() {
        let pre = preprocess_args(&os(&[
            "oibillim",
            "rc.color=off",
            "calendar",
            "rc.calendar.week_start:monday",
            "3",
        ]))
        .expect("preprocess");
        assert_eq!(pre.cleaned_args, os(&["oibillim", "calendar", "3"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.color".to_string(), "off".to_string()),
                ("rc.calendar.week_start".to_string(), "monday".to_string()),
            ]
        );
    }

    #[test]
    fn global_flags_parse() {
        let cli = GlobalCli::parse_from(os(&[
            "oibillim",
            "-vv",
            "--rc",
            "color=off",
            "--today",
            "2024-06-18",
            "request",
            "1",
        ]));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides[0].key, "color");
        assert_eq!(cli.today, Some("2024-06-18".parse().expect("day")));
        assert_eq!(cli.rest, os(&["request", "1"]));
    }

    #[test]
    fn invocation_resolves_commands_and_defaults() {
        let cfg = Config::default();

        let inv = Invocation::parse(&cfg, os(&["cal", "3", "2024-07"])).expect("parse");
        assert_eq!(inv.command, "calendar");
        assert_eq!(inv.args, vec!["3".to_string(), "2024-07".to_string()]);

        let inv = Invocation::parse(&cfg, os(&[])).expect("parse");
        assert_eq!(inv.command, "search");
        assert!(inv.args.is_empty());

        let inv = Invocation::parse(&cfg, os(&["4"])).expect("parse");
        assert_eq!(inv.command, "show");

        let inv = Invocation::parse(&cfg, os(&["캠핑", "텐트"])).expect("parse");
        assert_eq!(inv.command, "search");
        assert_eq!(inv.args.len(), 2);
    }
}
