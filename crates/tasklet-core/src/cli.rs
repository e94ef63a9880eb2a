use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::filter::{PriorityFilter, SortMode, StatusFilter};
use crate::task::Priority;

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
    name = "tasklet",
    version,
    about = "Tasklet: a dated todo list with priorities and themes",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add a task after validating its text and due date
    Add {
        text: Vec<String>,

        /// YYYY-MM-DD, today, tomorrow, +3d, +1w, or a weekday name
        #[arg(short, long, default_value = "")]
        due: String,

        #[arg(short, long)]
        priority: Option<Priority>,
    },

    /// Show tasks through the status/priority filters and sort order
    List(ListArgs),

    /// Flip a task between active and completed
    #[command(visible_alias = "done")]
    Toggle { id: u64 },

    /// Delete a task after confirmation; unknown ids are ignored
    #[command(visible_alias = "rm")]
    Delete {
        id: u64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every completed task
    ClearCompleted,

    /// Show the active theme, or switch to a new one
    Theme { name: Option<String> },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// all, active, or completed
    #[arg(short, long)]
    pub status: Option<StatusFilter>,

    /// all, high, medium, or low
    #[arg(short, long)]
    pub priority: Option<PriorityFilter>,

    /// date-asc, date-desc, priority, or name
    #[arg(long)]
    pub sort: Option<SortMode>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 1 {
        "error"
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
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Command, GlobalCli};
    use crate::filter::{PriorityFilter, SortMode, StatusFilter};
    use crate::task::Priority;

    #[test]
    fn parses_add_with_words_and_flags() {
        let cli = GlobalCli::try_parse_from([
            "tasklet", "-v", "add", "Buy", "milk", "--due", "tomorrow", "-p", "high",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Some(Command::Add { text, due, priority }) => {
                assert_eq!(text.join(" "), "Buy milk");
                assert_eq!(due, "tomorrow");
                assert_eq!(priority, Some(Priority::High));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_list_filters() {
        let cli = GlobalCli::try_parse_from([
            "tasklet", "list", "--status", "active", "-p", "low", "--sort", "name",
        ])
        .expect("parse");
        match cli.command {
            Some(Command::List(args)) => {
                assert_eq!(args.status, Some(StatusFilter::Active));
                assert_eq!(args.priority, Some(PriorityFilter::Only(Priority::Low)));
                assert_eq!(args.sort, Some(SortMode::Name));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_sort_mode() {
        assert!(GlobalCli::try_parse_from(["tasklet", "list", "--sort", "newest"]).is_err());
    }

    #[test]
    fn done_is_an_alias_for_toggle() {
        let cli = GlobalCli::try_parse_from(["tasklet", "done", "17"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Toggle { id: 17 })));
    }

    #[test]
    fn delete_asks_unless_yes_is_given() {
        let cli = GlobalCli::try_parse_from(["tasklet", "rm", "5"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Delete { id: 5, yes: false })));

        let cli = GlobalCli::try_parse_from(["tasklet", "delete", "5", "-y"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Delete { id: 5, yes: true })));
    }

    #[test]
    fn rc_overrides_collect_key_values() {
        let cli = GlobalCli::try_parse_from(["tasklet", "--rc", "color=off", "--rc", "timezone=UTC"])
            .expect("parse");
        assert_eq!(cli.rc_overrides.len(), 2);
        assert_eq!(cli.rc_overrides[0].key, "color");
        assert_eq!(cli.rc_overrides[1].value, "UTC");
        assert!(cli.command.is_none());
    }
}
