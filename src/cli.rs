use autocommit_core::Trigger;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "autocommit")]
#[command(about = "Stage, commit and push every working-tree change on a schedule")]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Working tree to commit (overrides config)
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,

    /// Remote to push to (overrides config)
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Branch to push (overrides config; defaults to the current branch)
    #[arg(long, global = true)]
    pub branch: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run once and exit (the default)
    Run {
        /// Label for what started this run
        #[arg(long, value_enum, default_value_t = TriggerArg::Manual)]
        trigger: TriggerArg,
    },
    /// Stay running and fire on the configured schedule
    Daemon,
    /// Print the next fire times of the schedule
    Next {
        #[arg(long, default_value_t = 5)]
        count: u16,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerArg {
    Manual,
    Schedule,
}

impl From<TriggerArg> for Trigger {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::Manual => Trigger::Manual,
            TriggerArg::Schedule => Trigger::Schedule,
        }
    }
}

impl CliArgs {
    /// The subcommand to execute, `run` when none was given
    pub fn resolved_command(&self) -> Command {
        match &self.command {
            Some(Command::Run { trigger }) => Command::Run { trigger: *trigger },
            Some(Command::Daemon) => Command::Daemon,
            Some(Command::Next { count }) => Command::Next { count: *count },
            None => Command::Run {
                trigger: TriggerArg::Manual,
            },
        }
    }
}
