use clap::{Parser, Subcommand};

use crate::logger;

use self::{plan::PlanArg, replay_match::ReplayMatchArg, train::TrainArg};

mod judge;
mod plan;
mod replay_match;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log more (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve planner weights with a tournament between chromosomes
    Train(#[clap(flatten)] TrainArg),
    /// Print the actions planned for one board snapshot
    Plan(#[clap(flatten)] PlanArg),
    /// Run one match between two saved chromosomes
    ReplayMatch(#[clap(flatten)] ReplayMatchArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    logger::init_logger(logger::level(args.verbose, args.quiet))?;
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Plan(arg) => plan::run(&arg)?,
        Mode::ReplayMatch(arg) => replay_match::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let args = CommandArgs::try_parse_from(["hive", "-vv", "plan", "--board", "board.json"])
            .unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.mode, Mode::Plan(_)));

        let args = CommandArgs::try_parse_from([
            "hive",
            "replay-match",
            "--judge",
            "./judge",
            "--judge-arg=--seed=3",
            "a.txt",
            "b.txt",
            "--quiet",
        ])
        .unwrap();
        assert!(args.quiet);
        assert!(matches!(args.mode, Mode::ReplayMatch(_)));

        assert!(CommandArgs::try_parse_from(["hive", "-q", "-v", "plan", "--board", "b"]).is_err());
    }
}
