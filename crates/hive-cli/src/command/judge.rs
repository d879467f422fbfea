use std::{path::PathBuf, time::Duration};

use hive_genetic::{CommandMatchRunner, Payload};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub(crate) enum PayloadKind {
    /// Encoded genes on the command line
    #[default]
    Inline,
    /// Paths to chromosome files
    Files,
}

/// External judge used to play matches.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct JudgeArg {
    /// Judge program; called as `<JUDGE> <JUDGE_ARG>... <FIRST> <SECOND>`
    #[arg(long)]
    judge: String,
    /// Extra argument passed to the judge before the two players (repeatable)
    #[arg(long = "judge-arg", allow_hyphen_values = true)]
    judge_args: Vec<String>,
    /// How players are passed to the judge: inline or files
    #[arg(long, default_value = "inline")]
    payload: PayloadKind,
    /// Directory for chromosome files when `--payload files` is used
    #[arg(long, default_value = "matches")]
    payload_dir: PathBuf,
    /// Seconds before a match is killed
    #[arg(long, default_value_t = 60)]
    timeout: u64,
}

impl JudgeArg {
    pub(crate) fn runner(&self) -> CommandMatchRunner {
        let payload = match self.payload {
            PayloadKind::Inline => Payload::Inline,
            PayloadKind::Files => Payload::Files {
                dir: self.payload_dir.clone(),
            },
        };
        CommandMatchRunner::new(self.judge.clone(), self.judge_args.iter().cloned())
            .with_payload(payload)
            .with_timeout(Duration::from_secs(self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Wrapper {
        #[clap(flatten)]
        judge: JudgeArg,
    }

    #[test]
    fn test_runner_from_flags() {
        let args = Wrapper::try_parse_from([
            "judge",
            "--judge",
            "python3",
            "--judge-arg",
            "referee.py",
            "--payload",
            "files",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(args.judge.judge_args, ["referee.py"]);
        let runner = args.judge.runner();
        assert_eq!(runner.program(), "python3");
        assert_eq!(runner.timeout(), Duration::from_secs(5));
    }
}
