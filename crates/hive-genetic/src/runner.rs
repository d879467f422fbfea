use std::{
    fs,
    io::{Read as _, Write as _},
    path::PathBuf,
    process::{Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use tempfile::NamedTempFile;

use crate::{
    chromosome::Chromosome,
    gene::Gene,
    tournament::{MatchError, MatchOutcome, MatchRunner, parse_score_line},
};

/// How chromosomes are handed to the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// The encoded genes themselves, one argument per player.
    Inline,
    /// A path to `dir/{generation:05}_{id}.txt` holding the encoded genes.
    Files { dir: PathBuf },
}

/// Runs a match by spawning an external judge.
///
/// The judge is invoked as `program args.. first second` and must print the
/// final scores on its last non-empty stdout line. Stderr is discarded.
#[derive(Debug, Clone)]
pub struct CommandMatchRunner {
    program: String,
    args: Vec<String>,
    payload: Payload,
    timeout: Duration,
    poll: Duration,
}

impl CommandMatchRunner {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            payload: Payload::Inline,
            timeout: Self::DEFAULT_TIMEOUT,
            poll: Duration::from_millis(10),
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn payload_arg<G>(&self, chromosome: &Chromosome<G>) -> Result<String, MatchError>
    where
        G: Gene,
    {
        match &self.payload {
            Payload::Inline => Ok(chromosome.encode()),
            Payload::Files { dir } => {
                let path = dir.join(chromosome.file_name());
                if !path.exists() {
                    // renamed into place, concurrent matches may share a player
                    fs::create_dir_all(dir).map_err(|source| MatchError::Io { source })?;
                    let mut file =
                        NamedTempFile::new_in(dir).map_err(|source| MatchError::Io { source })?;
                    file.write_all(chromosome.encode().as_bytes())
                        .map_err(|source| MatchError::Io { source })?;
                    file.persist(&path).map_err(|e| MatchError::Io { source: e.error })?;
                }
                Ok(path.display().to_string())
            }
        }
    }

    fn run(&self, first: String, second: String) -> Result<(ExitStatus, String), MatchError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(first)
            .arg(second)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| MatchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // drained on its own thread so a chatty judge cannot fill the pipe and stall
        let mut stdout = child.stdout.take().ok_or(MatchError::NoOutput)?;
        let reader = thread::spawn(move || {
            let mut output = String::new();
            stdout.read_to_string(&mut output).map(|_| output)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(MatchError::Timeout {
                        after: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(self.poll),
                Err(source) => {
                    let _ = child.kill();
                    return Err(MatchError::Io { source });
                }
            }
        };

        let output = reader
            .join()
            .map_err(|_| MatchError::Other {
                message: "stdout reader panicked".to_owned(),
            })?
            .map_err(|source| MatchError::Io { source })?;
        Ok((status, output))
    }
}

/// Parses the judge's output.
///
/// A non-zero exit is only an error when no score line can be read.
fn outcome_from_output(status: ExitStatus, output: &str) -> Result<MatchOutcome, MatchError> {
    let Some(line) = output.lines().map(str::trim).rfind(|line| !line.is_empty()) else {
        return Err(if status.success() {
            MatchError::NoOutput
        } else {
            MatchError::Exit { status }
        });
    };
    parse_score_line(line).map_err(|error| {
        if status.success() {
            error
        } else {
            MatchError::Exit { status }
        }
    })
}

impl<G> MatchRunner<G> for CommandMatchRunner
where
    G: Gene,
{
    fn run_match(
        &self,
        first: &Chromosome<G>,
        second: &Chromosome<G>,
    ) -> Result<MatchOutcome, MatchError> {
        let (status, output) = self.run(self.payload_arg(first)?, self.payload_arg(second)?)?;
        outcome_from_output(status, &output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::{chromosome::ChromosomeId, gene::WeightGene};

    fn chromosome(id: &str, values: &[f64]) -> Chromosome<WeightGene> {
        Chromosome::with_id(
            id.parse::<ChromosomeId>().unwrap(),
            3,
            values.iter().copied().map(WeightGene::new).collect(),
        )
    }

    // `sh -c script` binds the two payloads to `$0` and `$1`
    fn shell(script: &str) -> CommandMatchRunner {
        CommandMatchRunner::new("sh", ["-c", script]).with_timeout(Duration::from_secs(10))
    }

    #[test]
    fn test_last_line_is_parsed() {
        let (a, b) = (chromosome("1", &[1.0]), chromosome("2", &[2.0]));
        let outcome = shell("echo turn 1; echo; echo '12, 7'; echo")
            .run_match(&a, &b)
            .unwrap();
        assert_eq!(outcome, MatchOutcome::new(12, 7));

        let outcome = shell("echo '{0: 3, 1: 9}'").run_match(&a, &b).unwrap();
        assert_eq!(outcome, MatchOutcome::new(3, 9));
    }

    #[test]
    fn test_inline_payload() {
        let (a, b) = (chromosome("1", &[1.5, -2.0]), chromosome("2", &[0.0, 3.0]));
        let script = format!(
            r#"test "$0" = "{}" && test "$1" = "{}" && echo 1 0 || echo 0 1"#,
            a.encode(),
            b.encode()
        );
        let outcome = shell(&script).run_match(&a, &b).unwrap();
        assert_eq!(outcome, MatchOutcome::new(1, 0));
    }

    #[test]
    fn test_file_payload() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = (chromosome("a1", &[4.0]), chromosome("b2", &[-4.0]));
        let runner = shell(r#"test -f "$0" && test -f "$1" && echo 5 6 200"#).with_payload(
            Payload::Files {
                dir: dir.path().join("players"),
            },
        );
        let outcome = runner.run_match(&a, &b).unwrap();
        assert_eq!(outcome.scores, [5, 6]);
        assert_eq!(outcome.rounds, Some(200));

        let saved = fs::read_to_string(dir.path().join("players").join(a.file_name())).unwrap();
        assert_eq!(saved, a.encode());
    }

    #[test]
    fn test_file_payload_shared_between_matches() {
        let dir = tempfile::tempdir().unwrap();
        let players = dir.path().join("players");
        let shared = chromosome("c3", &[1.5, -2.0, 0.25]);
        let expected = shared.encode();
        let runner = shell(r#"cat "$0" "$1" > /dev/null && echo 1 1"#).with_payload(
            Payload::Files {
                dir: players.clone(),
            },
        );

        thread::scope(|s| {
            for i in 0..8 {
                let (runner, shared) = (&runner, &shared);
                s.spawn(move || {
                    let other = chromosome(&format!("d{i}"), &[f64::from(i)]);
                    let outcome = runner.run_match(shared, &other).unwrap();
                    assert_eq!(outcome.scores, [1, 1]);
                });
            }
        });

        let saved = fs::read_to_string(players.join(shared.file_name())).unwrap();
        assert_eq!(saved, expected);
        // no temporary files are left behind
        assert_eq!(fs::read_dir(&players).unwrap().count(), 9);
    }

    #[test]
    fn test_failures() {
        let (a, b) = (chromosome("1", &[1.0]), chromosome("2", &[2.0]));

        let error = shell("exit 3").run_match(&a, &b).unwrap_err();
        assert!(matches!(error, MatchError::Exit { .. }), "{error:?}");

        let error = shell("true").run_match(&a, &b).unwrap_err();
        assert!(matches!(error, MatchError::NoOutput), "{error:?}");

        let error = shell("echo draw").run_match(&a, &b).unwrap_err();
        assert!(
            matches!(error, MatchError::MalformedOutput { .. }),
            "{error:?}"
        );

        // a score line still counts when the judge exits non-zero
        let outcome = shell("echo 2 1; exit 1").run_match(&a, &b).unwrap();
        assert_eq!(outcome, MatchOutcome::new(2, 1));

        let error = CommandMatchRunner::new("/nonexistent/judge", Vec::<String>::new())
            .run_match(&a, &b)
            .unwrap_err();
        assert!(matches!(error, MatchError::Spawn { .. }), "{error:?}");
    }

    #[test]
    fn test_timeout_kills_judge() {
        let (a, b) = (chromosome("1", &[1.0]), chromosome("2", &[2.0]));
        let started = Instant::now();
        let error = shell("exec sleep 30")
            .with_timeout(Duration::from_millis(200))
            .run_match(&a, &b)
            .unwrap_err();
        assert!(matches!(error, MatchError::Timeout { .. }), "{error:?}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
