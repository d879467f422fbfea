//! Relative fitness from head-to-head matches.
//!
//! Each generation plays `rounds_per_generation` rounds. A round shuffles the
//! population into disjoint pairs; an odd population pads the last pair with a
//! random other member. Every pair is one match, run through a
//! [`MatchRunner`].
//!
//! # Concurrency
//!
//! All matches of a generation are queued up front and pulled by a fixed
//! number of scoped worker threads. Results travel back over a channel tagged
//! with their job index. Scores are only touched after the pool has drained,
//! in job order, so aggregation needs no lock and a seeded run aggregates the
//! same way every time even though matches finish in any order.
//!
//! # Failures
//!
//! A match is attempted up to `max_attempts` times. When every attempt fails
//! the match is dropped: both players keep their score, and the generation
//! goes on.

use std::{
    io,
    process::ExitStatus,
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{
    chromosome::Chromosome, config::TournamentConfig, fitness::FitnessEvaluator, gene::Gene,
    population::Population,
};

/// Final scores reported by a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub scores: [i64; 2],
    /// Number of game rounds played, when the judge reports it.
    pub rounds: Option<i64>,
}

impl MatchOutcome {
    #[must_use]
    pub fn new(first: i64, second: i64) -> Self {
        Self {
            scores: [first, second],
            rounds: None,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum MatchError {
    #[display("failed to start `{program}`")]
    Spawn { program: String, source: io::Error },
    #[display("I/O error while running match")]
    Io { source: io::Error },
    #[display("match timed out after {after:?}")]
    Timeout { after: Duration },
    #[display("judge exited with {status} without a score line")]
    Exit { status: ExitStatus },
    #[display("judge printed no output")]
    NoOutput,
    #[display("malformed score line `{line}`")]
    MalformedOutput { line: String },
    #[display("{message}")]
    Other { message: String },
}

/// Parses a judge score line.
///
/// Accepts two or three integers separated by spaces and/or commas. A
/// dictionary-style line such as `{0: 12, 1: 7}` or `{0=12, 1=7}` is accepted
/// too: braces and `key:` / `key=` prefixes are ignored.
pub fn parse_score_line(line: &str) -> Result<MatchOutcome, MatchError> {
    let malformed = || MatchError::MalformedOutput {
        line: line.to_owned(),
    };
    let values = line
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split([' ', ',', '\t'])
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let value = token.rsplit([':', '=']).next().unwrap_or(token);
            (!value.is_empty()).then_some(value)
        })
        .map(|value| value.parse::<i64>().map_err(|_| malformed()))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        &[first, second] => Ok(MatchOutcome::new(first, second)),
        &[first, second, rounds] => Ok(MatchOutcome {
            scores: [first, second],
            rounds: Some(rounds),
        }),
        _ => Err(malformed()),
    }
}

/// Plays one match between two chromosomes.
pub trait MatchRunner<G>: Sync
where
    G: Gene,
{
    fn run_match(&self, first: &Chromosome<G>, second: &Chromosome<G>)
    -> Result<MatchOutcome, MatchError>;
}

impl<G, F> MatchRunner<G> for F
where
    G: Gene,
    F: Fn(&Chromosome<G>, &Chromosome<G>) -> Result<MatchOutcome, MatchError> + Sync,
{
    fn run_match(
        &self,
        first: &Chromosome<G>,
        second: &Chromosome<G>,
    ) -> Result<MatchOutcome, MatchError> {
        self(first, second)
    }
}

/// Folds match outcomes into scores.
pub trait ScoreAggregator: Sync {
    /// Score before the first match of the generation.
    fn initial_score(&self, carried: Option<f64>) -> f64;

    /// Updates both players' scores from one outcome.
    fn record(&self, first: &mut f64, second: &mut f64, outcome: &MatchOutcome);
}

/// +1 for a win, -1 for a loss, 0 for a draw; everyone starts at 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointsAggregator;

impl ScoreAggregator for PointsAggregator {
    fn initial_score(&self, _carried: Option<f64>) -> f64 {
        0.0
    }

    fn record(&self, first: &mut f64, second: &mut f64, outcome: &MatchOutcome) {
        let [a, b] = outcome.scores;
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => {
                *first += 1.0;
                *second -= 1.0;
            }
            std::cmp::Ordering::Less => {
                *first -= 1.0;
                *second += 1.0;
            }
            std::cmp::Ordering::Equal => {}
        }
    }
}

/// Elo ratings carried across generations.
///
/// A match result is not only win or loss: the winner gets `0.8` plus a
/// `0.2` share proportional to its score, so a close match moves ratings
/// less than a rout.
#[derive(Debug, Clone, Copy)]
pub struct EloAggregator {
    pub k: f64,
    pub initial_rating: f64,
}

impl Default for EloAggregator {
    fn default() -> Self {
        Self {
            k: 32.0,
            initial_rating: 1200.0,
        }
    }
}

impl EloAggregator {
    /// Result in `[0, 1]` for the first player.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn match_result(outcome: &MatchOutcome) -> f64 {
        let [a, b] = outcome.scores;
        if a == b {
            return 0.5;
        }
        let win = if a > b { 0.8 } else { 0.0 };
        let total = a + b;
        let share = if total == 0 {
            0.0
        } else {
            (a as f64 / total as f64).clamp(0.0, 1.0)
        };
        win + 0.2 * share
    }

    /// Expected score of a player rated `rating` against `opponent`.
    #[must_use]
    pub fn expected(rating: f64, opponent: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf((opponent - rating) / 400.0))
    }
}

impl ScoreAggregator for EloAggregator {
    fn initial_score(&self, carried: Option<f64>) -> f64 {
        carried.unwrap_or(self.initial_rating)
    }

    fn record(&self, first: &mut f64, second: &mut f64, outcome: &MatchOutcome) {
        let result = Self::match_result(outcome);
        let expected_first = Self::expected(*first, *second);
        let expected_second = Self::expected(*second, *first);
        *first += self.k * (result - expected_first);
        *second += self.k * ((1.0 - result) - expected_second);
    }
}

/// Fitness from pairwise matches.
#[derive(Debug, Clone)]
pub struct TournamentFitness<M, A> {
    runner: M,
    aggregator: A,
    config: TournamentConfig,
}

impl<M, A> TournamentFitness<M, A> {
    #[must_use]
    pub fn new(runner: M, aggregator: A, config: TournamentConfig) -> Self {
        Self {
            runner,
            aggregator,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }
}

/// Random disjoint pairs for `rounds` rounds over `size` players.
pub fn schedule_pairs<R>(rng: &mut R, size: usize, rounds: usize) -> Vec<(usize, usize)>
where
    R: Rng + ?Sized,
{
    if size < 2 {
        return vec![];
    }
    let mut pairs = Vec::with_capacity(rounds * size.div_ceil(2));
    for _ in 0..rounds {
        let mut order = (0..size).collect::<Vec<_>>();
        order.shuffle(rng);
        if size % 2 == 1 {
            // the last player meets someone already paired this round
            let partner = order[rng.random_range(0..size - 1)];
            order.push(partner);
        }
        pairs.extend(order.chunks_exact(2).map(|pair| (pair[0], pair[1])));
    }
    pairs
}

impl<M, A> TournamentFitness<M, A>
where
    A: ScoreAggregator,
{
    fn play<G>(&self, first: &Chromosome<G>, second: &Chromosome<G>) -> Option<MatchOutcome>
    where
        G: Gene,
        M: MatchRunner<G>,
    {
        let attempts = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.runner.run_match(first, second) {
                Ok(outcome) => {
                    tracing::debug!(
                        first = %first.id(),
                        second = %second.id(),
                        scores = ?outcome.scores,
                        "match finished"
                    );
                    return Some(outcome);
                }
                Err(error) => tracing::warn!(
                    first = %first.id(),
                    second = %second.id(),
                    attempt,
                    attempts,
                    %error,
                    "match failed"
                ),
            }
        }
        None
    }

    /// Runs every match, returning outcomes in `pairs` order.
    fn play_all<G>(
        &self,
        chromosomes: &[Chromosome<G>],
        pairs: &[(usize, usize)],
    ) -> Vec<Option<MatchOutcome>>
    where
        G: Gene,
        M: MatchRunner<G>,
    {
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();
        let workers = self.config.workers.clamp(1, pairs.len().max(1));
        thread::scope(|s| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                s.spawn(move || {
                    loop {
                        let job = next.fetch_add(1, Ordering::Relaxed);
                        let Some(&(a, b)) = pairs.get(job) else {
                            break;
                        };
                        let outcome = self.play(&chromosomes[a], &chromosomes[b]);
                        if tx.send((job, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        let mut outcomes = vec![None; pairs.len()];
        for (job, outcome) in rx {
            outcomes[job] = outcome;
        }
        outcomes
    }
}

impl<G, M, A> FitnessEvaluator<G> for TournamentFitness<M, A>
where
    G: Gene,
    M: MatchRunner<G>,
    A: ScoreAggregator,
{
    fn evaluate<R>(&self, population: &mut Population<G>, rng: &mut R) -> Vec<f64>
    where
        R: Rng + ?Sized,
    {
        let mut scores = population
            .chromosomes()
            .iter()
            .map(|c| self.aggregator.initial_score(c.last_score()))
            .collect::<Vec<_>>();

        let pairs = schedule_pairs(rng, population.len(), self.config.rounds_per_generation);
        let outcomes = self.play_all(population.chromosomes(), &pairs);

        let mut failed = 0;
        for (&(a, b), outcome) in pairs.iter().zip(&outcomes) {
            let Some(outcome) = outcome else {
                failed += 1;
                continue;
            };
            let (mut first, mut second) = (scores[a], scores[b]);
            self.aggregator.record(&mut first, &mut second, outcome);
            scores[a] = first;
            scores[b] = second;
        }
        if failed > 0 {
            tracing::warn!(failed, matches = pairs.len(), "some matches counted as neutral");
        }

        for (chromosome, &score) in population.chromosomes_mut().iter_mut().zip(&scores) {
            chromosome.set_last_score(score);
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::{chromosome::ChromosomeId, gene::WeightGene};

    fn population(size: usize) -> Population<WeightGene> {
        let chromosomes = (0..size)
            .map(|i| {
                #[expect(clippy::cast_precision_loss)]
                let value = i as f64;
                Chromosome::with_id(
                    format!("{i:x}").parse::<ChromosomeId>().unwrap(),
                    0,
                    vec![WeightGene::new(value)],
                )
            })
            .collect();
        Population::new(0, chromosomes)
    }

    fn config(rounds: usize, workers: usize) -> TournamentConfig {
        TournamentConfig {
            rounds_per_generation: rounds,
            workers,
            max_attempts: 3,
        }
    }

    #[expect(clippy::cast_possible_truncation)]
    fn higher_gene_wins(
        first: &Chromosome<WeightGene>,
        second: &Chromosome<WeightGene>,
    ) -> Result<MatchOutcome, MatchError> {
        Ok(MatchOutcome::new(
            first.genes()[0].value() as i64,
            second.genes()[0].value() as i64,
        ))
    }

    #[test]
    fn test_parse_score_line() {
        assert_eq!(parse_score_line("12 7").unwrap(), MatchOutcome::new(12, 7));
        assert_eq!(parse_score_line("3,-1").unwrap(), MatchOutcome::new(3, -1));
        assert_eq!(
            parse_score_line(" 5, 9, 200 ").unwrap(),
            MatchOutcome {
                scores: [5, 9],
                rounds: Some(200)
            }
        );
        assert_eq!(
            parse_score_line("{0: 12, 1: 7}").unwrap(),
            MatchOutcome::new(12, 7)
        );
        assert_eq!(
            parse_score_line("{0=4, 1=4}").unwrap(),
            MatchOutcome::new(4, 4)
        );
        for bad in ["", "12", "1 2 3 4", "win lose", "{0: x, 1: 2}"] {
            assert!(
                matches!(parse_score_line(bad), Err(MatchError::MalformedOutput { .. })),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_schedule_pairs() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let pairs = schedule_pairs(&mut rng, 6, 4);
        assert_eq!(pairs.len(), 12);
        for round in pairs.chunks(3) {
            let mut seen = round.iter().flat_map(|&(a, b)| [a, b]).collect::<Vec<_>>();
            seen.sort_unstable();
            assert_eq!(seen, [0, 1, 2, 3, 4, 5]);
        }

        // odd sizes pad the last pair with someone else
        let pairs = schedule_pairs(&mut rng, 5, 10);
        assert_eq!(pairs.len(), 30);
        assert!(pairs.iter().all(|&(a, b)| a != b));

        assert!(schedule_pairs(&mut rng, 1, 10).is_empty());
    }

    #[test]
    fn test_points() {
        let aggregator = PointsAggregator;
        let (mut a, mut b) = (0.0, 0.0);
        aggregator.record(&mut a, &mut b, &MatchOutcome::new(3, 1));
        aggregator.record(&mut a, &mut b, &MatchOutcome::new(3, 1));
        aggregator.record(&mut a, &mut b, &MatchOutcome::new(2, 2));
        assert!((a - 2.0).abs() < f64::EPSILON);
        assert!((b + 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_elo() {
        assert!((EloAggregator::match_result(&MatchOutcome::new(5, 5)) - 0.5).abs() < 1e-12);
        assert!((EloAggregator::match_result(&MatchOutcome::new(30, 10)) - 0.95).abs() < 1e-12);
        assert!((EloAggregator::match_result(&MatchOutcome::new(10, 30)) - 0.05).abs() < 1e-12);
        assert!((EloAggregator::match_result(&MatchOutcome::new(0, -0)) - 0.5).abs() < 1e-12);
        assert!((EloAggregator::match_result(&MatchOutcome::new(1, -1)) - 0.8).abs() < 1e-12);

        // negative scores never push the result outside [0, 1]
        assert!((EloAggregator::match_result(&MatchOutcome::new(5, -1)) - 1.0).abs() < 1e-12);
        assert!(EloAggregator::match_result(&MatchOutcome::new(-1, 5)).abs() < 1e-12);
        let (mut a, mut b) = (1200.0, 1200.0);
        EloAggregator::default().record(&mut a, &mut b, &MatchOutcome::new(5, -1));
        assert!(a <= 1216.0 + 1e-9);
        assert!(b >= 1184.0 - 1e-9);

        let elo = EloAggregator::default();
        assert!((elo.initial_score(None) - 1200.0).abs() < f64::EPSILON);
        assert!((elo.initial_score(Some(1337.0)) - 1337.0).abs() < f64::EPSILON);

        let (mut a, mut b) = (1200.0, 1200.0);
        elo.record(&mut a, &mut b, &MatchOutcome::new(1, 0));
        // result 1.0 against an equal opponent
        assert!((a - 1216.0).abs() < 1e-9);
        assert!((b - 1184.0).abs() < 1e-9);
    }

    #[test]
    fn test_evaluate_points() {
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let mut population = population(6);
        let fitness = TournamentFitness::new(higher_gene_wins, PointsAggregator, config(20, 4));
        let scores = fitness.evaluate(&mut population, &mut rng);

        assert_eq!(scores.len(), 6);
        // zero-sum
        assert!(scores.iter().sum::<f64>().abs() < f64::EPSILON);
        // the strongest never loses, the weakest never wins
        assert!((scores[5] - 20.0).abs() < f64::EPSILON);
        assert!((scores[0] + 20.0).abs() < f64::EPSILON);
        assert_eq!(population.chromosomes()[5].last_score(), Some(scores[5]));
    }

    #[test]
    fn test_seeded_runs_agree_across_worker_counts() {
        let run = |workers| {
            let mut rng = Pcg64Mcg::seed_from_u64(99);
            let mut population = population(9);
            let fitness = TournamentFitness::new(
                higher_gene_wins,
                EloAggregator::default(),
                config(5, workers),
            );
            fitness.evaluate(&mut population, &mut rng)
        };
        assert_eq!(run(1), run(8));
    }

    #[test]
    fn test_failed_match_is_neutral() {
        let calls = AtomicUsize::new(0);
        let failing = "3".parse::<ChromosomeId>().unwrap();
        let runner = |first: &Chromosome<WeightGene>, second: &Chromosome<WeightGene>| {
            if first.id() == failing || second.id() == failing {
                calls.fetch_add(1, Ordering::Relaxed);
                return Err(MatchError::Other {
                    message: "judge crashed".to_owned(),
                });
            }
            higher_gene_wins(first, second)
        };

        let mut rng = Pcg64Mcg::seed_from_u64(5);
        let mut population = population(4);
        let fitness = TournamentFitness::new(runner, PointsAggregator, config(1, 2));
        let scores = fitness.evaluate(&mut population, &mut rng);

        // chromosome 3 played one match per round and every attempt failed
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert!(scores[3].abs() < f64::EPSILON);
        assert_eq!(scores.len(), 4);
    }

    #[test]
    fn test_retry_recovers() {
        let calls = AtomicUsize::new(0);
        let runner = |first: &Chromosome<WeightGene>, second: &Chromosome<WeightGene>| {
            if calls.fetch_add(1, Ordering::Relaxed) < 2 {
                return Err(MatchError::NoOutput);
            }
            higher_gene_wins(first, second)
        };
        let mut rng = Pcg64Mcg::seed_from_u64(5);
        let mut population = population(2);
        let fitness = TournamentFitness::new(runner, PointsAggregator, config(1, 1));
        let scores = fitness.evaluate(&mut population, &mut rng);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert!((scores[1] - 1.0).abs() < f64::EPSILON);
    }
}
