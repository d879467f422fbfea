use serde::{Deserialize, Serialize};

use crate::schedule::RatioSchedule;

/// Parameters of a genetic run.
///
/// Every field has a default, so a JSON config only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Genes per chromosome.
    pub chromosome_size: usize,
    pub population_size: usize,
    /// Number of generations evaluated before the run stops.
    pub generations_max: u32,
    /// Fraction of the ranked population carried over unchanged.
    pub elite_ratio: f64,
    /// Factor applied to an elite's carried score each time it is carried over.
    pub previous_score_ratio: f64,
    /// Fraction of genes touched when a chromosome mutates.
    pub gene_mutate_ratio: f64,
    /// Probability that a child mutates.
    pub chromosome_mutate_ratio: RatioSchedule,
    /// Probability that a parent pair is blended rather than cloned.
    pub crossover_ratio: RatioSchedule,
    /// Seed for reproducible runs; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            chromosome_size: 96,
            population_size: 50,
            generations_max: 10_000,
            elite_ratio: 0.2,
            previous_score_ratio: 1.0,
            gene_mutate_ratio: 0.1,
            chromosome_mutate_ratio: RatioSchedule::Linear {
                start: 0.0,
                end: 1.0,
            },
            crossover_ratio: RatioSchedule::Linear {
                start: 1.0,
                end: 0.0,
            },
            seed: None,
        }
    }
}

impl GeneticConfig {
    /// Checks the configuration.
    ///
    /// # Panics
    ///
    /// Panics on sizes of zero or ratios outside `[0, 1]`.
    pub fn validate(&self) {
        assert!(self.chromosome_size > 0, "chromosome_size must be positive");
        assert!(
            self.population_size >= 2,
            "population_size must be at least 2"
        );
        assert!(self.generations_max > 0, "generations_max must be positive");
        for (name, ratio) in [
            ("elite_ratio", self.elite_ratio),
            ("gene_mutate_ratio", self.gene_mutate_ratio),
        ] {
            assert!((0.0..=1.0).contains(&ratio), "{name} must be in [0, 1]");
        }
        assert!(
            self.previous_score_ratio.is_finite() && self.previous_score_ratio >= 0.0,
            "previous_score_ratio must be non-negative"
        );
        assert!(
            self.chromosome_mutate_ratio.is_valid(),
            "chromosome_mutate_ratio must stay in [0, 1]"
        );
        assert!(
            self.crossover_ratio.is_valid(),
            "crossover_ratio must stay in [0, 1]"
        );
    }

    /// Number of elites, `ceil(population_size * elite_ratio)`.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn elite_size(&self) -> usize {
        ((self.population_size as f64 * self.elite_ratio).ceil() as usize).min(self.population_size)
    }

    /// Fraction of the run completed at `generation`.
    #[must_use]
    pub fn progress(&self, generation: u32) -> f64 {
        f64::from(generation) / f64::from(self.generations_max)
    }
}

/// Parameters of tournament fitness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    /// Random pairings per generation; every chromosome plays once per round.
    pub rounds_per_generation: usize,
    /// Matches run at the same time.
    pub workers: usize,
    /// Attempts per match before it counts as neutral.
    pub max_attempts: usize,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            rounds_per_generation: 50,
            workers: default_workers(),
            max_attempts: 3,
        }
    }
}

/// Half the logical CPUs, at least one.
#[must_use]
pub fn default_workers() -> usize {
    (num_cpus::get() / 2).max(1)
}
