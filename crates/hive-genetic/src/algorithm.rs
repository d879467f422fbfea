//! The generation loop.
//!
//! ```text
//! initialize ──> evaluate ──> save best ──> reproduce ─┐
//!                   ^                                  │
//!                   └──────────────────────────────────┘
//! ```
//!
//! The loop runs exactly `generations_max` evaluations; there is no early
//! stopping.

use rand::{
    Rng, SeedableRng,
    distr::{Distribution as _, weighted::WeightedIndex},
};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    chromosome::{Chromosome, ChromosomeId},
    config::GeneticConfig,
    fitness::FitnessEvaluator,
    gene::Gene,
    population::Population,
    store::{ChromosomeStore, StoreError},
};

/// Summary of one evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u32,
    pub best_id: ChromosomeId,
    pub best_score: f64,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl GenerationReport {
    /// Builds the report from a ranked population and its scores.
    ///
    /// # Panics
    ///
    /// Panics if the population is empty.
    #[must_use]
    pub fn from_ranked<G>(population: &Population<G>, scores: &[f64]) -> Self
    where
        G: Gene,
    {
        let best = &population.chromosomes()[0];
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        #[expect(clippy::cast_precision_loss)]
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        Self {
            generation: population.generation(),
            best_id: best.id(),
            best_score: scores[0],
            min,
            mean,
            max,
        }
    }
}

/// Turns scores into selection probabilities.
///
/// Scores are shifted so the minimum is 0 and divided by their sum. When every
/// shifted score is 0 (all scores equal) the distribution is uniform.
#[must_use]
pub fn normalize(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return vec![];
    }
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let shifted = scores.iter().map(|s| s - min).collect::<Vec<_>>();
    let total = shifted.iter().sum::<f64>();
    if total > 0.0 && total.is_finite() {
        shifted.into_iter().map(|s| s / total).collect()
    } else {
        #[expect(clippy::cast_precision_loss)]
        let uniform = 1.0 / scores.len() as f64;
        vec![uniform; scores.len()]
    }
}

/// Genetic optimizer over chromosomes of `G`.
///
/// Fitness comes from `E` and the best chromosome of every generation goes to
/// `S`. All randomness flows from one seeded generator, so a fixed
/// [`GeneticConfig::seed`] with a deterministic evaluator replays the same run.
#[derive(Debug)]
pub struct GeneticAlgorithm<G, E, S> {
    config: GeneticConfig,
    evaluator: E,
    store: S,
    rng: Pcg64Mcg,
    population: Population<G>,
    scores: Vec<f64>,
}

impl<G, E, S> GeneticAlgorithm<G, E, S>
where
    G: Gene,
    E: FitnessEvaluator<G>,
    S: ChromosomeStore<G>,
{
    /// # Panics
    ///
    /// Panics if `config` is invalid; see [`GeneticConfig::validate`].
    pub fn new(config: GeneticConfig, evaluator: E, store: S) -> Self {
        config.validate();
        let seed = config.seed.unwrap_or_else(rand::random);
        tracing::info!(seed, "genetic algorithm seeded");
        Self {
            config,
            evaluator,
            store,
            rng: Pcg64Mcg::seed_from_u64(seed),
            population: Population::new(0, vec![]),
            scores: vec![],
        }
    }

    #[must_use]
    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    #[must_use]
    pub fn population(&self) -> &Population<G> {
        &self.population
    }

    /// Scores of the last evaluation, aligned with [`Self::population`].
    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Builds generation 0 from the store's seeds, padded with random chromosomes.
    ///
    /// Seeds beyond `population_size` are dropped.
    ///
    /// # Panics
    ///
    /// Panics if a seed does not have `chromosome_size` genes.
    #[instrument(skip_all)]
    pub fn initialize(&mut self) -> Result<(), StoreError> {
        let size = self.config.population_size;
        let chromosome_size = self.config.chromosome_size;

        let mut chromosomes = self.store.load_seeds()?;
        chromosomes.truncate(size);
        for seed in &chromosomes {
            assert_eq!(
                seed.len(),
                chromosome_size,
                "seed chromosome {} has the wrong length",
                seed.id()
            );
        }
        let seeded = chromosomes.len();
        while chromosomes.len() < size {
            chromosomes.push(Chromosome::random(&mut self.rng, 0, chromosome_size));
        }
        tracing::info!(seeded, random = size - seeded, "initial population built");

        self.population = Population::new(0, chromosomes);
        self.scores.clear();
        Ok(())
    }

    /// Scores the current population and ranks it best first.
    ///
    /// # Panics
    ///
    /// Panics if the evaluator returns the wrong number of scores.
    #[instrument(skip_all, fields(generation = self.population.generation()))]
    pub fn evaluate(&mut self) -> GenerationReport {
        let mut scores = self.evaluator.evaluate(&mut self.population, &mut self.rng);
        assert_eq!(
            scores.len(),
            self.population.len(),
            "evaluator must return one score per chromosome"
        );
        self.population.sort_by_scores(&mut scores);
        self.scores = scores;

        let report = GenerationReport::from_ranked(&self.population, &self.scores);
        tracing::info!(
            best = %report.best_id,
            best_score = report.best_score,
            min = report.min,
            mean = report.mean,
            max = report.max,
            "generation evaluated"
        );
        report
    }

    /// Replaces the ranked population with the next generation.
    ///
    /// Elites are carried over with their identity. The rest are children of
    /// parents drawn by [`normalize`]d score, with replacement.
    #[instrument(skip_all, fields(generation = self.population.generation()))]
    pub fn reproduce(&mut self) {
        let size = self.config.population_size;
        let generation = self.population.generation();
        let next_generation = generation + 1;
        let progress = self.config.progress(next_generation);
        let crossover_ratio = self.config.crossover_ratio.at(progress);
        let mutate_ratio = self.config.chromosome_mutate_ratio.at(progress);
        let score_ratio = self.config.previous_score_ratio;

        let elite_size = self.config.elite_size().min(self.population.len());
        let parents = self.select_parents((size - elite_size).next_multiple_of(2));

        let ranked = self.population.chromosomes();
        let mut next = ranked[..elite_size]
            .iter()
            .map(|c| c.carry_over(score_ratio))
            .collect::<Vec<_>>();
        let mut crossed = 0;
        let mut mutated = 0;
        for pair in parents.chunks_exact(2) {
            let (first, second) = (&ranked[pair[0]], &ranked[pair[1]]);
            let (mut child_1, mut child_2) = if self.rng.random_bool(crossover_ratio) {
                crossed += 1;
                first.crossover(second, next_generation, &mut self.rng)
            } else {
                (first.carry_over(score_ratio), second.carry_over(score_ratio))
            };
            for child in [&mut child_1, &mut child_2] {
                if self.rng.random_bool(mutate_ratio) {
                    mutated += 1;
                    child.mutate(self.config.gene_mutate_ratio, &mut self.rng);
                    child.renew(&mut self.rng, next_generation);
                }
            }
            next.push(child_1);
            next.push(child_2);
        }
        next.truncate(size);

        tracing::debug!(
            elites = elite_size,
            crossed,
            mutated,
            crossover_ratio,
            mutate_ratio,
            "next generation bred"
        );
        self.population = Population::new(next_generation, next);
        self.scores.clear();
    }

    fn select_parents(&mut self, count: usize) -> Vec<usize> {
        let len = self.population.len();
        if len == 0 {
            return vec![];
        }
        match WeightedIndex::new(normalize(&self.scores)) {
            Ok(distribution) => (0..count)
                .map(|_| distribution.sample(&mut self.rng))
                .collect(),
            Err(error) => {
                tracing::warn!(%error, "falling back to uniform parent selection");
                (0..count).map(|_| self.rng.random_range(0..len)).collect()
            }
        }
    }

    /// Runs the whole optimization and returns the best chromosome of the last
    /// generation.
    ///
    /// `on_generation` sees every report together with the ranked population.
    pub fn run<F>(&mut self, mut on_generation: F) -> Result<Chromosome<G>, StoreError>
    where
        F: FnMut(&GenerationReport, &Population<G>),
    {
        self.initialize()?;
        let generations = self.config.generations_max;
        for generation in 0..generations {
            let report = self.evaluate();
            let best = &self.population.chromosomes()[0];
            self.store.save_best(report.generation, best)?;
            on_generation(&report, &self.population);
            if generation + 1 < generations {
                self.reproduce();
            }
        }
        Ok(self.population.chromosomes()[0].clone())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        fitness::AbsoluteFitness,
        gene::WeightGene,
        schedule::RatioSchedule,
        store::{DirectoryStore, MemoryStore},
    };

    fn sum(chromosome: &Chromosome<WeightGene>) -> f64 {
        chromosome.genes().iter().copied().map(WeightGene::value).sum()
    }

    fn config(population_size: usize, elite_ratio: f64) -> GeneticConfig {
        GeneticConfig {
            chromosome_size: 6,
            population_size,
            generations_max: 8,
            elite_ratio,
            seed: Some(11),
            ..GeneticConfig::default()
        }
    }

    #[test]
    fn test_normalize() {
        let uniform = normalize(&[5.0, 5.0, 5.0]);
        assert_eq!(uniform.len(), 3);
        assert!(uniform.iter().all(|p| (p - 1.0 / 3.0).abs() < 1e-12));

        let weights = normalize(&[-1.0, 1.0, 3.0]);
        assert!(weights[0].abs() < 1e-12);
        assert!((weights[1] - 1.0 / 3.0).abs() < 1e-12);
        assert!((weights[2] - 2.0 / 3.0).abs() < 1e-12);

        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_population_size_is_kept() {
        for size in [2, 7, 10] {
            let fitness = AbsoluteFitness::new(sum).with_workers(2);
            let store = MemoryStore::<WeightGene>::default();
            let mut ga = GeneticAlgorithm::new(config(size, 0.2), fitness, store);
            let mut sizes = vec![];
            ga.run(|_, population| sizes.push(population.len())).unwrap();
            assert_eq!(sizes, vec![size; 8]);
            assert_eq!(ga.population().len(), size);
        }
    }

    #[test]
    fn test_elite_is_carried_unchanged() {
        let fitness = AbsoluteFitness::new(sum).with_workers(1);
        let store = MemoryStore::<WeightGene>::default();
        let mut ga = GeneticAlgorithm::new(config(10, 0.1), fitness, store);
        ga.initialize().unwrap();
        ga.evaluate();
        let best = ga.population().chromosomes()[0].clone();

        ga.reproduce();
        let carried = &ga.population().chromosomes()[0];
        assert_eq!(ga.population().generation(), 1);
        assert_eq!(carried.id(), best.id());
        assert_eq!(carried.genes(), best.genes());
        assert_eq!(carried.last_score(), best.last_score());
    }

    #[test]
    fn test_schedule_follows_the_bred_generation() {
        // both ratios fall to 0 once the bred generation is the last one
        let falling = RatioSchedule::Linear {
            start: 1.0,
            end: 0.0,
        };
        let config = GeneticConfig {
            generations_max: 1,
            chromosome_mutate_ratio: falling,
            crossover_ratio: falling,
            ..config(8, 0.25)
        };
        let mut ga = GeneticAlgorithm::new(
            config,
            AbsoluteFitness::new(sum),
            MemoryStore::<WeightGene>::default(),
        );
        ga.initialize().unwrap();
        ga.evaluate();
        let before = ga.population().chromosomes().to_vec();

        ga.reproduce();
        for child in ga.population().chromosomes() {
            let parent = before.iter().find(|p| p.id() == child.id()).unwrap();
            assert_eq!(child.genes(), parent.genes());
        }
    }

    #[test]
    fn test_best_never_regresses_with_elites() {
        let fitness = AbsoluteFitness::new(sum).with_workers(1);
        let store = MemoryStore::<WeightGene>::default();
        let mut ga = GeneticAlgorithm::new(config(12, 0.25), fitness, store);
        let mut best_scores = vec![];
        let best = ga
            .run(|report, _| best_scores.push(report.best_score))
            .unwrap();
        assert!(best_scores.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(ga.store().saved().len(), 8);
        assert_eq!(ga.store().saved().last().map(Chromosome::id), Some(best.id()));
    }

    #[test]
    fn test_one_checkpoint_per_generation() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneticConfig {
            generations_max: 5,
            seed: Some(1),
            ..config(6, 0.5)
        };
        // every chromosome scores the same, so the first elite stays on top
        let fitness = AbsoluteFitness::new(|_: &Chromosome<WeightGene>| 1.0);
        let store = DirectoryStore::new(dir.path(), 6);
        let mut ga = GeneticAlgorithm::new(config, fitness, store);

        let mut best_ids = vec![];
        ga.run(|report, _| best_ids.push(report.best_id)).unwrap();
        assert!(best_ids.windows(2).all(|w| w[0] == w[1]));

        let mut names = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        names.sort();
        let expected = (0..5)
            .map(|generation| format!("{generation:05}_{}.txt", best_ids[0]))
            .collect::<Vec<_>>();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_seeds_fill_initial_population() {
        let mut rng = Pcg64Mcg::seed_from_u64(4);
        let seeds = (0..3)
            .map(|_| Chromosome::<WeightGene>::random(&mut rng, 0, 6))
            .collect::<Vec<_>>();
        let fitness = AbsoluteFitness::new(sum);
        let store = MemoryStore::new(seeds.clone());
        let mut ga = GeneticAlgorithm::new(config(2, 0.5), fitness, store);
        ga.initialize().unwrap();
        let ids = ga
            .population()
            .chromosomes()
            .iter()
            .map(Chromosome::id)
            .collect::<Vec<_>>();
        assert_eq!(ids, [seeds[0].id(), seeds[1].id()]);

        let mut ga = GeneticAlgorithm::new(
            config(5, 0.5),
            AbsoluteFitness::new(sum),
            MemoryStore::new(seeds),
        );
        ga.initialize().unwrap();
        assert_eq!(ga.population().len(), 5);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let run = || {
            let fitness = AbsoluteFitness::new(sum).with_workers(3);
            let store = MemoryStore::<WeightGene>::default();
            let mut ga = GeneticAlgorithm::new(config(9, 0.2), fitness, store);
            ga.run(|_, _| {}).unwrap().genes().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    #[should_panic(expected = "wrong length")]
    fn test_seed_of_wrong_length() {
        let mut rng = Pcg64Mcg::seed_from_u64(4);
        let seed = Chromosome::<WeightGene>::random(&mut rng, 0, 3);
        let mut ga = GeneticAlgorithm::new(
            config(4, 0.5),
            AbsoluteFitness::new(sum),
            MemoryStore::new(vec![seed]),
        );
        let _ = ga.initialize();
    }
}
