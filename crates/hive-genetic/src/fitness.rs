use std::thread;

use rand::Rng;

use crate::{chromosome::Chromosome, config::default_workers, gene::Gene, population::Population};

/// Scores a whole population.
///
/// Implementations return one score per chromosome, in population order.
/// They may also update each chromosome's carried score.
pub trait FitnessEvaluator<G>
where
    G: Gene,
{
    fn evaluate<R>(&self, population: &mut Population<G>, rng: &mut R) -> Vec<f64>
    where
        R: Rng + ?Sized;
}

/// Fitness from a pure per-chromosome scoring function.
///
/// The population is split into one chunk per worker and chunks are scored on
/// scoped threads.
#[derive(Debug, Clone)]
pub struct AbsoluteFitness<F> {
    score: F,
    workers: usize,
}

impl<F> AbsoluteFitness<F> {
    #[must_use]
    pub fn new(score: F) -> Self {
        Self {
            score,
            workers: default_workers(),
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

impl<G, F> FitnessEvaluator<G> for AbsoluteFitness<F>
where
    G: Gene,
    F: Fn(&Chromosome<G>) -> f64 + Sync,
{
    fn evaluate<R>(&self, population: &mut Population<G>, _rng: &mut R) -> Vec<f64>
    where
        R: Rng + ?Sized,
    {
        let chromosomes = population.chromosomes();
        let mut scores = vec![0.0; chromosomes.len()];
        if chromosomes.is_empty() {
            return scores;
        }
        let chunk = chromosomes.len().div_ceil(self.workers);
        thread::scope(|s| {
            for (chromosomes, scores) in chromosomes.chunks(chunk).zip(scores.chunks_mut(chunk)) {
                let score = &self.score;
                s.spawn(move || {
                    for (chromosome, slot) in chromosomes.iter().zip(scores) {
                        *slot = score(chromosome);
                    }
                });
            }
        });
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
    use crate::gene::WeightGene;

    fn sum(chromosome: &Chromosome<WeightGene>) -> f64 {
        chromosome.genes().iter().copied().map(WeightGene::value).sum()
    }

    #[test]
    fn test_scores_in_population_order() {
        let mut rng = Pcg64Mcg::seed_from_u64(8);
        let mut population = Population::<WeightGene>::random(&mut rng, 7, 6);
        let expected = population.chromosomes().iter().map(sum).collect::<Vec<_>>();

        for workers in [1, 3, 16] {
            let fitness = AbsoluteFitness::new(sum).with_workers(workers);
            let scores = fitness.evaluate(&mut population, &mut rng);
            assert_eq!(scores, expected);
        }
        assert_eq!(
            population.chromosomes()[2].last_score(),
            Some(expected[2])
        );
    }
}
