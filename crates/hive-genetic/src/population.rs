use rand::Rng;

use crate::{chromosome::Chromosome, gene::Gene};

/// Chromosomes competing in one generation.
///
/// After [`Population::sort_by_scores`] the order is the ranking, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct Population<G> {
    generation: u32,
    chromosomes: Vec<Chromosome<G>>,
}

impl<G> Population<G>
where
    G: Gene,
{
    #[must_use]
    pub fn new(generation: u32, chromosomes: Vec<Chromosome<G>>) -> Self {
        Self {
            generation,
            chromosomes,
        }
    }

    /// `size` random chromosomes of `chromosome_size` genes at generation 0.
    pub fn random<R>(rng: &mut R, size: usize, chromosome_size: usize) -> Self
    where
        R: Rng + ?Sized,
    {
        let chromosomes = (0..size)
            .map(|_| Chromosome::random(rng, 0, chromosome_size))
            .collect();
        Self::new(0, chromosomes)
    }

    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn chromosomes(&self) -> &[Chromosome<G>] {
        &self.chromosomes
    }

    pub fn chromosomes_mut(&mut self) -> &mut [Chromosome<G>] {
        &mut self.chromosomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Reorders chromosomes and `scores` together, highest score first.
    ///
    /// # Panics
    ///
    /// Panics if `scores` does not have one entry per chromosome.
    pub fn sort_by_scores(&mut self, scores: &mut Vec<f64>) {
        assert_eq!(scores.len(), self.chromosomes.len(), "one score per chromosome");
        let mut ranked = self
            .chromosomes
            .drain(..)
            .zip(scores.drain(..))
            .collect::<Vec<_>>();
        ranked.sort_by(|(_, a), (_, b)| b.total_cmp(a));
        let (chromosomes, sorted): (Vec<_>, Vec<_>) = ranked.into_iter().unzip();
        self.chromosomes = chromosomes;
        *scores = sorted;
    }
}
